pub mod error;
pub mod kv;
pub mod mcp_api;
pub mod redis;
