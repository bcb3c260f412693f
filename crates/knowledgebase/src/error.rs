#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read corpus {path}: {source}")]
    CorpusRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid corpus: {0}")]
    CorpusFormat(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] kb_common::error::CommonError),
}
