use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchArticlesParams {
    /// Free-text query. Words are matched as case-insensitive substrings.
    pub query: String,
    /// Match query words against article titles (default: true).
    pub search_in_title: Option<bool>,
    /// Match query words against article tags (default: true).
    pub search_in_tags: Option<bool>,
    /// Match query words against article content with markup removed (default: true).
    pub search_in_content: Option<bool>,
    /// Match the query against application names (default: true).
    pub search_in_app_name: Option<bool>,
    /// Only search inside this application.
    pub app_id: Option<u64>,
    /// Keep only results belonging to one of these applications.
    pub filter_app_ids: Option<Vec<u64>>,
    /// Keep only results carrying at least one of these tags.
    pub filter_tags: Option<Vec<String>>,
    /// Keep only results whose category name is one of these.
    pub filter_categories: Option<Vec<String>>,
    /// Maximum number of results to return (default: 20, max: 100).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SuggestParams {
    /// Partial query typed so far (at least 2 characters).
    pub partial_query: String,
    /// Maximum number of suggestions (default: 5).
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AppParams {
    /// Application identifier.
    pub app_id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetArticleParams {
    /// Application identifier.
    pub app_id: u64,
    /// Article identifier, unique within the application.
    pub article_id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectApplicationParams {
    /// Application to select; omit to clear the selection.
    pub app_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NavigateSectionParams {
    /// Section name such as "overview" or "getting-started".
    pub section: String,
    /// Optional article key inside the section.
    pub article_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectMenuItemParams {
    /// Menu item key, e.g. "overview" or "category-4-article-101".
    pub menu_item: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OpenArticleParams {
    /// Category owning the article, within the selected application.
    pub category_id: u64,
    /// Article identifier within the selected application.
    pub article_id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ToggleCategoryParams {
    /// Category to expand or collapse in the navigation tree.
    pub category_id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OpenSearchResultParams {
    /// Result kind as returned by search_articles: "app" or "article".
    pub kind: String,
    /// Result identifier (application id for "app", article id for "article").
    pub id: u64,
    /// Owning application identifier.
    pub app_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHit {
    /// "app" or "article".
    pub kind: String,
    pub id: u64,
    pub title: String,
    pub app_id: u64,
    pub app_name: String,
    pub category_id: Option<u64>,
    pub category_name: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Excerpt of the article content, matches wrapped in `<mark>`.
    pub snippet: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchArticlesResponse {
    pub results: Vec<SearchHit>,
    /// Number of results after filtering, before the limit is applied.
    pub total: usize,
    /// Sequence number of the query that produced these results.
    pub sequence: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationSummary {
    pub app_id: u64,
    pub name: String,
    pub article_count: usize,
    pub category_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryNode {
    pub id: u64,
    pub name: String,
    /// Articles owned directly by this category.
    pub article_count: usize,
    /// Whether the category is open in the navigation tree.
    pub expanded: bool,
    pub children: Vec<CategoryNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryTreeResponse {
    pub app_id: u64,
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArticleDetailResponse {
    pub id: u64,
    pub app_id: u64,
    pub category_id: u64,
    pub category_name: String,
    pub title: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
    pub read_time: Option<u32>,
    pub views: Option<u64>,
    pub tags: Vec<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArticlePane {
    pub title: String,
    pub author: String,
    pub last_updated: String,
    pub read_time: u32,
    pub views: u64,
    pub tags: Vec<String>,
    pub content: String,
    pub app_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NavigationSnapshot {
    pub selected_app_id: Option<u64>,
    pub active_menu_item: String,
    pub current_section: String,
    pub current_article: String,
    pub expanded_categories: Vec<u64>,
    pub is_favorite: bool,
    pub favorites: Vec<String>,
    /// True while a search is pending or running.
    pub is_searching: bool,
    pub article: ArticlePane,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TagListResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryEntry {
    pub id: u64,
    pub name: String,
    pub app_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryDirectoryResponse {
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloadCorpusResponse {
    pub updated: bool,
    /// sha256 of the corpus file, hex encoded.
    pub digest: String,
    pub application_count: usize,
    pub article_count: usize,
}
