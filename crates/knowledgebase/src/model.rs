use serde::{Deserialize, Serialize};

pub type AppId = u64;
pub type CategoryId = u64;
pub type ArticleId = u64;

/// The read-only collection of applications, categories and articles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub applications: Vec<Application>,
}

/// An application with its category forest and flat article list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "app_id")]
    pub id: AppId,
    pub name: String,
    /// Top-level categories, each possibly nesting children.
    #[serde(rename = "category_list", default)]
    pub categories: Vec<Category>,
    #[serde(rename = "article_list", default)]
    pub articles: Vec<Article>,
}

/// A node of an application's category forest.
///
/// Ids are unique within an application. Depth is derived from position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    /// Owning category; a dangling id leaves the article reachable only by
    /// direct lookup or search.
    pub category_id: CategoryId,
    pub title: String,
    pub author: String,
    pub created_at: String,
    #[serde(default)]
    pub created_by: String,
    pub updated_at: String,
    #[serde(default)]
    pub updated_by: String,
    /// HTML content.
    pub content: Option<String>,
    /// Estimated read time in minutes.
    pub read_time: Option<u32>,
    pub views: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Corpus {
    pub fn new(applications: Vec<Application>) -> Self {
        Self { applications }
    }

    pub fn application(&self, app_id: AppId) -> Option<&Application> {
        self.applications.iter().find(|app| app.id == app_id)
    }

    pub fn article_count(&self) -> usize {
        self.applications.iter().map(|app| app.articles.len()).sum()
    }
}

/// Which fields a query is matched against, and an optional application scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub query: String,
    pub search_in_title: bool,
    pub search_in_tags: bool,
    pub search_in_app_name: bool,
    pub search_in_content: bool,
    pub app_id: Option<AppId>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            search_in_title: true,
            search_in_tags: true,
            search_in_app_name: true,
            search_in_content: true,
            app_id: None,
        }
    }
}

impl SearchOptions {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// An application whose name matched the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMatch {
    pub id: AppId,
    /// Application name.
    pub title: String,
    pub relevance_score: f64,
}

/// An article that scored above zero for the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMatch {
    pub id: ArticleId,
    pub title: String,
    pub app_id: AppId,
    pub app_name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub tags: Vec<String>,
    pub snippet: String,
    pub relevance_score: f64,
}

/// A single ranked search hit. Recomputed per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchResult {
    App(AppMatch),
    Article(ArticleMatch),
}

impl SearchResult {
    pub fn score(&self) -> f64 {
        match self {
            SearchResult::App(m) => m.relevance_score,
            SearchResult::Article(m) => m.relevance_score,
        }
    }

    pub fn app_id(&self) -> AppId {
        match self {
            SearchResult::App(m) => m.id,
            SearchResult::Article(m) => m.app_id,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            SearchResult::App(m) => m.id,
            SearchResult::Article(m) => m.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SearchResult::App(_) => "app",
            SearchResult::Article(_) => "article",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SearchResult::App(m) => &m.title,
            SearchResult::Article(m) => &m.title,
        }
    }

    /// Tags of an article hit; application hits carry none.
    pub fn tags(&self) -> Option<&[String]> {
        match self {
            SearchResult::App(_) => None,
            SearchResult::Article(m) => Some(&m.tags),
        }
    }

    /// Resolved category name of an article hit; application hits carry none.
    pub fn category_name(&self) -> Option<&str> {
        match self {
            SearchResult::App(_) => None,
            SearchResult::Article(m) => Some(&m.category_name),
        }
    }
}

/// Post-search filters. An empty list on an axis means no restriction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub app_ids: Vec<AppId>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.app_ids.is_empty() && self.tags.is_empty() && self.categories.is_empty()
    }
}

/// A category flattened out of its forest, with the owning application's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub app_name: String,
}
