/// Navigation and selection state.
///
/// Owns the transient cursor (selected application, active menu item,
/// current section and article), the set of expanded categories and the
/// favorites list. The corpus is passed in by reference and never stored.
///
/// Switching to a different application clears the expanded set.
/// Re-selecting the current application keeps it.
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::favorites::favorite_key;
use crate::model::{AppId, ArticleId, CategoryId, Corpus, SearchResult};

pub const OVERVIEW: &str = "overview";

/// Read time shown when an article has no estimate.
pub const DEFAULT_READ_TIME: u32 = 5;

static ARTICLE_MENU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^category-(\d+)-article-(\d+)$").expect("valid regex"));

/// A parsed menu item key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Overview,
    Article {
        category_id: CategoryId,
        article_id: ArticleId,
    },
    Section(String),
}

impl MenuItem {
    pub fn parse(key: &str) -> Self {
        if key == OVERVIEW {
            return MenuItem::Overview;
        }
        if let Some(caps) = ARTICLE_MENU_RE.captures(key) {
            if let (Ok(category_id), Ok(article_id)) = (caps[1].parse(), caps[2].parse()) {
                return MenuItem::Article {
                    category_id,
                    article_id,
                };
            }
        }
        MenuItem::Section(key.to_string())
    }

    pub fn key(&self) -> String {
        match self {
            MenuItem::Overview => OVERVIEW.to_string(),
            MenuItem::Article {
                category_id,
                article_id,
            } => format!("category-{category_id}-article-{article_id}"),
            MenuItem::Section(section) => section.clone(),
        }
    }
}

/// The article pane as shown to the reader, including placeholder states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleView {
    pub title: String,
    pub author: String,
    pub last_updated: String,
    pub read_time: u32,
    pub views: u64,
    pub tags: Vec<String>,
    pub content: String,
    pub app_id: Option<AppId>,
}

impl ArticleView {
    fn placeholder(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            author: "System".to_string(),
            last_updated: "N/A".to_string(),
            read_time: 0,
            views: 0,
            tags: Vec::new(),
            content: content.to_string(),
            app_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    selected_app: Option<AppId>,
    active_menu_item: String,
    current_section: String,
    current_article: String,
    expanded: BTreeSet<CategoryId>,
    favorites: Vec<String>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            selected_app: None,
            active_menu_item: OVERVIEW.to_string(),
            current_section: String::new(),
            current_article: String::new(),
            expanded: BTreeSet::new(),
            favorites: Vec::new(),
        }
    }
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_favorites(favorites: Vec<String>) -> Self {
        Self {
            favorites,
            ..Self::default()
        }
    }

    pub fn selected_app(&self) -> Option<AppId> {
        self.selected_app
    }

    pub fn active_menu_item(&self) -> &str {
        &self.active_menu_item
    }

    pub fn current_section(&self) -> &str {
        &self.current_section
    }

    pub fn current_article(&self) -> &str {
        &self.current_article
    }

    pub fn expanded(&self) -> &BTreeSet<CategoryId> {
        &self.expanded
    }

    pub fn is_expanded(&self, category_id: CategoryId) -> bool {
        self.expanded.contains(&category_id)
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    /// Select an application (or none) and return to its overview.
    pub fn select_app(&mut self, app_id: Option<AppId>) {
        if self.selected_app != app_id {
            self.expanded.clear();
            info!(?app_id, "application selected");
        }
        self.selected_app = app_id;
        self.active_menu_item = OVERVIEW.to_string();
        self.current_section.clear();
        self.current_article.clear();
    }

    pub fn navigate_to_section(&mut self, section: &str, article_key: Option<&str>) {
        self.current_section = section.to_string();
        self.current_article = article_key.unwrap_or_default().to_string();
        self.active_menu_item = match article_key {
            Some(key) => format!("{section}-{key}"),
            None => section.to_string(),
        };
    }

    pub fn select_menu_item(&mut self, menu_item: &str) {
        self.active_menu_item = menu_item.to_string();
    }

    /// Flip a category's expanded state. Returns `true` if it is now expanded.
    pub fn toggle_category(&mut self, category_id: CategoryId) -> bool {
        if self.expanded.remove(&category_id) {
            false
        } else {
            self.expanded.insert(category_id);
            true
        }
    }

    /// Open an article of the selected application and reveal its category.
    ///
    /// Returns `false` (leaving the cursor untouched) when no application is
    /// selected or the category or article is unknown.
    pub fn navigate_to_article(
        &mut self,
        corpus: &Corpus,
        category_id: CategoryId,
        article_id: ArticleId,
    ) -> bool {
        let Some(app_id) = self.selected_app else {
            return false;
        };
        let (Some(category), Some(article)) = (
            corpus.find_category(app_id, category_id),
            corpus.find_article(app_id, article_id),
        ) else {
            debug!(app_id, category_id, article_id, "article navigation target not found");
            return false;
        };

        self.current_section = category.name.clone();
        self.current_article = article.title.clone();
        self.active_menu_item = MenuItem::Article {
            category_id,
            article_id,
        }
        .key();
        corpus.auto_expand(app_id, category_id, &mut self.expanded);
        true
    }

    /// Follow a search hit: articles open in their application, applications
    /// show their overview.
    ///
    /// An article whose category or id no longer resolves returns `false`
    /// and leaves the cursor untouched.
    pub fn select_search_result(&mut self, corpus: &Corpus, result: &SearchResult) -> bool {
        match result {
            SearchResult::Article(hit) => {
                if corpus.find_category(hit.app_id, hit.category_id).is_none()
                    || corpus.find_article(hit.app_id, hit.id).is_none()
                {
                    debug!(app_id = hit.app_id, article_id = hit.id, "search result does not resolve");
                    return false;
                }
                self.select_app(Some(hit.app_id));
                self.navigate_to_article(corpus, hit.category_id, hit.id)
            }
            SearchResult::App(hit) => {
                self.select_app(Some(hit.id));
                self.navigate_to_section(OVERVIEW, None);
                true
            }
        }
    }

    /// Drop a selection that no longer exists in `corpus`.
    pub fn reconcile(&mut self, corpus: &Corpus) {
        if let Some(app_id) = self.selected_app {
            if corpus.application(app_id).is_none() {
                info!(app_id, "selected application no longer in corpus");
                self.select_app(None);
            }
        }
    }

    /// Favorites key of the current cursor, if an application is selected.
    pub fn current_favorite_key(&self) -> Option<String> {
        let app_id = self.selected_app?;
        if self.active_menu_item.is_empty() {
            return None;
        }
        Some(favorite_key(app_id, &self.active_menu_item))
    }

    pub fn is_favorite(&self) -> bool {
        self.current_favorite_key()
            .is_some_and(|key| self.favorites.contains(&key))
    }

    /// Add or remove the current cursor from favorites. Returns `Some(true)`
    /// when added, `Some(false)` when removed, `None` without a selection.
    pub fn toggle_favorite(&mut self) -> Option<bool> {
        let key = self.current_favorite_key()?;
        if let Some(index) = self.favorites.iter().position(|f| *f == key) {
            self.favorites.remove(index);
            Some(false)
        } else {
            self.favorites.push(key);
            Some(true)
        }
    }

    /// The article pane for the current cursor.
    pub fn current_article_view(&self, corpus: &Corpus) -> ArticleView {
        let Some(app_id) = self.selected_app else {
            return ArticleView::placeholder(
                "Select an Application",
                "<p>Please select an application and article to view content.</p>",
            );
        };
        let article_id = match MenuItem::parse(&self.active_menu_item) {
            MenuItem::Overview => {
                return ArticleView::placeholder(
                    "Select an Application",
                    "<p>Please select an application and article to view content.</p>",
                )
            }
            MenuItem::Section(_) => {
                return ArticleView::placeholder(
                    "No Content Available",
                    "<p>No content available for this selection.</p>",
                )
            }
            MenuItem::Article { article_id, .. } => article_id,
        };
        let Some(article) = corpus.find_article(app_id, article_id) else {
            return ArticleView::placeholder("Article Not Found", "<p>Article not found.</p>");
        };

        ArticleView {
            title: article.title.clone(),
            author: article.author.clone(),
            last_updated: article.updated_at.clone(),
            read_time: article.read_time.unwrap_or(DEFAULT_READ_TIME),
            views: article.views.unwrap_or(0),
            tags: article.tags.clone(),
            content: article
                .content
                .clone()
                .unwrap_or_else(|| "<p>No content available.</p>".to_string()),
            app_id: Some(app_id),
        }
    }
}
