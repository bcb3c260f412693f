/// MCP server exposing the knowledge base to a presentation layer.
///
/// Search tools:
/// - `search_articles`, `clear_search`, `suggest_queries`, `list_tags`, `list_all_categories`
///
/// Browsing tools:
/// - `list_applications`, `list_categories`, `get_article`
///
/// Navigation tools (operate on the shared selection cursor):
/// - `select_application`, `navigate_to_section`, `open_article`,
///   `select_menu_item`, `toggle_category`, `open_search_result`, `toggle_favorite`, `get_navigation`
///
/// Maintenance:
/// - `reload_corpus`
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::favorites::FavoritesStore;
use crate::loader::LoadedCorpus;
use crate::model::{AppId, Category, Corpus, SearchFilters, SearchOptions, SearchResult};
use crate::navigation::{ArticleView, NavigationState};
use crate::search::{self, DEFAULT_MAX_SUGGESTIONS};
use crate::session::SearchSession;
use crate::tree::{PreOrder, MAX_TREE_DEPTH};
use crate::update::ReloadService;
use kb_common::mcp_api::{
    AppParams, ApplicationListResponse, ApplicationSummary, ArticleDetailResponse, ArticlePane,
    CategoryDirectoryResponse, CategoryEntry, CategoryNode, CategoryTreeResponse,
    GetArticleParams, NavigateSectionParams, NavigationSnapshot, OpenArticleParams,
    OpenSearchResultParams, ReloadCorpusResponse, SearchArticlesParams, SearchArticlesResponse,
    SearchHit, SelectApplicationParams, SelectMenuItemParams, SuggestParams, SuggestionsResponse, TagListResponse,
    ToggleCategoryParams,
};
use kb_common::redis::RedisCache;

const DEFAULT_RESULT_LIMIT: u32 = 20;
const MAX_RESULT_LIMIT: u32 = 100;
const MAX_SUGGESTIONS: u32 = 20;

/// Shared state. Reads (search, browsing) take the read lock; navigation and
/// reloads take the write lock.
pub struct AppState {
    pub corpus: Corpus,
    pub digest: String,
    pub navigation: NavigationState,
    /// Filtered results of the latest delivered search.
    pub last_results: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct KnowledgebaseServer {
    state: Arc<RwLock<AppState>>,
    session: Arc<SearchSession>,
    favorites: Arc<FavoritesStore<RedisCache>>,
    reload_service: Arc<ReloadService>,
    tool_router: ToolRouter<KnowledgebaseServer>,
}

impl KnowledgebaseServer {
    pub fn new(
        loaded: LoadedCorpus,
        saved_favorites: Vec<String>,
        session: SearchSession,
        favorites: FavoritesStore<RedisCache>,
        reload_service: ReloadService,
    ) -> Self {
        let state = Arc::new(RwLock::new(AppState {
            corpus: loaded.corpus,
            digest: loaded.digest,
            navigation: NavigationState::with_favorites(saved_favorites),
            last_results: Vec::new(),
        }));

        Self {
            state,
            session: Arc::new(session),
            favorites: Arc::new(favorites),
            reload_service: Arc::new(reload_service),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl KnowledgebaseServer {
    #[tool(description = "Search knowledge-base articles and applications. Query words are matched in titles, tags, content and application names; results are ranked by relevance. Rapid repeated searches are debounced and only the newest one returns results.")]
    async fn search_articles(
        &self,
        Parameters(params): Parameters<SearchArticlesParams>,
    ) -> Result<Json<SearchArticlesResponse>, String> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }

        let options = SearchOptions {
            search_in_title: params.search_in_title.unwrap_or(true),
            search_in_tags: params.search_in_tags.unwrap_or(true),
            search_in_app_name: params.search_in_app_name.unwrap_or(true),
            search_in_content: params.search_in_content.unwrap_or(true),
            app_id: params.app_id,
            ..SearchOptions::with_query(query.clone())
        };
        let filters = SearchFilters {
            app_ids: params.filter_app_ids.unwrap_or_default(),
            tags: params.filter_tags.unwrap_or_default(),
            categories: params.filter_categories.unwrap_or_default(),
        };
        let limit = params
            .limit
            .unwrap_or(DEFAULT_RESULT_LIMIT)
            .clamp(1, MAX_RESULT_LIMIT) as usize;

        let delivered = {
            let state = self.state.read().await;
            self.session.search(&state.corpus, &options).await
        };
        let Some((ticket, results)) = delivered else {
            return Err("query superseded by a newer search".to_string());
        };

        let filtered = search::apply_filters(results, &filters);
        let total = filtered.len();
        let hits: Vec<SearchHit> = filtered.iter().take(limit).map(to_search_hit).collect();
        {
            let mut state = self.state.write().await;
            if !self.session.is_latest(ticket) {
                return Err("query superseded by a newer search".to_string());
            }
            state.last_results = filtered;
        }

        info!(query = %query, total, returned = hits.len(), "search delivered");
        Ok(Json(SearchArticlesResponse {
            results: hits,
            total,
            sequence: ticket.sequence(),
        }))
    }

    #[tool(description = "Clear the latest search: drops its results and supersedes any search still waiting out the debounce.")]
    async fn clear_search(&self) -> Result<Json<SearchArticlesResponse>, String> {
        let ticket = self.session.issue();
        self.session.finish(ticket);
        self.state.write().await.last_results.clear();
        Ok(Json(SearchArticlesResponse {
            results: Vec::new(),
            total: 0,
            sequence: ticket.sequence(),
        }))
    }

    #[tool(description = "Suggest completions for a partial query: application names first, then article titles, then tags.")]
    async fn suggest_queries(
        &self,
        Parameters(params): Parameters<SuggestParams>,
    ) -> Result<Json<SuggestionsResponse>, String> {
        let max = params
            .max
            .map(|m| m.min(MAX_SUGGESTIONS) as usize)
            .unwrap_or(DEFAULT_MAX_SUGGESTIONS);
        let state = self.state.read().await;
        let suggestions = search::suggestions(&state.corpus, &params.partial_query, max);
        Ok(Json(SuggestionsResponse { suggestions }))
    }

    #[tool(description = "List every tag used in the knowledge base, sorted.")]
    async fn list_tags(&self) -> Result<Json<TagListResponse>, String> {
        let state = self.state.read().await;
        Ok(Json(TagListResponse {
            tags: search::all_tags(&state.corpus),
        }))
    }

    #[tool(description = "List every category of every application, flattened and sorted by name. Useful for building category filters.")]
    async fn list_all_categories(&self) -> Result<Json<CategoryDirectoryResponse>, String> {
        let state = self.state.read().await;
        let categories = search::all_categories(&state.corpus)
            .into_iter()
            .map(|c| CategoryEntry {
                id: c.id,
                name: c.name,
                app_name: c.app_name,
            })
            .collect();
        Ok(Json(CategoryDirectoryResponse { categories }))
    }

    #[tool(description = "List applications in the knowledge base with their article and category counts.")]
    async fn list_applications(&self) -> Result<Json<ApplicationListResponse>, String> {
        let state = self.state.read().await;
        let applications = state
            .corpus
            .applications
            .iter()
            .map(|app| ApplicationSummary {
                app_id: app.id,
                name: app.name.clone(),
                article_count: state.corpus.count_articles_in_app(app.id),
                category_count: PreOrder::new(&app.categories).count(),
            })
            .collect();
        Ok(Json(ApplicationListResponse { applications }))
    }

    #[tool(description = "Get the navigation tree of an application. Categories without articles anywhere below them are omitted; each node reports its direct article count and whether it is expanded.")]
    async fn list_categories(
        &self,
        Parameters(params): Parameters<AppParams>,
    ) -> Result<Json<CategoryTreeResponse>, String> {
        let state = self.state.read().await;
        let app = state
            .corpus
            .application(params.app_id)
            .ok_or_else(|| format!("unknown application: {}", params.app_id))?;
        let categories = category_nodes(&state.corpus, app.id, &app.categories, &state.navigation, 0);
        Ok(Json(CategoryTreeResponse {
            app_id: app.id,
            categories,
        }))
    }

    #[tool(description = "Get the full content and metadata of an article by application and article ID.")]
    async fn get_article(
        &self,
        Parameters(params): Parameters<GetArticleParams>,
    ) -> Result<Json<ArticleDetailResponse>, String> {
        let state = self.state.read().await;
        let app = state
            .corpus
            .application(params.app_id)
            .ok_or_else(|| format!("unknown application: {}", params.app_id))?;
        let article = state
            .corpus
            .find_article(app.id, params.article_id)
            .ok_or_else(|| format!("article not found: {}", params.article_id))?;

        Ok(Json(ArticleDetailResponse {
            id: article.id,
            app_id: app.id,
            category_id: article.category_id,
            category_name: search::category_name(app, article.category_id),
            title: article.title.clone(),
            author: article.author.clone(),
            created_at: article.created_at.clone(),
            updated_at: article.updated_at.clone(),
            read_time: article.read_time,
            views: article.views,
            tags: article.tags.clone(),
            content: article.content.clone(),
        }))
    }

    #[tool(description = "Select an application (or clear the selection when app_id is omitted) and show its overview. Switching to another application collapses the navigation tree.")]
    async fn select_application(
        &self,
        Parameters(params): Parameters<SelectApplicationParams>,
    ) -> Result<Json<NavigationSnapshot>, String> {
        let mut state = self.state.write().await;
        if let Some(app_id) = params.app_id {
            if state.corpus.application(app_id).is_none() {
                return Err(format!("unknown application: {app_id}"));
            }
        }
        state.navigation.select_app(params.app_id);
        Ok(Json(self.snapshot(&state)))
    }

    #[tool(description = "Navigate to a named section of the selected application, optionally to an article key inside it.")]
    async fn navigate_to_section(
        &self,
        Parameters(params): Parameters<NavigateSectionParams>,
    ) -> Result<Json<NavigationSnapshot>, String> {
        let section = params.section.trim().to_string();
        if section.is_empty() {
            return Err("section must not be empty".to_string());
        }
        let mut state = self.state.write().await;
        state
            .navigation
            .navigate_to_section(&section, params.article_key.as_deref());
        Ok(Json(self.snapshot(&state)))
    }

    #[tool(description = "Activate a menu item of the selected application by its key: \"overview\", \"category-{categoryId}-article-{articleId}\" or a section key.")]
    async fn select_menu_item(
        &self,
        Parameters(params): Parameters<SelectMenuItemParams>,
    ) -> Result<Json<NavigationSnapshot>, String> {
        let menu_item = params.menu_item.trim();
        if menu_item.is_empty() {
            return Err("menu_item must not be empty".to_string());
        }
        let mut state = self.state.write().await;
        if state.navigation.selected_app().is_none() {
            return Err("no application selected".to_string());
        }
        state.navigation.select_menu_item(menu_item);
        Ok(Json(self.snapshot(&state)))
    }

    #[tool(description = "Open an article of the selected application. Its category and all parent categories are expanded.")]
    async fn open_article(
        &self,
        Parameters(params): Parameters<OpenArticleParams>,
    ) -> Result<Json<NavigationSnapshot>, String> {
        let mut state = self.state.write().await;
        if state.navigation.selected_app().is_none() {
            return Err("no application selected".to_string());
        }
        let AppState {
            corpus, navigation, ..
        } = &mut *state;
        if !navigation.navigate_to_article(corpus, params.category_id, params.article_id) {
            return Err(format!(
                "article {} not found in category {} of the selected application",
                params.article_id, params.category_id
            ));
        }
        Ok(Json(self.snapshot(&state)))
    }

    #[tool(description = "Expand or collapse a category in the navigation tree.")]
    async fn toggle_category(
        &self,
        Parameters(params): Parameters<ToggleCategoryParams>,
    ) -> Result<Json<NavigationSnapshot>, String> {
        let mut state = self.state.write().await;
        state.navigation.toggle_category(params.category_id);
        Ok(Json(self.snapshot(&state)))
    }

    #[tool(description = "Open one of the results returned by the latest search_articles call. Articles open inside their application; applications show their overview.")]
    async fn open_search_result(
        &self,
        Parameters(params): Parameters<OpenSearchResultParams>,
    ) -> Result<Json<NavigationSnapshot>, String> {
        let mut state = self.state.write().await;
        let AppState {
            corpus,
            navigation,
            last_results,
            ..
        } = &mut *state;
        let result = last_results
            .iter()
            .find(|r| r.kind() == params.kind && r.id() == params.id && r.app_id() == params.app_id)
            .ok_or_else(|| {
                format!(
                    "{} {} of application {} is not among the latest search results",
                    params.kind, params.id, params.app_id
                )
            })?;
        if !navigation.select_search_result(corpus, result) {
            return Err(format!("search result {} no longer resolves", params.id));
        }
        Ok(Json(self.snapshot(&state)))
    }

    #[tool(description = "Add the current page of the selected application to favorites, or remove it if already present.")]
    async fn toggle_favorite(&self) -> Result<Json<NavigationSnapshot>, String> {
        let (response, favorites) = {
            let mut state = self.state.write().await;
            let added = state
                .navigation
                .toggle_favorite()
                .ok_or_else(|| "no application selected".to_string())?;
            info!(added, "favorite toggled");
            (self.snapshot(&state), state.navigation.favorites().to_vec())
        };

        if !self.favorites.save(&favorites).await {
            warn!(key = self.favorites.key(), "favorites not persisted, kept for this session only");
        }
        Ok(Json(response))
    }

    #[tool(description = "Get the current navigation state: selection, expanded categories, favorites and the article pane.")]
    async fn get_navigation(&self) -> Result<Json<NavigationSnapshot>, String> {
        let state = self.state.read().await;
        Ok(Json(self.snapshot(&state)))
    }

    #[tool(description = "Re-read the corpus file and swap it in if its content changed.")]
    async fn reload_corpus(&self) -> Result<Json<ReloadCorpusResponse>, String> {
        info!("reload_corpus tool invoked");
        let served_digest = self.state.read().await.digest.clone();
        let result = self
            .reload_service
            .reload(&served_digest)
            .map_err(|e| format!("reload failed: {e}"))?;

        let mut state = self.state.write().await;
        if let Some(corpus) = result.corpus {
            state.corpus = corpus;
            state.digest = result.digest.clone();
            state.last_results.clear();
            let AppState {
                corpus, navigation, ..
            } = &mut *state;
            navigation.reconcile(corpus);
        }

        Ok(Json(ReloadCorpusResponse {
            updated: result.updated,
            digest: result.digest,
            application_count: state.corpus.applications.len(),
            article_count: state.corpus.article_count(),
        }))
    }
}

fn category_nodes(
    corpus: &Corpus,
    app_id: AppId,
    forest: &[Category],
    navigation: &NavigationState,
    depth: usize,
) -> Vec<CategoryNode> {
    if depth > MAX_TREE_DEPTH {
        return Vec::new();
    }
    forest
        .iter()
        .filter(|category| corpus.should_show_category(app_id, category))
        .map(|category| CategoryNode {
            id: category.id,
            name: category.name.clone(),
            article_count: corpus.count_articles_in_category(app_id, category.id),
            expanded: navigation.is_expanded(category.id),
            children: category_nodes(corpus, app_id, &category.children, navigation, depth + 1),
        })
        .collect()
}

fn to_search_hit(result: &SearchResult) -> SearchHit {
    let mut hit = SearchHit {
        kind: result.kind().to_string(),
        id: result.id(),
        title: result.title().to_string(),
        app_id: result.app_id(),
        app_name: String::new(),
        category_id: None,
        category_name: result.category_name().map(str::to_string),
        tags: result.tags().map(<[String]>::to_vec),
        snippet: None,
        score: result.score(),
    };
    match result {
        SearchResult::App(app) => hit.app_name = app.title.clone(),
        SearchResult::Article(article) => {
            hit.app_name = article.app_name.clone();
            hit.category_id = Some(article.category_id);
            hit.snippet = Some(article.snippet.clone());
        }
    }
    hit
}

fn to_article_pane(view: ArticleView) -> ArticlePane {
    ArticlePane {
        title: view.title,
        author: view.author,
        last_updated: view.last_updated,
        read_time: view.read_time,
        views: view.views,
        tags: view.tags,
        content: view.content,
        app_id: view.app_id,
    }
}

impl KnowledgebaseServer {
    fn snapshot(&self, state: &AppState) -> NavigationSnapshot {
        let nav = &state.navigation;
        NavigationSnapshot {
            selected_app_id: nav.selected_app(),
            active_menu_item: nav.active_menu_item().to_string(),
            current_section: nav.current_section().to_string(),
            current_article: nav.current_article().to_string(),
            expanded_categories: nav.expanded().iter().copied().collect(),
            is_favorite: nav.is_favorite(),
            favorites: nav.favorites().to_vec(),
            is_searching: self.session.is_searching(),
            article: to_article_pane(nav.current_article_view(&state.corpus)),
        }
    }
}

#[tool_handler]
impl ServerHandler for KnowledgebaseServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "knowledgebase".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Knowledge base MCP server. Use search_articles for free-text queries and \
                 suggest_queries for completions, list_applications/list_categories/get_article \
                 for browsing, and select_application/open_article/open_search_result/\
                 toggle_category/toggle_favorite to drive the navigation cursor."
                    .to_string(),
            ),
        }
    }
}
