/// Search scoring engine for the knowledge base.
///
/// Articles are ranked by an additive word score: every distinct query word
/// found in an enabled field adds that field's weight. Application names are
/// matched separately and ranked with the tiered relevance rule. Results of
/// both kinds are merged and sorted by score, highest first, keeping corpus
/// order among equal scores.
use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::model::{
    AppMatch, Application, Article, ArticleMatch, CategoryId, CategorySummary, Corpus,
    SearchFilters, SearchOptions, SearchResult,
};
use crate::snippet::{extract_snippet, strip_html};
use crate::tree::{find_in_forest, PreOrder};

pub const TITLE_WEIGHT: f64 = 10.0;
pub const TAG_WEIGHT: f64 = 8.0;
pub const CONTENT_WEIGHT: f64 = 3.0;
pub const APP_NAME_WEIGHT: f64 = 5.0;

/// Label used when an article's category id does not resolve.
pub const UNKNOWN_CATEGORY: &str = "Unknown Category";

pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;
/// Shortest partial query that produces suggestions.
pub const MIN_SUGGESTION_QUERY_CHARS: usize = 2;

/// Base scores of the four match tiers for one kind of field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierScores {
    pub exact: f64,
    pub prefix: f64,
    pub substring: f64,
    /// Scaled by the fraction of query words found in the text.
    pub word_overlap: f64,
}

pub const APP_TIERS: TierScores = TierScores {
    exact: 100.0,
    prefix: 85.0,
    substring: 70.0,
    word_overlap: 60.0,
};

pub const TITLE_TIERS: TierScores = TierScores {
    exact: 95.0,
    prefix: 80.0,
    substring: 65.0,
    word_overlap: 55.0,
};

pub const TAG_TIERS: TierScores = TierScores {
    exact: 90.0,
    prefix: 75.0,
    substring: 60.0,
    word_overlap: 50.0,
};

pub const CONTENT_TIERS: TierScores = TierScores {
    exact: 80.0,
    prefix: 70.0,
    substring: 50.0,
    word_overlap: 40.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    App,
    Title,
    Tag,
    Content,
}

impl FieldKind {
    pub const fn tiers(self) -> TierScores {
        match self {
            FieldKind::App => APP_TIERS,
            FieldKind::Title => TITLE_TIERS,
            FieldKind::Tag => TAG_TIERS,
            FieldKind::Content => CONTENT_TIERS,
        }
    }
}

/// Classify `text` against `query` into exactly one tier: exact, prefix,
/// substring, or proportional word overlap. Case-insensitive.
pub fn tiered_relevance(text: &str, query: &str, kind: FieldKind) -> f64 {
    let tiers = kind.tiers();
    let text = text.to_lowercase();
    let query = query.to_lowercase();

    if text == query {
        return tiers.exact;
    }
    if text.starts_with(&query) {
        return tiers.prefix;
    }
    if text.contains(&query) {
        return tiers.substring;
    }

    let query_words: Vec<&str> = query.split_whitespace().collect();
    if query_words.is_empty() {
        return 0.0;
    }
    let text_words: Vec<&str> = text.split_whitespace().collect();
    let matching = query_words
        .iter()
        .filter(|q| text_words.iter().any(|w| w.contains(*q)))
        .count();
    matching as f64 / query_words.len() as f64 * tiers.word_overlap
}

/// Lowercased, trimmed query text.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Distinct whitespace-separated words of a normalized query, in order.
fn query_words(normalized: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    normalized
        .split_whitespace()
        .filter(|word| seen.insert(*word))
        .collect()
}

fn count_matching(words: &[&str], field: &str) -> usize {
    words.iter().filter(|word| field.contains(*word)).count()
}

/// Additive word score of one article. Zero means the article does not match.
pub fn article_score(
    article: &Article,
    app: &Application,
    words: &[&str],
    options: &SearchOptions,
) -> f64 {
    let mut score = 0.0;

    if options.search_in_title {
        let title = article.title.to_lowercase();
        score += count_matching(words, &title) as f64 * TITLE_WEIGHT;
    }

    if options.search_in_tags && !article.tags.is_empty() {
        let tags: Vec<String> = article.tags.iter().map(|t| t.to_lowercase()).collect();
        let matching = words
            .iter()
            .filter(|word| tags.iter().any(|tag| tag.contains(*word)))
            .count();
        score += matching as f64 * TAG_WEIGHT;
    }

    if options.search_in_content {
        if let Some(content) = article.content.as_deref() {
            let text = strip_html(content).to_lowercase();
            score += count_matching(words, &text) as f64 * CONTENT_WEIGHT;
        }
    }

    if options.search_in_app_name {
        let app_name = app.name.to_lowercase();
        score += count_matching(words, &app_name) as f64 * APP_NAME_WEIGHT;
    }

    score
}

/// Name of `category_id` in the application's forest, or `UNKNOWN_CATEGORY`.
pub fn category_name(app: &Application, category_id: CategoryId) -> String {
    find_in_forest(&app.categories, category_id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

/// Rank applications and articles against `options.query`.
///
/// An empty query yields no results. When `options.app_id` is set, other
/// applications are skipped.
pub fn search(corpus: &Corpus, options: &SearchOptions) -> Vec<SearchResult> {
    let query = normalize_query(&options.query);
    if query.is_empty() {
        return Vec::new();
    }
    let words = query_words(&query);

    let mut results = Vec::new();
    for app in &corpus.applications {
        if options.app_id.is_some_and(|scope| scope != app.id) {
            continue;
        }

        if options.search_in_app_name && app.name.to_lowercase().contains(&query) {
            results.push(SearchResult::App(AppMatch {
                id: app.id,
                title: app.name.clone(),
                relevance_score: tiered_relevance(&app.name, &query, FieldKind::App),
            }));
        }

        for article in &app.articles {
            let score = article_score(article, app, &words, options);
            if score <= 0.0 {
                continue;
            }
            results.push(SearchResult::Article(ArticleMatch {
                id: article.id,
                title: article.title.clone(),
                app_id: app.id,
                app_name: app.name.clone(),
                category_id: article.category_id,
                category_name: category_name(app, article.category_id),
                tags: article.tags.clone(),
                snippet: extract_snippet(article.content.as_deref().unwrap_or(""), &query),
                relevance_score: score,
            }));
        }
    }

    // Stable: equal scores keep corpus order.
    results.sort_by(|a, b| b.score().total_cmp(&a.score()));
    debug!(query = %query, results = results.len(), "search complete");
    results
}

/// Keep results that pass every non-empty filter axis.
///
/// Application hits carry no tags or category name, so only the application
/// axis can exclude them.
pub fn apply_filters(mut results: Vec<SearchResult>, filters: &SearchFilters) -> Vec<SearchResult> {
    if filters.is_empty() {
        return results;
    }
    results.retain(|result| {
        if !filters.app_ids.is_empty() && !filters.app_ids.contains(&result.app_id()) {
            return false;
        }
        if !filters.tags.is_empty() {
            if let Some(tags) = result.tags() {
                if !tags.iter().any(|tag| filters.tags.contains(tag)) {
                    return false;
                }
            }
        }
        if !filters.categories.is_empty() {
            if let Some(name) = result.category_name() {
                if !filters.categories.iter().any(|c| c == name) {
                    return false;
                }
            }
        }
        true
    });
    results
}

/// Completion candidates for a partial query: application names, then
/// article titles, then tags, first-seen order, deduplicated, at most `max`.
pub fn suggestions(corpus: &Corpus, partial_query: &str, max: usize) -> Vec<String> {
    let query = normalize_query(partial_query);
    if query.chars().count() < MIN_SUGGESTION_QUERY_CHARS {
        return Vec::new();
    }

    let app_names = corpus.applications.iter().map(|app| &app.name);
    let titles = corpus
        .applications
        .iter()
        .flat_map(|app| app.articles.iter().map(|article| &article.title));
    let tags = corpus
        .applications
        .iter()
        .flat_map(|app| app.articles.iter().flat_map(|article| article.tags.iter()));

    let mut seen = HashSet::new();
    app_names
        .chain(titles)
        .chain(tags)
        .filter(|candidate| candidate.to_lowercase().contains(&query))
        .filter(|candidate| seen.insert(*candidate))
        .take(max)
        .cloned()
        .collect()
}

/// Every tag used by any article, deduplicated and sorted.
pub fn all_tags(corpus: &Corpus) -> Vec<String> {
    corpus
        .applications
        .iter()
        .flat_map(|app| app.articles.iter().flat_map(|article| article.tags.iter()))
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Every category of every application, flattened in pre-order and then
/// sorted by name.
pub fn all_categories(corpus: &Corpus) -> Vec<CategorySummary> {
    let mut categories: Vec<CategorySummary> = corpus
        .applications
        .iter()
        .flat_map(|app| {
            PreOrder::new(&app.categories).map(move |(_, category)| CategorySummary {
                id: category.id,
                name: category.name.clone(),
                app_name: app.name.clone(),
            })
        })
        .collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Application;
    use crate::tree::tests::{article, category, sample_corpus};

    fn with_content(mut a: Article, content: &str) -> Article {
        a.content = Some(content.to_string());
        a
    }

    fn alpha_corpus() -> Corpus {
        Corpus::new(vec![Application {
            id: 1,
            name: "Alpha".to_string(),
            categories: vec![category(10, "Setup", vec![])],
            articles: vec![article(100, 10, "Login failure", &["login", "auth"])],
        }])
    }

    fn two_app_corpus() -> Corpus {
        Corpus::new(vec![
            Application {
                id: 1,
                name: "Payroll".to_string(),
                categories: vec![category(1, "Payments", vec![category(2, "Errors", vec![])])],
                articles: vec![
                    with_content(
                        article(10, 2, "Gateway timeout", &["payment", "timeout"]),
                        "<p>The payment gateway did not answer in time.</p>",
                    ),
                    with_content(
                        article(11, 1, "Monthly report", &["report"]),
                        "<p>Export the payment summary.</p>",
                    ),
                ],
            },
            Application {
                id: 2,
                name: "Payment Portal".to_string(),
                categories: vec![category(1, "General", vec![])],
                articles: vec![article(20, 1, "Portal overview", &["intro"])],
            },
        ])
    }

    #[test]
    fn login_example_scores_title_and_tags() {
        let results = search(&alpha_corpus(), &SearchOptions::with_query("login"));
        assert_eq!(results.len(), 1);
        let SearchResult::Article(hit) = &results[0] else {
            panic!("expected article result");
        };
        assert_eq!(hit.id, 100);
        assert_eq!(hit.category_name, "Setup");
        assert_eq!(hit.relevance_score, TITLE_WEIGHT + TAG_WEIGHT);
        assert_eq!(hit.tags, vec!["login".to_string(), "auth".to_string()]);
    }

    #[test]
    fn empty_query_returns_nothing() {
        assert!(search(&alpha_corpus(), &SearchOptions::with_query("   ")).is_empty());
    }

    #[test]
    fn disabled_fields_produce_no_article_results() {
        let options = SearchOptions {
            query: "payment".to_string(),
            search_in_title: false,
            search_in_tags: false,
            search_in_app_name: false,
            search_in_content: false,
            app_id: None,
        };
        assert!(search(&two_app_corpus(), &options).is_empty());
    }

    #[test]
    fn app_name_match_uses_tiered_score() {
        let options = SearchOptions {
            search_in_title: false,
            search_in_tags: false,
            search_in_content: false,
            ..SearchOptions::with_query("payment portal")
        };
        let results = search(&two_app_corpus(), &options);
        let app_hit = results
            .iter()
            .find_map(|r| match r {
                SearchResult::App(m) => Some(m),
                _ => None,
            })
            .expect("application result");
        assert_eq!(app_hit.id, 2);
        assert_eq!(app_hit.relevance_score, APP_TIERS.exact);
        // The portal article gets the app-name context boost for both words.
        assert!(results.iter().any(|r| r.kind() == "article" && r.id() == 20));
    }

    #[test]
    fn results_are_sorted_by_score() {
        let results = search(&two_app_corpus(), &SearchOptions::with_query("payment timeout"));
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].score() >= pair[1].score());
        }
        assert_eq!(results[0].id(), 10);
    }

    #[test]
    fn equal_scores_keep_corpus_order() {
        let corpus = Corpus::new(vec![Application {
            id: 1,
            name: "Docs".to_string(),
            categories: vec![category(1, "All", vec![])],
            articles: vec![
                article(1, 1, "Setup guide", &[]),
                article(2, 1, "Setup checklist", &[]),
                article(3, 1, "Setup faq", &[]),
            ],
        }]);
        let ids: Vec<u64> = search(&corpus, &SearchOptions::with_query("setup"))
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn scoped_search_skips_other_apps() {
        let options = SearchOptions {
            app_id: Some(2),
            ..SearchOptions::with_query("payment")
        };
        let results = search(&two_app_corpus(), &options);
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.app_id() == 2));
    }

    #[test]
    fn repeated_query_words_count_once() {
        let once = search(&alpha_corpus(), &SearchOptions::with_query("login"));
        let twice = search(&alpha_corpus(), &SearchOptions::with_query("login login"));
        assert_eq!(once[0].score(), twice[0].score());
    }

    #[test]
    fn content_matches_use_stripped_text() {
        let options = SearchOptions {
            search_in_title: false,
            search_in_tags: false,
            search_in_app_name: false,
            ..SearchOptions::with_query("gateway")
        };
        let results = search(&two_app_corpus(), &options);
        assert_eq!(results.len(), 1);
        let SearchResult::Article(hit) = &results[0] else {
            panic!("expected article result");
        };
        assert_eq!(hit.relevance_score, CONTENT_WEIGHT);
        assert!(hit.snippet.contains("<mark>gateway</mark>"));

        let markup_only = search(&two_app_corpus(), &SearchOptions {
            query: "p>".to_string(),
            ..options
        });
        assert!(markup_only.is_empty());
    }

    #[test]
    fn dangling_category_resolves_to_unknown() {
        let results = search(&sample_corpus(), &SearchOptions::with_query("orphaned"));
        let SearchResult::Article(hit) = &results[0] else {
            panic!("expected article result");
        };
        assert_eq!(hit.category_name, UNKNOWN_CATEGORY);
    }

    #[test]
    fn tiers_are_exclusive() {
        assert_eq!(tiered_relevance("Alpha", "alpha", FieldKind::App), 100.0);
        assert_eq!(tiered_relevance("Alphabet", "alpha", FieldKind::App), 85.0);
        assert_eq!(tiered_relevance("The Alpha", "alpha", FieldKind::App), 70.0);
        assert_eq!(tiered_relevance("Alpha Beta", "beta gamma", FieldKind::App), 30.0);
        assert_eq!(tiered_relevance("Login", "login", FieldKind::Title), 95.0);
        assert_eq!(tiered_relevance("auth", "au", FieldKind::Tag), 75.0);
        assert_eq!(tiered_relevance("body", "zzz", FieldKind::Content), 0.0);
        assert_eq!(tiered_relevance("body", "", FieldKind::Content), CONTENT_TIERS.prefix);
    }

    #[test]
    fn empty_filters_are_identity() {
        let results = search(&two_app_corpus(), &SearchOptions::with_query("payment"));
        let filtered = apply_filters(results.clone(), &SearchFilters::default());
        assert_eq!(filtered, results);
    }

    #[test]
    fn filters_combine_axes() {
        let results = search(&two_app_corpus(), &SearchOptions::with_query("payment"));

        let by_app = apply_filters(
            results.clone(),
            &SearchFilters {
                app_ids: vec![1],
                ..SearchFilters::default()
            },
        );
        assert!(!by_app.is_empty());
        assert!(by_app.iter().all(|r| r.app_id() == 1));

        let by_tag = apply_filters(
            results.clone(),
            &SearchFilters {
                tags: vec!["timeout".to_string()],
                ..SearchFilters::default()
            },
        );
        let article_ids: Vec<u64> = by_tag
            .iter()
            .filter(|r| r.kind() == "article")
            .map(|r| r.id())
            .collect();
        assert_eq!(article_ids, vec![10]);
        // Application hits carry no tags and survive the tag axis.
        assert!(by_tag.iter().any(|r| r.kind() == "app"));

        let by_category = apply_filters(
            results,
            &SearchFilters {
                app_ids: vec![1],
                categories: vec!["Payments".to_string()],
                ..SearchFilters::default()
            },
        );
        let article_ids: Vec<u64> = by_category
            .iter()
            .filter(|r| r.kind() == "article")
            .map(|r| r.id())
            .collect();
        assert_eq!(article_ids, vec![11]);
    }

    #[test]
    fn suggestions_prefer_app_names_then_titles_then_tags() {
        let corpus = two_app_corpus();
        assert_eq!(
            suggestions(&corpus, "pay", DEFAULT_MAX_SUGGESTIONS),
            vec!["Payroll".to_string(), "Payment Portal".to_string(), "payment".to_string()]
        );
        assert_eq!(
            suggestions(&corpus, "port", DEFAULT_MAX_SUGGESTIONS),
            vec![
                "Payment Portal".to_string(),
                "Monthly report".to_string(),
                "Portal overview".to_string(),
                "report".to_string()
            ]
        );
        assert_eq!(suggestions(&corpus, "port", 2).len(), 2);
        assert!(suggestions(&corpus, "p", DEFAULT_MAX_SUGGESTIONS).is_empty());
        assert!(suggestions(&corpus, "  p ", DEFAULT_MAX_SUGGESTIONS).is_empty());
    }

    #[test]
    fn suggestions_keep_first_seen_of_repeated_strings() {
        let corpus = Corpus::new(vec![
            Application {
                id: 1,
                name: "Login".to_string(),
                categories: vec![category(1, "Access", vec![])],
                articles: vec![article(10, 1, "login", &["Login", "sso"])],
            },
            Application {
                id: 2,
                name: "Login".to_string(),
                categories: vec![category(1, "Access", vec![])],
                articles: vec![article(20, 1, "login", &["login", "blogging"])],
            },
        ]);

        assert_eq!(
            suggestions(&corpus, "log", DEFAULT_MAX_SUGGESTIONS),
            vec!["Login".to_string(), "login".to_string(), "blogging".to_string()]
        );
        assert_eq!(
            suggestions(&corpus, "log", 2),
            vec!["Login".to_string(), "login".to_string()]
        );
    }

    #[test]
    fn all_tags_are_sorted_and_unique() {
        let corpus = Corpus::new(vec![Application {
            id: 1,
            name: "Tags".to_string(),
            categories: vec![],
            articles: vec![article(1, 1, "one", &["b", "a"]), article(2, 1, "two", &["b", "c"])],
        }]);
        assert_eq!(all_tags(&corpus), vec!["a", "b", "c"]);
    }

    #[test]
    fn all_categories_flattens_and_sorts_by_name() {
        let categories = all_categories(&two_app_corpus());
        let names: Vec<(&str, &str)> = categories
            .iter()
            .map(|c| (c.name.as_str(), c.app_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("Errors", "Payroll"), ("General", "Payment Portal"), ("Payments", "Payroll")]
        );
    }
}
