/// Category tree utilities: lookups, counts, parent discovery, auto-expand and
/// visibility pruning over an application's category forest.
///
/// Lookups never fail. Unknown applications, categories or articles yield
/// empty collections or `None`. Traversal uses an explicit stack and stops
/// descending at `MAX_TREE_DEPTH`, since the corpus is supplied externally.
use std::collections::{BTreeSet, HashSet};

use tracing::warn;

use crate::model::{AppId, Article, ArticleId, Category, CategoryId, Corpus};

/// Deepest level visited below a forest root, and the longest ancestor walk.
pub const MAX_TREE_DEPTH: usize = 64;

/// Depth-first pre-order walk over a forest, yielding `(depth, category)`.
pub struct PreOrder<'a> {
    stack: Vec<(usize, &'a Category)>,
}

impl<'a> PreOrder<'a> {
    pub fn new(forest: &'a [Category]) -> Self {
        Self {
            stack: forest.iter().rev().map(|c| (0, c)).collect(),
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (usize, &'a Category);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, category) = self.stack.pop()?;
        if depth < MAX_TREE_DEPTH {
            self.stack
                .extend(category.children.iter().rev().map(|c| (depth + 1, c)));
        } else if !category.children.is_empty() {
            warn!(category_id = category.id, depth, "category tree too deep, not descending");
        }
        Some((depth, category))
    }
}

/// First category with `category_id` in pre-order.
pub fn find_in_forest(forest: &[Category], category_id: CategoryId) -> Option<&Category> {
    PreOrder::new(forest)
        .map(|(_, c)| c)
        .find(|c| c.id == category_id)
}

/// Id of the first category (in pre-order) whose direct children include
/// `child_id`. Forest roots have no parent.
pub fn parent_in_forest(forest: &[Category], child_id: CategoryId) -> Option<CategoryId> {
    PreOrder::new(forest)
        .map(|(_, c)| c)
        .find(|c| c.children.iter().any(|child| child.id == child_id))
        .map(|c| c.id)
}

impl Corpus {
    /// Top-level categories of an application; empty for an unknown id.
    pub fn categories_for_app(&self, app_id: AppId) -> &[Category] {
        self.application(app_id)
            .map(|app| app.categories.as_slice())
            .unwrap_or(&[])
    }

    /// Articles owned directly by `category_id`, in corpus order.
    pub fn articles_for_category(&self, app_id: AppId, category_id: CategoryId) -> Vec<&Article> {
        let Some(app) = self.application(app_id) else {
            return Vec::new();
        };
        app.articles
            .iter()
            .filter(|article| article.category_id == category_id)
            .collect()
    }

    pub fn find_category(&self, app_id: AppId, category_id: CategoryId) -> Option<&Category> {
        find_in_forest(self.categories_for_app(app_id), category_id)
    }

    pub fn find_article(&self, app_id: AppId, article_id: ArticleId) -> Option<&Article> {
        self.application(app_id)?
            .articles
            .iter()
            .find(|article| article.id == article_id)
    }

    pub fn count_articles_in_category(&self, app_id: AppId, category_id: CategoryId) -> usize {
        self.articles_for_category(app_id, category_id).len()
    }

    /// Size of the application's flat article list.
    pub fn count_articles_in_app(&self, app_id: AppId) -> usize {
        self.application(app_id)
            .map(|app| app.articles.len())
            .unwrap_or(0)
    }

    pub fn find_parent(&self, app_id: AppId, child_id: CategoryId) -> Option<CategoryId> {
        parent_in_forest(self.categories_for_app(app_id), child_id)
    }

    /// Insert `category_id` and every ancestor up to its forest root into
    /// `expanded`.
    ///
    /// Idempotent. The ancestor walk stops on an id it already visited during
    /// this call (a duplicated id forming a loop) or after `MAX_TREE_DEPTH`
    /// steps.
    pub fn auto_expand(
        &self,
        app_id: AppId,
        category_id: CategoryId,
        expanded: &mut BTreeSet<CategoryId>,
    ) {
        expanded.insert(category_id);

        let mut visited = HashSet::from([category_id]);
        let mut current = category_id;
        for _ in 0..MAX_TREE_DEPTH {
            let Some(parent) = self.find_parent(app_id, current) else {
                return;
            };
            if !visited.insert(parent) {
                warn!(app_id, category_id, parent, "category loop detected during auto-expand");
                return;
            }
            expanded.insert(parent);
            current = parent;
        }
        warn!(app_id, category_id, "auto-expand stopped at depth limit");
    }

    /// True if `category` or any descendant directly owns an article.
    pub fn should_show_category(&self, app_id: AppId, category: &Category) -> bool {
        let Some(app) = self.application(app_id) else {
            return false;
        };
        let owners: HashSet<CategoryId> = app.articles.iter().map(|a| a.category_id).collect();
        PreOrder::new(std::slice::from_ref(category)).any(|(_, c)| owners.contains(&c.id))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Application;

    pub(crate) fn category(id: CategoryId, name: &str, children: Vec<Category>) -> Category {
        Category {
            id,
            name: name.to_string(),
            children,
        }
    }

    pub(crate) fn article(id: ArticleId, category_id: CategoryId, title: &str, tags: &[&str]) -> Article {
        Article {
            id,
            category_id,
            title: title.to_string(),
            author: "Admin".to_string(),
            created_at: "2024-01-10T08:00:00Z".to_string(),
            created_by: "admin".to_string(),
            updated_at: "2024-02-01T08:00:00Z".to_string(),
            updated_by: "admin".to_string(),
            content: None,
            read_time: None,
            views: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// 1 Authentication
    ///   10 Login Issues          (article 100)
    ///   11 Password Reset
    /// 2 Transactions
    ///   3 Forms
    ///     4 Save Failures        (article 101)
    ///     5 Validation
    /// 9 Integration              (article 102)
    pub(crate) fn sample_corpus() -> Corpus {
        Corpus::new(vec![Application {
            id: 1,
            name: "Alpha".to_string(),
            categories: vec![
                category(
                    1,
                    "Authentication",
                    vec![
                        category(10, "Login Issues", vec![]),
                        category(11, "Password Reset", vec![]),
                    ],
                ),
                category(
                    2,
                    "Transactions",
                    vec![category(
                        3,
                        "Forms",
                        vec![
                            category(4, "Save Failures", vec![]),
                            category(5, "Validation", vec![]),
                        ],
                    )],
                ),
                category(9, "Integration", vec![]),
            ],
            articles: vec![
                article(100, 10, "Login failure", &["login", "auth"]),
                article(101, 4, "Form cannot be saved", &["form"]),
                article(102, 9, "API keys", &["api"]),
                article(103, 77, "Orphaned article", &[]),
            ],
        }])
    }

    #[test]
    fn unknown_app_degrades_to_empty() {
        let corpus = sample_corpus();
        assert!(corpus.categories_for_app(42).is_empty());
        assert!(corpus.articles_for_category(42, 10).is_empty());
        assert!(corpus.find_category(42, 10).is_none());
        assert!(corpus.find_article(42, 100).is_none());
        assert_eq!(corpus.count_articles_in_app(42), 0);
        assert_eq!(corpus.find_parent(42, 10), None);
    }

    #[test]
    fn find_category_reaches_every_node() {
        let corpus = sample_corpus();
        let forest = corpus.categories_for_app(1);
        let ids: Vec<CategoryId> = PreOrder::new(forest).map(|(_, c)| c.id).collect();
        assert_eq!(ids, vec![1, 10, 11, 2, 3, 4, 5, 9]);
        for id in ids {
            let found = corpus.find_category(1, id).expect("category should be found");
            assert_eq!(found.id, id);
        }
        assert!(corpus.find_category(1, 999).is_none());
    }

    #[test]
    fn pre_order_reports_depth() {
        let corpus = sample_corpus();
        let depths: Vec<(CategoryId, usize)> = PreOrder::new(corpus.categories_for_app(1))
            .map(|(d, c)| (c.id, d))
            .collect();
        assert!(depths.contains(&(1, 0)));
        assert!(depths.contains(&(3, 1)));
        assert!(depths.contains(&(5, 2)));
    }

    #[test]
    fn articles_and_counts() {
        let corpus = sample_corpus();
        let articles = corpus.articles_for_category(1, 10);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, 100);
        assert_eq!(corpus.count_articles_in_category(1, 10), 1);
        assert_eq!(corpus.count_articles_in_category(1, 1), 0);
        assert_eq!(corpus.count_articles_in_category(1, 999), 0);
        // Flat list size, including the article with a dangling category.
        assert_eq!(corpus.count_articles_in_app(1), 4);
        assert_eq!(corpus.find_article(1, 103).map(|a| a.category_id), Some(77));
    }

    #[test]
    fn parents_are_direct_owners() {
        let corpus = sample_corpus();
        assert_eq!(corpus.find_parent(1, 10), Some(1));
        assert_eq!(corpus.find_parent(1, 3), Some(2));
        assert_eq!(corpus.find_parent(1, 5), Some(3));
        assert_eq!(corpus.find_parent(1, 1), None);
        assert_eq!(corpus.find_parent(1, 9), None);
        assert_eq!(corpus.find_parent(1, 999), None);
    }

    #[test]
    fn auto_expand_reveals_ancestors() {
        let corpus = sample_corpus();
        let mut expanded = BTreeSet::new();
        corpus.auto_expand(1, 5, &mut expanded);
        assert_eq!(expanded, BTreeSet::from([5, 3, 2]));
    }

    #[test]
    fn auto_expand_is_idempotent() {
        let corpus = sample_corpus();
        let mut once = BTreeSet::new();
        corpus.auto_expand(1, 4, &mut once);
        let mut twice = once.clone();
        corpus.auto_expand(1, 4, &mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn auto_expand_keeps_existing_entries() {
        let corpus = sample_corpus();
        let mut expanded = BTreeSet::from([9, 3]);
        corpus.auto_expand(1, 4, &mut expanded);
        assert_eq!(expanded, BTreeSet::from([2, 3, 4, 9]));
    }

    #[test]
    fn auto_expand_chain_five_two_one() {
        let corpus = Corpus::new(vec![Application {
            id: 7,
            name: "Chain".to_string(),
            categories: vec![category(
                1,
                "Root",
                vec![category(2, "Middle", vec![category(5, "Leaf", vec![])])],
            )],
            articles: vec![],
        }]);
        let mut expanded = BTreeSet::new();
        corpus.auto_expand(7, 5, &mut expanded);
        assert_eq!(expanded, BTreeSet::from([1, 2, 5]));
    }

    #[test]
    fn auto_expand_terminates_on_duplicated_ids() {
        // 2 appears both as the parent and as a grandchild of 5.
        let corpus = Corpus::new(vec![Application {
            id: 1,
            name: "Broken".to_string(),
            categories: vec![
                category(2, "A", vec![category(5, "B", vec![])]),
                category(5, "B again", vec![category(2, "A again", vec![])]),
            ],
            articles: vec![],
        }]);
        let mut expanded = BTreeSet::new();
        corpus.auto_expand(1, 5, &mut expanded);
        assert_eq!(expanded, BTreeSet::from([2, 5]));
    }

    #[test]
    fn auto_expand_unknown_app_still_marks_category() {
        let corpus = sample_corpus();
        let mut expanded = BTreeSet::new();
        corpus.auto_expand(42, 10, &mut expanded);
        assert_eq!(expanded, BTreeSet::from([10]));
    }

    #[test]
    fn deep_chain_is_bounded() {
        let mut node = category(1000, "bottom", vec![]);
        for id in (0..200).rev() {
            node = category(id, "level", vec![node]);
        }
        let forest = vec![node];
        let visited = PreOrder::new(&forest).count();
        assert_eq!(visited, MAX_TREE_DEPTH + 1);
        assert!(find_in_forest(&forest, 1000).is_none());
    }

    #[test]
    fn visibility_prunes_empty_branches() {
        let corpus = sample_corpus();
        let forest = corpus.categories_for_app(1);
        let visible: Vec<CategoryId> = forest
            .iter()
            .filter(|c| corpus.should_show_category(1, c))
            .map(|c| c.id)
            .collect();
        assert_eq!(visible, vec![1, 2, 9]);

        let password = corpus.find_category(1, 11).expect("category 11");
        assert!(!corpus.should_show_category(1, password));
        let validation = corpus.find_category(1, 5).expect("category 5");
        assert!(!corpus.should_show_category(1, validation));
        assert!(!corpus.should_show_category(42, password));
    }
}
