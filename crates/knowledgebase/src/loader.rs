/// Corpus supplier: reads the knowledge base from a JSON fixture file.
///
/// Accepted shapes are a bare array of applications or an object with an
/// `applications` array. Structural problems that the tree utilities tolerate
/// (dangling category references, duplicated category ids) are reported as
/// warnings, never as errors.
use std::collections::HashSet;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::AppError;
use crate::model::{AppId, Application, ArticleId, CategoryId, Corpus};
use crate::tree::{find_in_forest, PreOrder};

/// A parsed corpus together with the digest of the bytes it came from.
pub struct LoadedCorpus {
    pub corpus: Corpus,
    pub digest: String,
}

pub fn load_corpus(path: &Path) -> Result<LoadedCorpus, AppError> {
    let bytes = std::fs::read(path).map_err(|source| AppError::CorpusRead {
        path: path.display().to_string(),
        source,
    })?;
    let digest = corpus_digest(&bytes);
    let corpus = parse_corpus(&String::from_utf8_lossy(&bytes))?;

    let report = validate(&corpus);
    if !report.is_clean() {
        warn!(path = %path.display(), "corpus has structural problems, serving it anyway");
    }
    info!(
        path = %path.display(),
        applications = corpus.applications.len(),
        articles = corpus.article_count(),
        dangling_articles = report.dangling_articles.len(),
        duplicate_categories = report.duplicate_categories.len(),
        "corpus loaded"
    );
    Ok(LoadedCorpus { corpus, digest })
}

pub fn parse_corpus(content: &str) -> Result<Corpus, AppError> {
    if content.trim_start().starts_with('[') {
        let applications: Vec<Application> = serde_json::from_str(content)?;
        Ok(Corpus::new(applications))
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

/// Hex-encoded sha256 of the corpus bytes.
pub fn corpus_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Default, PartialEq)]
pub struct ValidationReport {
    /// `(app, article, missing category)` triples.
    pub dangling_articles: Vec<(AppId, ArticleId, CategoryId)>,
    /// `(app, category)` pairs for ids seen more than once in a forest.
    pub duplicate_categories: Vec<(AppId, CategoryId)>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_articles.is_empty() && self.duplicate_categories.is_empty()
    }
}

pub fn validate(corpus: &Corpus) -> ValidationReport {
    let mut report = ValidationReport::default();

    for app in &corpus.applications {
        let mut seen = HashSet::new();
        for (_, category) in PreOrder::new(&app.categories) {
            if !seen.insert(category.id) {
                warn!(app_id = app.id, category_id = category.id, "duplicate category id");
                report.duplicate_categories.push((app.id, category.id));
            }
        }

        for article in &app.articles {
            if find_in_forest(&app.categories, article.category_id).is_none() {
                warn!(
                    app_id = app.id,
                    article_id = article.id,
                    category_id = article.category_id,
                    "article references unknown category"
                );
                report
                    .dangling_articles
                    .push((app.id, article.id, article.category_id));
            }
        }
    }

    report
}
