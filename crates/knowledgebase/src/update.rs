/// Corpus reload service.
///
/// Compares the sha256 digest of the corpus file with the digest of the
/// corpus currently served, and re-loads only when the content changed.
/// Triggered on demand via the `reload_corpus` tool.
use std::path::PathBuf;

use tracing::info;

use crate::error::AppError;
use crate::loader::{self, LoadedCorpus};
use crate::model::Corpus;

/// Result of a reload attempt.
pub struct ReloadResult {
    /// Whether a new corpus was loaded.
    pub updated: bool,
    /// Digest of the file on disk.
    pub digest: String,
    /// The new corpus, present only when `updated` is true.
    pub corpus: Option<Corpus>,
}

pub struct ReloadService {
    corpus_path: PathBuf,
}

impl ReloadService {
    pub fn new(corpus_path: PathBuf) -> Self {
        Self { corpus_path }
    }

    pub fn current_digest(&self) -> Result<String, AppError> {
        let bytes = std::fs::read(&self.corpus_path).map_err(|source| AppError::CorpusRead {
            path: self.corpus_path.display().to_string(),
            source,
        })?;
        Ok(loader::corpus_digest(&bytes))
    }

    pub fn reload(&self, served_digest: &str) -> Result<ReloadResult, AppError> {
        let digest = self.current_digest()?;
        if digest == served_digest {
            info!(digest = %digest, "corpus unchanged, skipping reload");
            return Ok(ReloadResult {
                updated: false,
                digest,
                corpus: None,
            });
        }

        let LoadedCorpus { corpus, digest } = loader::load_corpus(&self.corpus_path)?;
        info!(digest = %digest, applications = corpus.applications.len(), "corpus reloaded");
        Ok(ReloadResult {
            updated: true,
            digest,
            corpus: Some(corpus),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("kb-{}-{name}.json", std::process::id()));
        std::fs::write(&path, content).expect("write scratch corpus");
        path
    }

    #[test]
    fn reload_only_when_content_changes() {
        let path = scratch_file("reload", "[]");
        let service = ReloadService::new(path.clone());

        let served = service.current_digest().expect("digest");
        let unchanged = service.reload(&served).expect("reload");
        assert!(!unchanged.updated);
        assert!(unchanged.corpus.is_none());

        std::fs::write(
            &path,
            r#"[{"app_id": 3, "name": "PPID", "category_list": [], "article_list": []}]"#,
        )
        .expect("rewrite scratch corpus");
        assert_ne!(service.current_digest().expect("digest"), served);
        let changed = service.reload(&served).expect("reload");
        assert!(changed.updated);
        assert_ne!(changed.digest, served);
        let corpus = changed.corpus.expect("new corpus");
        assert_eq!(corpus.applications[0].name, "PPID");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_content_keeps_error() {
        let path = scratch_file("invalid", "{ nope");
        let service = ReloadService::new(path.clone());
        assert!(matches!(service.reload("old"), Err(AppError::CorpusFormat(_))));
        let _ = std::fs::remove_file(&path);
    }
}
