use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod config_file;
pub mod pipeline;
pub mod stats;
pub mod taxonomy;
pub mod text_utils;
pub mod tokenizer;
pub mod translate;

// Re-export for convenience
pub use aggregate::{
    CanonicalConnections, CountsByInstitution, FrequencyOptions, InstitutionCount,
    compute_frequency,
};
pub use classifier::{AffiliationClassifier, CanonicalAffiliation, MatchMode, classify};
pub use config::{AffiliationConfig, AffiliationConfigBuilder, ConfigError, ListOverride};
pub use pipeline::AffiliationPipeline;
pub use stats::{InstitutionStats, StatsByInstitution, compute_stats};
pub use taxonomy::{Category, CategoryKind, KeywordTaxonomy};
pub use tokenizer::AffiliationTokenizer;
pub use translate::{NoTranslation, Translator};

/// Raw scraped data: home institution → faculty member → co-author
/// affiliation strings, in profile order.
pub type Connections = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// One co-author's affiliations after canonicalization.
pub type CoauthorAffiliationList = Vec<CanonicalAffiliation>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Read a JSON document (connections, counts, ...) from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CoreError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Write `value` as pretty JSON to `path`, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), CoreError> {
    let io_err = |source| CoreError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|source| CoreError::Json {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, content).map_err(io_err)?;
    tracing::info!(path = %path.display(), "wrote JSON");
    Ok(())
}
