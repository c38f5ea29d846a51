use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::MatchMode;
use crate::config::{AffiliationConfig, AffiliationConfigBuilder, ConfigError};
use crate::taxonomy::CategoryKind;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub tokenizer: Option<TokenizerConfig>,
    pub classifier: Option<ClassifierConfig>,
    /// Replaces the built-in taxonomy when present. Order is priority.
    pub taxonomy: Option<Vec<CategoryConfig>>,
    pub collect: Option<CollectConfig>,
    pub institutions: Option<Vec<InstitutionSource>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub delimiters: Option<Vec<String>>,
    pub extra_delimiters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub match_mode: Option<MatchMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub label: String,
    pub kind: CategoryKind,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectConfig {
    pub top_k: Option<usize>,
    pub min_occur: Option<usize>,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub delay_min_ms: Option<u64>,
    pub delay_max_ms: Option<u64>,
    pub proxy: Option<String>,
    pub user_agents: Option<Vec<String>>,
    /// Search URL prefixes; the query is appended URL-encoded.
    pub search_urls: Option<Vec<String>>,
    /// CSS selector for co-author affiliation text on a profile page.
    pub coauthor_selector: Option<String>,
}

/// Order in which a roster writes personal names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrder {
    /// Names are searchable as listed.
    #[default]
    GivenFirst,
    /// Romanized "Surname Given"; reversed before searching.
    SurnameFirst,
}

/// A faculty roster page to crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionSource {
    /// Full institution name, used as the key in every output file.
    pub name: String,
    /// Short alias for `--range` filtering.
    pub alias: String,
    pub url: String,
    /// CSS selector matching one element per faculty name.
    pub selector: String,
    #[serde(default)]
    pub name_order: NameOrder,
}

impl ConfigFile {
    /// Build the tokenizer/classifier configuration described by this file.
    pub fn affiliation_config(&self) -> Result<AffiliationConfig, ConfigError> {
        let mut builder = AffiliationConfigBuilder::new();

        if let Some(tok) = &self.tokenizer {
            if let Some(d) = &tok.delimiters {
                builder = builder.set_delimiters(d.clone());
            }
            for d in tok.extra_delimiters.iter().flatten() {
                builder = builder.add_delimiter(d.clone());
            }
        }
        if let Some(mode) = self.classifier.as_ref().and_then(|c| c.match_mode) {
            builder = builder.match_mode(mode);
        }
        if let Some(categories) = &self.taxonomy {
            builder = builder.categories(
                categories
                    .iter()
                    .map(|c| (c.label.clone(), c.kind, c.keywords.clone()))
                    .collect(),
            );
        }
        builder.build()
    }
}

/// Platform config directory path: `<config_dir>/collabmap/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("collabmap").join("config.toml"))
}

/// Load config by cascading CWD `.collabmap.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".collabmap.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
///
/// List-valued sections (taxonomy, institutions) are replaced wholesale.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let tok = |c: &ConfigFile| c.tokenizer.clone().unwrap_or_default();
    let col = |c: &ConfigFile| c.collect.clone().unwrap_or_default();
    let (bt, ot) = (tok(&base), tok(&overlay));
    let (bc, oc) = (col(&base), col(&overlay));

    ConfigFile {
        tokenizer: Some(TokenizerConfig {
            delimiters: ot.delimiters.or(bt.delimiters),
            extra_delimiters: ot.extra_delimiters.or(bt.extra_delimiters),
        }),
        classifier: Some(ClassifierConfig {
            match_mode: overlay
                .classifier
                .as_ref()
                .and_then(|c| c.match_mode)
                .or_else(|| base.classifier.as_ref().and_then(|c| c.match_mode)),
        }),
        taxonomy: overlay.taxonomy.or(base.taxonomy),
        collect: Some(CollectConfig {
            top_k: oc.top_k.or(bc.top_k),
            min_occur: oc.min_occur.or(bc.min_occur),
            max_attempts: oc.max_attempts.or(bc.max_attempts),
            timeout_secs: oc.timeout_secs.or(bc.timeout_secs),
            delay_min_ms: oc.delay_min_ms.or(bc.delay_min_ms),
            delay_max_ms: oc.delay_max_ms.or(bc.delay_max_ms),
            proxy: oc.proxy.or(bc.proxy),
            user_agents: oc.user_agents.or(bc.user_agents),
            search_urls: oc.search_urls.or(bc.search_urls),
            coauthor_selector: oc.coauthor_selector.or(bc.coauthor_selector),
        }),
        institutions: overlay.institutions.or(base.institutions),
    }
}

/// Save the config to `path`, creating parent directories.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_config_to(config, &path)?;
    Ok(path)
}
