// Configuration loading and parsing (dashboard.toml, credentials.toml).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing config file {path}")]
    FileNotFound { path: PathBuf },

    #[error("invalid TOML in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("bad value for `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("could not seed config/ from defaults/: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub fpl: FplConfig,
    pub league: LeagueConfig,
    pub llm: LlmConfig,
    pub ui: UiConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// dashboard.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire dashboard.toml file.
#[derive(Debug, Clone, Deserialize)]
struct DashboardFile {
    fpl: FplConfig,
    #[serde(default)]
    league: LeagueConfig,
    llm: LlmConfig,
    #[serde(default)]
    ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FplConfig {
    /// Base URL of the FPL API, always ending in `/` after loading.
    pub api_base: String,
    /// Optional relay the full target URL is appended to. Empty disables it.
    #[serde(default)]
    pub relay_prefix: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    concat!("fpl-dashboard/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueConfig {
    #[serde(default)]
    pub default_league_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    #[serde(default)]
    pub scout_web_search: bool,
    pub analyses: AnalysesConfig,
}

/// Per-analysis sampling settings, one table per narrative request kind.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysesConfig {
    pub team_strength: AnalysisParams,
    pub key_matches: AnalysisParams,
    pub predictions: AnalysisParams,
    pub luck: AnalysisParams,
    pub pvp: AnalysisParams,
    pub scout: AnalysisParams,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnalysisParams {
    pub temperature: f64,
    /// Falls back to `llm.max_tokens` when omitted.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig { tick_rate_ms: 33 }
    }
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

/// Environment variable consulted when credentials.toml carries no key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/dashboard.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults and does not consult the environment. Prefer
/// `load_config_at()` for application startup.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let file: DashboardFile = parse_toml(&config_dir.join("dashboard.toml"))?;
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        parse_toml(&credentials_path)?
    } else {
        CredentialsConfig::default()
    };

    let mut config = Config {
        fpl: file.fpl,
        league: file.league,
        llm: file.llm,
        ui: file.ui,
        credentials,
    };
    normalize(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Copy every file in `defaults/` that `config/` lacks, skipping `.example`
/// templates. Returns the paths written.
///
/// A base directory with `config/` but no `defaults/` is left alone.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(
            "no defaults/ or config/ directory",
            format!("{}: run from the project root or pass --base-dir", base_dir.display()),
        ));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error("cannot create config directory", e))?;

    let mut copied = Vec::new();
    for source in default_files(&defaults_dir)? {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(name);
        if copy_if_absent(&source, &target)? {
            info!(file = %target.display(), "copied default config file");
            copied.push(target);
        }
    }
    Ok(copied)
}

/// Regular files in `dir`, minus `.example` templates.
fn default_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| copy_error("cannot list defaults", e))? {
        let path = entry.map_err(|e| copy_error("cannot list defaults", e))?.path();
        let is_template = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !is_template {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy `source` to `target` unless `target` already exists.
fn copy_if_absent(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(&format!("cannot create {}", target.display()), e)),
    };
    let mut src = std::fs::File::open(source)
        .map_err(|e| copy_error(&format!("cannot open {}", source.display()), e))?;
    std::io::copy(&mut src, &mut dest)
        .map_err(|e| copy_error(&format!("cannot write {}", target.display()), e))?;
    Ok(true)
}

/// Load config relative to `base_dir`: copies defaults, reads the files,
/// then falls back to `ANTHROPIC_API_KEY` when no key is on disk.
pub fn load_config_at(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    let mut config = load_config_from(base_dir)?;
    config.credentials.anthropic_api_key = resolve_api_key(
        config.credentials.anthropic_api_key.take(),
        std::env::var(API_KEY_ENV).ok(),
    );
    Ok(config)
}

/// Pick the API key: a non-blank file value wins over the environment.
pub fn resolve_api_key(from_file: Option<String>, from_env: Option<String>) -> Option<String> {
    let non_blank = |k: &String| !k.trim().is_empty();
    from_file
        .filter(non_blank)
        .or_else(|| from_env.filter(non_blank))
        .map(|k| k.trim().to_string())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_error(context: &str, detail: impl std::fmt::Display) -> ConfigError {
    ConfigError::DefaultsCopyError {
        message: format!("{context}: {detail}"),
    }
}

impl LlmConfig {
    /// Effective token budget for an analysis.
    pub fn max_tokens_for(&self, params: &AnalysisParams) -> u32 {
        params.max_tokens.unwrap_or(self.max_tokens)
    }
}

fn normalize(config: &mut Config) {
    config.fpl.api_base = config.fpl.api_base.trim().to_string();
    if !config.fpl.api_base.is_empty() && !config.fpl.api_base.ends_with('/') {
        config.fpl.api_base.push('/');
    }
    config.fpl.relay_prefix = config.fpl.relay_prefix.trim().to_string();
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base = &config.fpl.api_base;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "fpl.api_base".into(),
            message: format!("must be an http(s) URL, got {base:?}"),
        });
    }

    let positive_fields: &[(&str, u64)] = &[
        ("fpl.request_timeout_secs", config.fpl.request_timeout_secs),
        (
            "fpl.max_concurrent_requests",
            config.fpl.max_concurrent_requests as u64,
        ),
        ("llm.max_tokens", u64::from(config.llm.max_tokens)),
        ("ui.tick_rate_ms", config.ui.tick_rate_ms),
    ];
    for (name, val) in positive_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "llm.model".into(),
            message: "must not be empty".into(),
        });
    }

    let a = &config.llm.analyses;
    let analyses: &[(&str, &AnalysisParams)] = &[
        ("team_strength", &a.team_strength),
        ("key_matches", &a.key_matches),
        ("predictions", &a.predictions),
        ("luck", &a.luck),
        ("pvp", &a.pvp),
        ("scout", &a.scout),
    ];
    for (name, params) in analyses {
        if !(0.0..=1.0).contains(&params.temperature) {
            return Err(ConfigError::ValidationError {
                field: format!("llm.analyses.{name}.temperature"),
                message: format!(
                    "must be between 0.0 and 1.0 inclusive, got {}",
                    params.temperature
                ),
            });
        }
        if params.max_tokens == Some(0) {
            return Err(ConfigError::ValidationError {
                field: format!("llm.analyses.{name}.max_tokens"),
                message: "must be > 0".into(),
            });
        }
    }

    if config.league.default_league_id == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "league.default_league_id".into(),
            message: "must be a positive league ID".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
