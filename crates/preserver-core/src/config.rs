//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "preserver.toml";

/// Top-level preserver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreserverConfig {
    /// Root of the question bank (one directory per category).
    #[serde(default = "default_questions_dir")]
    pub questions_dir: PathBuf,
    /// Root under which per-user answer directories live.
    #[serde(default = "default_answers_dir")]
    pub answers_dir: PathBuf,
    /// Where export artifacts are written.
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,
    /// Serve questions in random order unless told otherwise.
    #[serde(default = "default_randomize")]
    pub randomize: bool,
}

fn default_questions_dir() -> PathBuf {
    PathBuf::from("questions")
}

fn default_answers_dir() -> PathBuf {
    PathBuf::from("answers")
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_randomize() -> bool {
    true
}

impl Default for PreserverConfig {
    fn default() -> Self {
        Self {
            questions_dir: default_questions_dir(),
            answers_dir: default_answers_dir(),
            exports_dir: default_exports_dir(),
            randomize: default_randomize(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables expand to the empty string. Substituted values are not
/// expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(resolve_env_vars(s)),
        None => path.to_path_buf(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `preserver.toml` in the current directory
/// 2. `~/.config/preserver/config.toml`
///
/// Environment variable overrides: `PRESERVER_QUESTIONS_DIR`,
/// `PRESERVER_ANSWERS_DIR`, `PRESERVER_EXPORTS_DIR`.
pub fn load_config() -> Result<PreserverConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PreserverConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => PreserverConfig::default(),
    };

    if let Ok(dir) = std::env::var("PRESERVER_QUESTIONS_DIR") {
        config.questions_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("PRESERVER_ANSWERS_DIR") {
        config.answers_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("PRESERVER_EXPORTS_DIR") {
        config.exports_dir = PathBuf::from(dir);
    }

    Ok(config)
}

/// Parse a TOML config string, expanding `${VAR}` references in paths.
pub fn parse_config(content: &str) -> Result<PreserverConfig> {
    let mut config: PreserverConfig = toml::from_str(content)?;
    config.questions_dir = resolve_path(&config.questions_dir);
    config.answers_dir = resolve_path(&config.answers_dir);
    config.exports_dir = resolve_path(&config.exports_dir);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("preserver"))
}
