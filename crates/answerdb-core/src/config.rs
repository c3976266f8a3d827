//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nesting, e.g. `APP_EXEC__TIMEOUT_SECS`)
//! + a bare `PORT` variable mapped onto `server.port`.
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment, e.g. one built from `Toml::string` in tests.
    pub fn from_figment(figment: Figment) -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment),
        }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if settings.exec.max_concurrent == 0 {
            anyhow::bail!("exec.max_concurrent must be at least 1 (env: {})", env);
        }
        if settings.exec.timeout_secs == 0 {
            anyhow::bail!("exec.timeout_secs must be at least 1 (env: {})", env);
        }
        match env {
            "prod" | "production" if settings.embed.use_fake => {
                anyhow::bail!("embed.use_fake is not allowed in production")
            }
            _ => {}
        }
        Ok(())
    }
}

/// Typed view over the merged configuration. Every section has defaults so an
/// empty `config.toml` is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub index: IndexSettings,
    pub embed: EmbedSettings,
    pub exec: ExecSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub root: String,
    pub folders: Vec<String>,
    pub question_extension: String,
    /// Ordered by preference; the first existing sibling wins.
    pub solution_extensions: Vec<String>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            root: "./repo".to_string(),
            folders: vec!["GA1".to_string(), "GA2".to_string()],
            question_extension: "txt".to_string(),
            solution_extensions: vec!["py".to_string(), "sh".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub path: String,
    pub rebuild_on_start: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { path: "embeddings.json".to_string(), rebuild_on_start: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedSettings {
    pub model_dir: String,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self { model_dir: "models/all-MiniLM-L6-v2".to_string(), use_fake: false, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecSettings {
    pub timeout_secs: u64,
    pub max_concurrent: usize,
    pub python: String,
    pub bash: String,
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_concurrent: 4,
            python: "python3".to_string(),
            bash: "bash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
