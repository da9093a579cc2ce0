use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct DataConfig {
    pub common: core_config::Config,
    pub github: GithubSettings,
    /// Run each read-then-write cycle under a process-wide lock.
    pub serialize_writes: bool,
}

/// Location of the managed document and the credential used to reach it.
///
/// Owner, repo and token are optional here: a missing value is reported per
/// request by the content store, never at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSettings {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub token: Option<Secret<String>>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_path() -> String {
    "data.json".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl DataConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        let github = GithubSettings::load()?;

        let serialize_writes = match env::var("DATA_SERIALIZE_WRITES") {
            Ok(val) => val.trim().parse().map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!(
                    "DATA_SERIALIZE_WRITES must be true or false, got {:?}",
                    val
                ))
            })?,
            Err(_) => false,
        };

        Ok(DataConfig {
            common,
            github,
            serialize_writes,
        })
    }
}

impl GithubSettings {
    /// Reads `GH_OWNER`, `GH_REPO`, `GH_PATH`, `GH_BRANCH`, `GH_TOKEN` and
    /// `GH_API_BASE` from the process environment.
    pub fn load() -> Result<Self, AppError> {
        Self::from_environment(config::Environment::with_prefix("GH"))
    }

    fn from_environment(source: config::Environment) -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize::<GithubSettings>()?;

        Ok(settings.normalized())
    }

    /// Blank values fall back to the same defaults as unset ones.
    fn normalized(mut self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        self.owner = blank_to_none(self.owner);
        self.repo = blank_to_none(self.repo);
        if self.path.trim().is_empty() {
            self.path = default_path();
        }
        if self.branch.trim().is_empty() {
            self.branch = default_branch();
        }
        if self.api_base.trim().is_empty() {
            self.api_base = default_api_base();
        }
        self
    }
}
