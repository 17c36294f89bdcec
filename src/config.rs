use std::env;
use std::path::PathBuf;

const ENV_PREFIX: &str = "SYNAPSESYNC_";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/synapsesync.db";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Process-wide settings, built once in `main` and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub github_username: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub hpi_export_path: Option<PathBuf>,
    pub sync_cron: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: 8001,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            github_username: None,
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            hpi_export_path: None,
            sync_cron: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. `lookup` receives the full variable name,
    /// e.g. `SYNAPSESYNC_PORT`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {ENV_PREFIX}PORT {raw:?}: {e}"))?,
            None => defaults.port,
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            port,
            cors_origins,
            github_username: get("GITHUB_USERNAME"),
            github_token: get("GITHUB_TOKEN"),
            github_api_url: get("GITHUB_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.github_api_url),
            hpi_export_path: get("HPI_EXPORT_PATH").map(PathBuf::from),
            sync_cron: get("SYNC_CRON"),
        })
    }
}
