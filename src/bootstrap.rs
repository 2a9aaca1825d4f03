use std::{env, fs, path::Path, sync::Arc, sync::OnceLock};

use serde::{Deserialize, Serialize};

use crate::{
    database::db,
    img_log,
    meltdown::*,
    services::{logger, AuthProvider, HostedAuth, LogLevel, PgStore, RecordStore, SessionService},
};

pub const CONFIG_PATH: &str = "Imagery.toml";

pub static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub required_env: RequiredEnv,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings { environment: default_environment() }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionSettings {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_session_ttl_mins")]
    pub session_ttl_mins: u64,

    #[serde(default = "default_refresh_threshold_mins")]
    pub refresh_threshold_mins: u64,

    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,

    #[serde(default = "default_true")]
    pub secure_cookie: bool,

    /// When set, tokens must carry this `aud` claim.
    #[serde(default)]
    pub audience: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            cookie_name: default_cookie_name(),
            session_ttl_mins: default_session_ttl_mins(),
            refresh_threshold_mins: default_refresh_threshold_mins(),
            leeway_secs: default_leeway_secs(),
            secure_cookie: true,
            audience: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings { recent_limit: default_recent_limit() }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthSettings {
    /// Hosted sign-in page of the authentication provider.
    #[serde(default)]
    pub sign_in_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseSettings {
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings { max_pool_size: default_max_pool_size() }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_directory")]
    pub directory: String,

    #[serde(default = "default_min_level")]
    pub min_level: LogLevel,

    #[serde(default = "default_true")]
    pub stdout: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            directory: default_log_directory(),
            min_level: default_min_level(),
            stdout: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RequiredEnv {
    #[serde(default = "default_required_variables")]
    pub variables: Vec<String>,
}

impl Default for RequiredEnv {
    fn default() -> Self {
        RequiredEnv { variables: default_required_variables() }
    }
}

fn default_environment() -> String {
    "prod".to_string()
}

fn default_cookie_name() -> String {
    "access_token".to_string()
}

fn default_session_ttl_mins() -> u64 {
    60
}

fn default_refresh_threshold_mins() -> u64 {
    10
}

fn default_leeway_secs() -> u64 {
    5
}

fn default_recent_limit() -> usize {
    5
}

fn default_max_pool_size() -> usize {
    16
}

fn default_log_directory() -> String {
    "storage/logs".to_string()
}

fn default_min_level() -> LogLevel {
    LogLevel::Info
}

fn default_required_variables() -> Vec<String> {
    vec!["DATABASE_URL".to_string(), "JWT_SECRET".to_string()]
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> Result<Self, MeltDown> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, MeltDown> {
        Ok(toml::from_str(contents)?)
    }

    pub fn is_development(&self) -> bool {
        self.settings.environment == "dev"
    }
}

/// Everything a request needs, handed to Rocket as managed state.
pub struct AdminState {
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn RecordStore>,
    pub sessions: SessionService,
    pub dashboard: DashboardSettings,
    pub sign_in_url: Option<String>,
    pub environment: String,
}

impl AdminState {
    pub fn new(sessions: SessionService, store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        let auth = Arc::new(HostedAuth::new(sessions.clone(), Arc::clone(&store)));

        AdminState {
            auth,
            store,
            sessions,
            dashboard: config.dashboard.clone(),
            sign_in_url: config.auth.sign_in_url.clone(),
            environment: config.settings.environment.clone(),
        }
    }
}

fn load_config() -> Result<AppConfig, MeltDown> {
    if !Path::new(CONFIG_PATH).exists() {
        img_log!(Warning, format!("{} not found, running with default settings", CONFIG_PATH));
        return Ok(AppConfig::default());
    }

    img_log!(Debug, format!("Loading configuration from {}", CONFIG_PATH));
    AppConfig::load_from_file(CONFIG_PATH)
}

fn validate_required_env_vars(config: &AppConfig) -> Result<(), MeltDown> {
    let invalid_vars: Vec<&str> = config
        .required_env
        .variables
        .iter()
        .filter(|var| env::var(var.as_str()).map(|value| value.trim().is_empty()).unwrap_or(true))
        .map(String::as_str)
        .collect();

    if !invalid_vars.is_empty() {
        return Err(MeltDown::new(MeltType::EnvironmentError, format!("Environment vars {} are missing or empty", invalid_vars.join(", "))));
    }

    img_log!(Info, format!("All {} required environment variables are set", config.required_env.variables.len()));
    Ok(())
}

pub async fn bootstrap() -> Result<AdminState, MeltDown> {
    dotenv::dotenv().ok();

    let config = load_config()?;
    let _ = APP_CONFIG.set(config.clone());

    logger::setup_panic_hook();
    img_log!(Info, format!("Environment: {}", config.settings.environment));

    validate_required_env_vars(&config)?;

    if !config.session.secure_cookie && !config.is_development() {
        img_log!(Warning, "Session cookies are not marked Secure outside development");
    }

    let database_url = env::var("DATABASE_URL")?;
    img_log!(Debug, "Initializing database connection pool");
    db::init_connection_pool(&database_url, config.database.max_pool_size)?;

    let sessions = SessionService::from_env(config.session.clone())?;
    let store: Arc<dyn RecordStore> = Arc::new(PgStore);

    img_log!(Info, "Bootstrap complete");
    Ok(AdminState::new(sessions, store, &config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::parse("").unwrap();

        assert_eq!(config.settings.environment, "prod");
        assert_eq!(config.session.cookie_name, "access_token");
        assert_eq!(config.dashboard.recent_limit, 5);
        assert_eq!(config.logging.min_level, LogLevel::Info);
        assert_eq!(config.required_env.variables, vec!["DATABASE_URL", "JWT_SECRET"]);
        assert!(config.session.secure_cookie);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = AppConfig::parse(
            r#"
            [settings]
            environment = "dev"

            [session]
            cookie_name = "sb-access-token"
            refresh_threshold_mins = 15

            [logging]
            min_level = "warn"
            stdout = false
            "#,
        )
        .unwrap();

        assert!(config.is_development());
        assert_eq!(config.session.cookie_name, "sb-access-token");
        assert_eq!(config.session.refresh_threshold_mins, 15);
        assert_eq!(config.session.session_ttl_mins, 60);
        assert_eq!(config.logging.min_level, LogLevel::Warning);
        assert!(!config.logging.stdout);
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Imagery.toml");
        fs::write(&path, "[dashboard]\nrecent_limit = 3\n").unwrap();

        let config = AppConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.dashboard.recent_limit, 3);
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let error = AppConfig::parse("[session\ncookie_name = 1").unwrap_err();
        assert_eq!(error.melt_type, MeltType::ConfigurationError);
    }

    #[test]
    fn missing_required_variable_is_reported_by_name() {
        let config = AppConfig {
            required_env: RequiredEnv { variables: vec!["IMAGERY_TEST_SURELY_UNSET_VAR".to_string()] },
            ..AppConfig::default()
        };

        let error = validate_required_env_vars(&config).unwrap_err();
        assert_eq!(error.melt_type, MeltType::EnvironmentError);
        assert!(error.details.contains("IMAGERY_TEST_SURELY_UNSET_VAR"));
    }
}
