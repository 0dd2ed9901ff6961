use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL persisted into stored file links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,
    #[serde(default = "default_token_expire")]
    pub token_expire_days: u64,
    #[serde(default = "default_verify_expire")]
    pub verify_expire_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_local_path")]
    pub local_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// When set, registration responses carry the rendered mail instead of sending it.
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// API key required by the admin registration endpoint.
    #[serde(default)]
    pub key: String,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3333
}

fn default_base_url() -> String {
    "http://localhost:3333".to_string()
}

fn default_db_path() -> String {
    "data/medmarket.db".to_string()
}

fn default_jwt_secret() -> String {
    // Replaced by a generated, persisted secret on first start
    "change-me".to_string()
}

fn default_token_expire() -> u64 {
    7 // days
}

fn default_verify_expire() -> u64 {
    24 // hours
}

fn default_local_path() -> String {
    "data/uploads".to_string()
}

fn default_mail_from() -> String {
    "no-reply@medmarket.local".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            token_expire_days: default_token_expire(),
            verify_expire_hours: default_verify_expire(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: default_local_path(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: default_mail_from(),
            preview: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            storage: StorageConfig::default(),
            mail: MailConfig::default(),
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.ensure_directories()?;
        config.ensure_jwt_secret()?;
        Ok(config)
    }

    /// Ensure JWT secret is secure and persisted
    fn ensure_jwt_secret(&mut self) -> anyhow::Result<()> {
        if self.jwt.secret == default_jwt_secret() || self.jwt.secret.is_empty() {
            let secret_path = Path::new("data/.jwt_secret");

            if secret_path.exists() {
                let secret = fs::read_to_string(secret_path)?;
                self.jwt.secret = secret.trim().to_string();
                tracing::info!("Loaded persisted JWT secret from data/.jwt_secret");
            } else {
                let secret: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(48)
                    .map(char::from)
                    .collect();

                if let Some(parent) = secret_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::write(secret_path, &secret)?;
                self.jwt.secret = secret;
                tracing::info!("Generated and persisted new JWT secret to data/.jwt_secret");
            }
        }
        Ok(())
    }

    /// Load configuration from config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["config.toml", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: MM_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(val) = env::var("MM_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("MM_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = env::var("MM_CONF_SERVER_BASE_URL") {
            self.server.base_url = val;
        }

        // Database overrides
        if let Ok(val) = env::var("MM_CONF_DATABASE_PATH") {
            self.database.path = val;
        }

        // JWT overrides
        if let Ok(val) = env::var("MM_CONF_JWT_SECRET") {
            self.jwt.secret = val;
        }
        if let Ok(val) = env::var("MM_CONF_JWT_TOKEN_EXPIRE_DAYS") {
            if let Ok(days) = val.parse() {
                self.jwt.token_expire_days = days;
            }
        }
        if let Ok(val) = env::var("MM_CONF_JWT_VERIFY_EXPIRE_HOURS") {
            if let Ok(hours) = val.parse() {
                self.jwt.verify_expire_hours = hours;
            }
        }

        // Storage overrides
        if let Ok(val) = env::var("MM_CONF_STORAGE_LOCAL_PATH") {
            self.storage.local_path = val;
        }

        // Mail overrides
        if let Ok(val) = env::var("MM_CONF_MAIL_FROM") {
            self.mail.from = val;
        }
        if let Ok(val) = env::var("MM_CONF_MAIL_PREVIEW") {
            if let Ok(v) = val.parse() {
                self.mail.preview = v;
            }
        }

        // App overrides
        if let Ok(val) = env::var("MM_CONF_APP_KEY") {
            self.app.key = val;
        }
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.storage.local_path)?;

        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn public_base_url(&self) -> &str {
        self.server.base_url.trim_end_matches('/')
    }
}
