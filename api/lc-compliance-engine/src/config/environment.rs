use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub api_host: String,
    pub api_port: u16,
    pub mongodb_url: Option<String>,
    pub mongodb_database: Option<String>,
    pub redis_url: Option<String>,
    pub match_tolerance_pct: f64,
    pub max_free_rechecks: u32,
    pub chain_append_max_attempts: u32,
    pub idempotency_ttl_seconds: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        load_dotenv_layers();

        Ok(Self {
            rust_env: read_var("RUST_ENV")?,
            api_host: read_var("API_HOST")?,
            api_port: read_var("API_PORT")?
                .parse::<u16>()
                .map_err(|e| format!("invalid API_PORT: {e}"))?,
            mongodb_url: read_optional_env("MONGODB_URL"),
            mongodb_database: read_optional_env("MONGODB_DATABASE"),
            redis_url: read_optional_env("REDIS_URL"),
            match_tolerance_pct: read_optional_f64("MATCH_TOLERANCE_PCT", 0.5)?,
            max_free_rechecks: read_optional_u32("MAX_FREE_RECHECKS", 2)?,
            chain_append_max_attempts: read_optional_u32("CHAIN_APPEND_MAX_ATTEMPTS", 5)?,
            idempotency_ttl_seconds: read_optional_i64("IDEMPOTENCY_TTL_SECONDS", 86400)?,
        })
    }
}

fn read_var(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("missing required env var: {key}"))
}

fn read_optional_i64(key: &str, default: i64) -> Result<i64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<i64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_u32(key: &str, default: u32) -> Result<u32, String> {
    match env::var(key) {
        Ok(v) => v.parse::<u32>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_f64(key: &str, default: f64) -> Result<f64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<f64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_layers() {
    for path in [".env", "../.env", "../../.env"] {
        let _ = dotenvy::from_path(path);
    }
}
