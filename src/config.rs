use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,

    /// Primary tier. Absent or empty means the tier is unconfigured, which
    /// is a routing signal for the fallback chain, not an error.
    pub database_url: Option<String>,

    /// Secondary tier; both values must be present for the tier to count as
    /// configured.
    pub firestore_project_id: Option<String>,
    pub firestore_api_key: Option<String>,

    /// Name stamped as director signature on approval.
    pub director_name: String,

    /// Artificial latency before local seed data is adopted.
    pub local_seed_delay_ms: u64,

    // Rate limiting
    pub rate_submit_per_min: u32,
    pub rate_general_per_min: u32,

    pub api_prefix: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: non_empty(env::var("DATABASE_URL").ok()),
            firestore_project_id: non_empty(env::var("FIRESTORE_PROJECT_ID").ok()),
            firestore_api_key: non_empty(env::var("FIRESTORE_API_KEY").ok()),
            director_name: env::var("DIRECTOR_NAME").unwrap_or_else(|_| "Director".to_string()),
            local_seed_delay_ms: env::var("LOCAL_SEED_DELAY_MS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap(),
            rate_submit_per_min: env::var("RATE_SUBMIT_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_general_per_min: env::var("RATE_GENERAL_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}
