use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// "simulated" (default) or "crm".
    pub gateway_provider: String,
    pub crm_base_url: String,
    pub crm_api_token: String,
    pub gateway_failure_rate: f64,
    pub identity_latency_ms: u64,
    pub ticketing_latency_ms: u64,
    pub existing_complaint_rate: f64,
    /// Scripted pauses between bot messages. Disabled in tests.
    pub narration_delays: bool,
    pub session_ttl_minutes: i64,
    pub critical_keywords: Vec<String>,
    /// Origin of the widget page, for CORS. "*" allows any origin.
    pub allowed_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "alou.db".to_string()),
            gateway_provider: env::var("GATEWAY_PROVIDER")
                .unwrap_or_else(|_| "simulated".to_string()),
            crm_base_url: env::var("CRM_BASE_URL").unwrap_or_default(),
            crm_api_token: env::var("CRM_API_TOKEN").unwrap_or_default(),
            gateway_failure_rate: env::var("GATEWAY_FAILURE_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.1),
            identity_latency_ms: env::var("IDENTITY_LATENCY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1500),
            ticketing_latency_ms: env::var("TICKETING_LATENCY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
            existing_complaint_rate: env::var("EXISTING_COMPLAINT_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.3),
            narration_delays: env::var("NARRATION_DELAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            critical_keywords: env::var("CRITICAL_KEYWORDS")
                .ok()
                .map(|csv| {
                    csv.split(',')
                        .map(|k| k.trim().to_lowercase())
                        .filter(|k| !k.is_empty())
                        .collect()
                })
                .unwrap_or_else(default_critical_keywords),
            allowed_origin: env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        }
    }
}

pub fn default_critical_keywords() -> Vec<String> {
    [
        "anacom",
        "advogado",
        "cancelar",
        "tribunal",
        "urgente",
        "polícia",
        "processo",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}
