use std::env;
use std::str::FromStr;
use tracing::warn;

/// Which backend holds practitioners, patients and appointments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StoreBackend::Supabase),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown scheduling store '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_base_url: String,
    pub currency: String,
    pub scheduling_store: StoreBackend,
    pub reservation_max_attempts: u32,
    pub reservation_retry_backoff_ms: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env_or_empty("SUPABASE_URL");
        let supabase_anon_key = env_or_empty("SUPABASE_ANON_PUBLIC_KEY");

        let default_store = if supabase_url.is_empty() || supabase_anon_key.is_empty() {
            StoreBackend::Memory
        } else {
            StoreBackend::Supabase
        };

        let scheduling_store = match env::var("SCHEDULING_STORE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to {:?}", e, default_store);
                default_store
            }),
            Err(_) => default_store,
        };

        let config = Self {
            supabase_url,
            supabase_anon_key,
            supabase_service_role_key: env_or_empty("SUPABASE_SERVICE_ROLE_KEY"),
            supabase_jwt_secret: env_or_empty("SUPABASE_JWT_SECRET"),
            razorpay_key_id: env_or_empty("RAZORPAY_KEY_ID"),
            razorpay_key_secret: env_or_empty("RAZORPAY_KEY_SECRET"),
            razorpay_base_url: env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            scheduling_store,
            reservation_max_attempts: parse_or("RESERVATION_MAX_ATTEMPTS", 3),
            reservation_retry_backoff_ms: parse_or("RESERVATION_RETRY_BACKOFF_MS", 100),
            port: parse_or("PORT", 4000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }
        if !config.is_payment_configured() {
            warn!("Razorpay credentials missing - payment endpoints will fail");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let store_ready = match self.scheduling_store {
            StoreBackend::Memory => true,
            StoreBackend::Supabase => {
                !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
            }
        };

        store_ready && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_payment_configured(&self) -> bool {
        !self.razorpay_key_id.is_empty() && !self.razorpay_key_secret.is_empty()
    }

    /// Key used for store calls; the service role bypasses row level security.
    pub fn store_api_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn env_or_empty(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn parse_or<T: FromStr + Copy + std::fmt::Debug>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
