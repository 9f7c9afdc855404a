use std::env;

use rust_decimal::Decimal;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub dispatch_queue_size: usize,
    pub event_buffer_size: usize,
    /// Fraction of the surged subtotal retained as the platform service fee.
    pub service_fee_rate: Decimal,
    /// Fraction of (total - service fee) retained as platform commission.
    pub commission_rate: Decimal,
    pub search_radius_km: f64,
    pub dispatch_max_attempts: u32,
    pub dispatch_retry_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dispatch_queue_size: parse_or_default("DISPATCH_QUEUE_SIZE", 1024)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            service_fee_rate: parse_or_default("SERVICE_FEE_RATE", Decimal::new(10, 2))?,
            commission_rate: parse_or_default("COMMISSION_RATE", Decimal::new(20, 2))?,
            search_radius_km: parse_or_default("SEARCH_RADIUS_KM", 30.0)?,
            dispatch_max_attempts: parse_or_default("DISPATCH_MAX_ATTEMPTS", 5)?,
            dispatch_retry_ms: parse_or_default("DISPATCH_RETRY_MS", 250)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
