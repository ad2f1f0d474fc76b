use std::env;

use log::*;
use ppg_common::Secret;

const DEFAULT_PPG_HOST: &str = "127.0.0.1";
const DEFAULT_PPG_PORT: u16 = 8360;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 10;
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The bearer token that guards the admin API. Every route requires it except /health and
    /// the player WebSocket.
    pub api_token: Secret<String>,
    /// The bot token for the chat backend that vouchers are delivered through. When empty, the
    /// delivery worker is not started.
    pub telegram_token: Secret<String>,
    /// How often the delivery and reconciliation passes run.
    pub sync_interval_secs: u64,
    /// Per-call timeout for the chat backend.
    pub delivery_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PPG_HOST.to_string(),
            port: DEFAULT_PPG_PORT,
            database_url: String::default(),
            api_token: Secret::default(),
            telegram_token: Secret::default(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            delivery_timeout_secs: DEFAULT_DELIVERY_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PPG_HOST").ok().unwrap_or_else(|| DEFAULT_PPG_HOST.into());
        let port = env::var("PPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛 {s} is not a valid port for PPG_PORT. {e} Using the default, {DEFAULT_PPG_PORT}, instead."
                    );
                    DEFAULT_PPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PPG_PORT);
        let database_url = env::var("PPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛 PPG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let api_token = match env::var("PPG_API_TOKEN") {
            Ok(t) if !t.is_empty() => Secret::new(t),
            _ => {
                error!(
                    "🪛 PPG_API_TOKEN is not set. The admin API will reject every request until a token is \
                     configured."
                );
                Secret::default()
            },
        };
        let telegram_token = match env::var("PPG_TELEGRAM_TOKEN") {
            Ok(t) if !t.is_empty() => Secret::new(t),
            _ => {
                warn!("🪛 PPG_TELEGRAM_TOKEN is not set. Voucher delivery is disabled for this session.");
                Secret::default()
            },
        };
        let sync_interval_secs = read_secs("PPG_SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS);
        let delivery_timeout_secs = read_secs("PPG_DELIVERY_TIMEOUT_SECS", DEFAULT_DELIVERY_TIMEOUT_SECS);
        Self { host, port, database_url, api_token, telegram_token, sync_interval_secs, delivery_timeout_secs }
    }
}

fn read_secs(var: &str, default: u64) -> u64 {
    env::var(var)
        .map_err(|_| info!("🪛 {var} is not set. Using the default value of {default} s."))
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| warn!("🪛 Invalid configuration value for {var}. {e}"))
        })
        .ok()
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
