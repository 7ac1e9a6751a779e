use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub session_ttl: Duration,
    pub max_sessions: usize,
    pub sweep_interval: Duration,
    pub max_upload_bytes: usize,
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            session_ttl: Duration::from_secs(60 * 60),
            max_sessions: 256,
            sweep_interval: Duration::from_secs(60),
            max_upload_bytes: 25 * 1024 * 1024,
            static_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let listen_addr = env_or("APP_LISTEN_ADDR", defaults.listen_addr)?;
        let session_ttl = env_or("SESSION_TTL_SECS", defaults.session_ttl.as_secs())
            .map(Duration::from_secs)?;
        let max_sessions: usize = env_or("MAX_SESSIONS", defaults.max_sessions)?;
        if max_sessions == 0 {
            return Err(AppError::Config("MAX_SESSIONS must be at least 1".into()));
        }
        let sweep_interval = env_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs())
            .map(Duration::from_secs)?;
        if sweep_interval.is_zero() {
            return Err(AppError::Config(
                "SWEEP_INTERVAL_SECS must be at least 1".into(),
            ));
        }
        let max_upload_bytes = env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?;

        let static_dir = env::var("STATIC_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            listen_addr,
            session_ttl,
            max_sessions,
            sweep_interval,
            max_upload_bytes,
            static_dir,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
