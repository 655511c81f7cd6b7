use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use url::Url;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub files_root: PathBuf,
    pub public_base_url: Url,
    pub cookie_secret: String,
    pub note_save_debounce: Duration,
    pub reminder_poll_interval: Duration,
    pub max_ticket_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tripboard.db?mode=rwc".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let files_root = env::var("FILES_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("files"));

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{listen_addr}/"))
            .parse::<Url>()
            .map_err(|err| AppError::Config(format!("invalid PUBLIC_BASE_URL: {err}")))?;

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-tripboard-cookie-secret".to_string());

        let note_save_debounce =
            Duration::from_millis(parse_var("NOTE_SAVE_DEBOUNCE_MS", 1_500)?);
        let reminder_poll_interval = Duration::from_secs(parse_var("REMINDER_POLL_SECS", 60)?);
        let max_ticket_bytes = parse_var("MAX_TICKET_BYTES", 20 * 1024 * 1024)?;

        Ok(Self {
            database_url,
            listen_addr,
            files_root,
            public_base_url,
            cookie_secret,
            note_save_debounce,
            reminder_poll_interval,
            max_ticket_bytes,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| AppError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(default),
    }
}
