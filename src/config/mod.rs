use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{GameError, Result};

pub const DEFAULT_ROOM_STORE_URL: &str = "https://game-room-api.fly.dev/api/rooms";
pub const DEFAULT_WORD_API_URL: &str = "https://random-word-api.herokuapp.com";
pub const DEFAULT_DICTIONARY_API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub words: WordsConfig,
    pub log_format: LogFormat,
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the room collection, e.g. `https://host/api/rooms`
    pub store_url: String,
    pub request_timeout_secs: u64,
    /// Overrides the per-game polling interval when set
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct WordsConfig {
    pub word_api_url: String,
    pub dictionary_api_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let request_timeout_secs =
            parse_var("REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT")?.unwrap_or(8080),
            },
            client: ClientConfig {
                store_url: env::var("ROOM_STORE_URL")
                    .unwrap_or_else(|_| DEFAULT_ROOM_STORE_URL.to_string()),
                request_timeout_secs,
                poll_interval_ms: parse_var("POLL_INTERVAL_MS")?,
            },
            words: WordsConfig {
                word_api_url: env::var("WORD_API_URL")
                    .unwrap_or_else(|_| DEFAULT_WORD_API_URL.to_string()),
                dictionary_api_url: env::var("DICTIONARY_API_URL")
                    .unwrap_or_else(|_| DEFAULT_DICTIONARY_API_URL.to_string()),
                request_timeout_secs,
            },
            log_format: match env::var("LOG_FORMAT") {
                Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    pub fn bind_address(&self) -> ([u8; 4], u16) {
        let ip_addr = self.parse_host_to_ipv4();
        (ip_addr.octets(), self.server.port)
    }

    fn parse_host_to_ipv4(&self) -> Ipv4Addr {
        if let Ok(addr) = self.server.host.parse::<IpAddr>() {
            match addr {
                IpAddr::V4(ipv4) => return ipv4,
                IpAddr::V6(_) => {
                    tracing::warn!(
                        host = %self.server.host,
                        "IPv6 address provided but only IPv4 supported, using 0.0.0.0"
                    );
                    return Ipv4Addr::UNSPECIFIED;
                }
            }
        }

        match self.server.host.as_str() {
            "localhost" => Ipv4Addr::LOCALHOST,
            "" | "0.0.0.0" => Ipv4Addr::UNSPECIFIED,
            _ => {
                tracing::warn!(
                    host = %self.server.host,
                    "Unable to parse host as IPv4, using 0.0.0.0"
                );
                Ipv4Addr::UNSPECIFIED
            }
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured polling interval, falling back to the game's own default
    pub fn poll_interval(&self, game_default: Duration) -> Duration {
        self.poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(game_default)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_ROOM_STORE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_ms: None,
        }
    }
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            word_api_url: DEFAULT_WORD_API_URL.to_string(),
            dictionary_api_url: DEFAULT_DICTIONARY_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Reads an optional variable, failing on values that do not parse
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GameError::InvalidConfiguration(format!("{}={}", name, raw))),
        _ => Ok(None),
    }
}
