use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub ws_url: Url,
    pub token: Option<String>,
    pub page_size: u32,
    pub media_cache_dir: PathBuf,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Configuration with defaults for everything but the API base URL.
    /// The WebSocket URL is derived from it.
    pub fn new(api_url: &str) -> Result<Self, String> {
        let api_url = parse_api_url(api_url)?;
        let ws_url = derive_ws_url(&api_url)?;
        Ok(Self {
            api_url,
            ws_url,
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            media_cache_dir: default_media_cache_dir(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        })
    }

    /// Loads the configuration from the environment.
    /// Calls dotenv() first so a local `.env` file is honoured.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BREAKROOM_API_URL")
            .ok_or_else(|| "BREAKROOM_API_URL must be set in .env file".to_string())?;
        let mut config = Self::new(&api_url)?;

        if let Some(ws_url) = lookup("BREAKROOM_WS_URL") {
            let ws_url = Url::parse(&ws_url)
                .map_err(|e| format!("Invalid BREAKROOM_WS_URL: {e}"))?;
            if !matches!(ws_url.scheme(), "ws" | "wss") {
                return Err("Invalid BREAKROOM_WS_URL: scheme must be ws or wss".to_string());
            }
            config.ws_url = ws_url;
        }

        config.token = lookup("BREAKROOM_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(page_size) = lookup("BREAKROOM_PAGE_SIZE") {
            config.page_size = page_size
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| "Invalid BREAKROOM_PAGE_SIZE: must be a positive number".to_string())?;
        }

        if let Some(dir) = lookup("BREAKROOM_MEDIA_CACHE_DIR") {
            config.media_cache_dir = PathBuf::from(dir);
        }

        if let Some(timeout) = lookup("BREAKROOM_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = timeout.parse::<u64>().map_err(|_| {
                "Invalid BREAKROOM_HTTP_TIMEOUT_SECS: must be a positive number".to_string()
            })?;
        }

        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Logs the configuration, hiding the token
    pub fn print_info(&self) {
        info!("Client configuration:");
        info!("  API URL: {}", self.api_url);
        info!("  WebSocket URL: {}", self.ws_url);
        info!("  Page size: {}", self.page_size);
        info!("  Media cache: {}", self.media_cache_dir.display());
        info!("  HTTP timeout: {}s", self.http_timeout_secs);
        info!(
            "  Token: {}",
            self.token.as_deref().map_or_else(|| "not set".to_string(), Self::mask_token)
        );
    }

    fn mask_token(token: &str) -> String {
        let visible: String = token.chars().take(4).collect();
        if token.chars().count() <= 8 {
            "***".to_string()
        } else {
            format!("{visible}***")
        }
    }
}

fn parse_api_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("Invalid BREAKROOM_API_URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("Invalid BREAKROOM_API_URL: scheme must be http or https".to_string());
    }
    Ok(url)
}

/// http://host:port/base -> ws://host:port/ws
fn derive_ws_url(api_url: &Url) -> Result<Url, String> {
    let mut ws_url = api_url.clone();
    let scheme = if api_url.scheme() == "https" { "wss" } else { "ws" };
    ws_url
        .set_scheme(scheme)
        .map_err(|_| "Unable to derive WebSocket URL from BREAKROOM_API_URL".to_string())?;
    ws_url.set_path("/ws");
    ws_url.set_query(None);
    Ok(ws_url)
}

fn default_media_cache_dir() -> PathBuf {
    env::temp_dir().join("breakroom-media")
}
