//! HTTP proxy in front of the Leonardo image-generation API. Keeps the API key
//! server-side and turns the async job/poll protocol into simple endpoints.

mod error;
mod leonardo;
mod routes;

use std::net::SocketAddr;
use std::time::Duration;

use engine::poll::PollPolicy;
use serde::{Deserialize, Serialize};

pub use error::ProxyError;
pub use leonardo::{GeneratedImage, GenerationParams, GenerationStatus, LeonardoClient};
pub use routes::{AppState, router};

pub const API_KEY_ENV: &str = "LEONARDO_API_KEY";
pub const API_BASE_ENV: &str = "LEONARDO_API_BASE";
pub const ADDR_ENV: &str = "DARKSIDE_PROXY_ADDR";
pub const PORT_ENV: &str = "DARKSIDE_PROXY_PORT";
pub const POLL_ATTEMPTS_ENV: &str = "DARKSIDE_POLL_ATTEMPTS";
pub const POLL_INTERVAL_ENV: &str = "DARKSIDE_POLL_INTERVAL_MS";
pub const CALL_DELAY_ENV: &str = "DARKSIDE_CALL_DELAY_MS";

pub const DEFAULT_API_BASE: &str = "https://cloud.leonardo.ai/api/rest/v1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MODEL_ID: &str = "6bef9f1b-29cb-40c7-b9df-32b51c1f67d3";
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "blurry, low quality, distorted, extra limbs, watermark, text, logo";

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub addr: SocketAddr,
    pub poll: PollPolicy,
    /// Pause between a create call and the first status call.
    pub call_delay: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            poll: PollPolicy::new(30, Duration::from_secs(2)),
            call_delay: Duration::from_millis(500),
        }
    }
}

impl ProxyConfig {
    pub fn from_env_with<F>(mut get_env: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut read = |key: &str| get_env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = read(API_KEY_ENV);
        let api_base = read(API_BASE_ENV).unwrap_or(defaults.api_base);
        let addr = resolve_addr(&mut read);
        let max_attempts = read(POLL_ATTEMPTS_ENV)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.poll.max_attempts);
        let interval = read(POLL_INTERVAL_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.poll.interval, Duration::from_millis);
        let call_delay = read(CALL_DELAY_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.call_delay, Duration::from_millis);

        Self {
            api_key,
            api_base,
            addr,
            poll: PollPolicy::new(max_attempts, interval),
            call_delay,
        }
    }
}

fn resolve_addr<F>(read: &mut F) -> SocketAddr
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(addr) = read(ADDR_ENV).and_then(|v| v.parse().ok()) {
        return addr;
    }
    let port = read(PORT_ENV)
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Body of `POST /api/leonardo/generate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub model_id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub num_images: Option<u32>,
    pub guidance: Option<f32>,
}

/// Body of `POST /api/players/generate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPortraitRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    pub jersey_number: Option<u32>,
    pub team: Option<String>,
}

/// Body of `POST /api/sprites/generate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteRequest {
    #[serde(default)]
    pub subject: String,
    pub pose: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    pub status: String,
    pub complete: bool,
    pub images: Vec<GeneratedImage>,
}

impl StatusResponse {
    pub fn from_status(generation_id: Option<String>, status: GenerationStatus) -> Self {
        Self {
            success: true,
            generation_id,
            complete: status.is_complete(),
            status: status.status,
            images: status.images,
        }
    }
}
