use serde::{Deserialize, Serialize};

use crate::models::{MergedView, Platform};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,

    /// Comma-separated platform names; empty means all.
    #[serde(default)]
    pub platforms: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoadMoreRequest {
    pub query: String,
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteThroughRequest {
    pub query: String,
    pub view: MergedView,
}

#[derive(Debug, Deserialize)]
pub struct MarkViewedRequest {
    pub query: String,
    pub displayed_index: usize,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database: bool,
    pub configured_platforms: Vec<Platform>,
    pub cache_ttl_hours: u32,
}
