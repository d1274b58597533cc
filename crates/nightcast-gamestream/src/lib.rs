//! Client for the GameStream host API.
//!
//! Hosts answer plain HTTP on one port (`/serverinfo`) and HTTPS with a
//! pinned client certificate on another (`/applist`, `/launch`, `/resume`,
//! `/cancel`). Every response is a small XML document whose root carries a
//! `status_code` attribute.

pub mod client;
pub mod launch;
pub mod xml;

use std::future::Future;

use nightcast_models::{AppInfo, ServerData, StreamConfiguration};

pub use client::{ClientConfig, GameStreamClient};
pub use launch::{LaunchError, GS_ERROR, GS_NOT_SUPPORTED_4K, GS_NOT_SUPPORTED_MODE};

#[derive(Debug, thiserror::Error)]
pub enum GameStreamError {
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("host returned status {code}: {message}")]
    Status { code: u32, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GameStreamError {
    fn from(err: reqwest::Error) -> Self {
        GameStreamError::Http(err.to_string())
    }
}

/// Operations a paired host exposes to the session layer.
pub trait HostCatalog {
    /// Fetch the host's launchable apps in the order the host reports them.
    fn list_apps(
        &self,
        server: &ServerData,
    ) -> impl Future<Output = Result<Vec<AppInfo>, GameStreamError>> + Send;

    /// Ask the host to launch (or resume) `app_id` with the given stream parameters.
    fn start_app(
        &self,
        server: &ServerData,
        config: &StreamConfiguration,
        app_id: i32,
        sops: bool,
        local_audio: bool,
        gamepad_mask: u32,
    ) -> impl Future<Output = Result<(), LaunchError>> + Send;

    /// Ask the host to quit whatever app it is running.
    fn quit_app(&self, server: &ServerData)
        -> impl Future<Output = Result<(), GameStreamError>> + Send;
}
