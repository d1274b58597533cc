use serde::{Deserialize, Serialize};

/// Resolution and refresh rate a host says it can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh: u32,
}

/// Connection details the streaming engine needs to reach the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub address: String,
    pub app_version: String,
    pub gfe_version: String,
    pub server_codec_mode_support: u32,
}

/// A host this client has talked to.
///
/// Built by the host client from `/serverinfo`; the session layer only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerData {
    pub unique_id: String,
    pub hostname: String,
    pub paired: bool,
    pub supports_4k: bool,
    /// Accept stream modes the host does not advertise.
    pub unsupported: bool,
    /// Id of the app already running on the host, 0 when idle.
    pub current_game: i32,
    pub modes: Vec<DisplayMode>,
    pub server_info: ServerInfo,
}

impl ServerData {
    pub fn address(&self) -> &str {
        &self.server_info.address
    }

    /// Whether the host advertises exactly `width`x`height` at `fps`.
    pub fn supports_mode(&self, width: u32, height: u32, fps: u32) -> bool {
        self.modes
            .iter()
            .any(|m| m.width == width && m.height == height && m.refresh == fps)
    }
}
