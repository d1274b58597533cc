use std::time::Duration;

use nightcast_models::{AppInfo, DisplayMode, ServerData, ServerInfo, StreamConfiguration};
use reqwest::{Client, Identity};
use tracing::{debug, info, warn};

use crate::launch::LaunchError;
use crate::xml::{self, Element};
use crate::{GameStreamError, HostCatalog};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Launching an app can take a while on the host side.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_HTTP_PORT: u16 = 47989;
pub const DEFAULT_HTTPS_PORT: u16 = 47984;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client id the host pairs against.
    pub unique_id: String,
    pub http_port: u16,
    pub https_port: u16,
    /// Use TLS on the secure port. Only disabled for local testing.
    pub tls: bool,
    /// PEM bundle (certificate + private key) presented to the host.
    pub identity_pem: Option<Vec<u8>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            unique_id: "0123456789ABCDEF".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
            tls: true,
            identity_pem: None,
        }
    }
}

/// HTTP client for a GameStream host.
///
/// Requests are never retried; callers decide what a failure means.
#[derive(Debug, Clone)]
pub struct GameStreamClient {
    http: Client,
    config: ClientConfig,
}

impl GameStreamClient {
    pub fn new(config: ClientConfig) -> Result<Self, GameStreamError> {
        let mut builder = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent("Nightcast/0.1")
            // Hosts present self-signed certificates.
            .danger_accept_invalid_certs(true);
        if let Some(pem) = &config.identity_pem {
            let identity = Identity::from_pem(pem)?;
            builder = builder.identity(identity);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn plain_base(&self, address: &str) -> String {
        format!("http://{}:{}", address, self.config.http_port)
    }

    fn secure_base(&self, address: &str) -> String {
        let scheme = if self.config.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, address, self.config.https_port)
    }

    /// Query parameters every request carries.
    fn identity_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("uniqueid", self.config.unique_id.clone()),
            ("uuid", uuid::Uuid::new_v4().simple().to_string()),
        ]
    }

    async fn get_xml(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<Element, GameStreamError> {
        let mut params = self.identity_query();
        params.extend_from_slice(query);
        debug!(url, "gamestream request");

        let resp = self
            .http
            .get(url)
            .query(&params)
            .timeout(timeout)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        // Hosts put the real reason in the XML status even on error responses.
        match xml::parse(&body) {
            Ok(root) => {
                if status.is_success() || root.attribute("status_code").is_some() {
                    root.check_status()?;
                }
                if !status.is_success() {
                    return Err(GameStreamError::Http(format!(
                        "request to {url} returned {status}"
                    )));
                }
                Ok(root)
            }
            Err(_) if !status.is_success() => Err(GameStreamError::Http(format!(
                "request to {url} returned {status}"
            ))),
            Err(err) => Err(err),
        }
    }

    /// Read the host's identity, pairing state and capabilities.
    ///
    /// Uses the secure port when a client identity is configured, since hosts
    /// only report `PairStatus` truthfully to an authenticated client.
    pub async fn fetch_server(&self, address: &str) -> Result<ServerData, GameStreamError> {
        let base = if self.config.identity_pem.is_some() {
            self.secure_base(address)
        } else {
            self.plain_base(address)
        };
        let root = self
            .get_xml(&format!("{base}/serverinfo"), &[], DEFAULT_TIMEOUT)
            .await?;
        let server = parse_server_info(&root, address)?;
        info!(
            host = %server.hostname,
            address,
            paired = server.paired,
            current_game = server.current_game,
            "fetched server info"
        );
        Ok(server)
    }

    /// Launch parameters shared by `/launch` and `/resume`.
    fn session_query(
        config: &StreamConfiguration,
        local_audio: bool,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("rikey", to_hex(&config.remote_input_aes_key)),
            ("rikeyid", config.remote_input_key_id().to_string()),
            ("localAudioPlayMode", u8::from(local_audio).to_string()),
            (
                "surroundAudioInfo",
                config.audio_configuration.surround_info().to_string(),
            ),
        ]
    }
}

impl HostCatalog for GameStreamClient {
    async fn list_apps(&self, server: &ServerData) -> Result<Vec<AppInfo>, GameStreamError> {
        let url = format!("{}/applist", self.secure_base(server.address()));
        let root = self.get_xml(&url, &[], DEFAULT_TIMEOUT).await?;
        let apps = parse_app_list(&root);
        debug!(count = apps.len(), "fetched app list");
        Ok(apps)
    }

    async fn start_app(
        &self,
        server: &ServerData,
        config: &StreamConfiguration,
        app_id: i32,
        sops: bool,
        local_audio: bool,
        gamepad_mask: u32,
    ) -> Result<(), LaunchError> {
        check_launch_mode(server, config)?;

        let base = self.secure_base(server.address());
        let mut query = Self::session_query(config, local_audio);
        let (url, result_tag) = if server.current_game == 0 {
            query.extend([
                ("appid", app_id.to_string()),
                (
                    "mode",
                    format!("{}x{}x{}", config.width, config.height, config.fps),
                ),
                ("additionalStates", "1".to_string()),
                ("sops", u8::from(sops).to_string()),
                ("remoteControllersBitmap", gamepad_mask.to_string()),
                ("gcmap", gamepad_mask.to_string()),
            ]);
            (format!("{base}/launch"), "gamesession")
        } else {
            if server.current_game != app_id {
                warn!(
                    running = server.current_game,
                    requested = app_id,
                    "host is already running another app, resuming it"
                );
            }
            (format!("{base}/resume"), "resume")
        };

        let root = self
            .get_xml(&url, &query, LAUNCH_TIMEOUT)
            .await
            .map_err(|e| LaunchError::Gamestream(launch_error_message(e)))?;
        match root.child_parse::<i64>(result_tag) {
            Some(session) if session != 0 => {
                info!(app_id, "host started session");
                Ok(())
            }
            _ => Err(LaunchError::Gamestream("Failed to start session".into())),
        }
    }

    async fn quit_app(&self, server: &ServerData) -> Result<(), GameStreamError> {
        let url = format!("{}/cancel", self.secure_base(server.address()));
        let root = self.get_xml(&url, &[], DEFAULT_TIMEOUT).await?;
        match root.child_parse::<i64>("cancel") {
            Some(0) | None => Err(GameStreamError::InvalidResponse(
                "host refused to quit the running app".into(),
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Reject stream modes the host cannot encode before asking it to launch.
pub fn check_launch_mode(
    server: &ServerData,
    config: &StreamConfiguration,
) -> Result<(), LaunchError> {
    if config.height >= 2160 && !server.supports_4k {
        return Err(LaunchError::NotSupported4K);
    }
    if !server.unsupported && !server.supports_mode(config.width, config.height, config.fps) {
        return Err(LaunchError::NotSupportedMode {
            width: config.width,
            height: config.height,
            fps: config.fps,
        });
    }
    Ok(())
}

fn launch_error_message(err: GameStreamError) -> String {
    match err {
        GameStreamError::Status { message, .. } => message,
        other => other.to_string(),
    }
}

pub(crate) fn parse_server_info(root: &Element, address: &str) -> Result<ServerData, GameStreamError> {
    let unique_id = root
        .child_text("uniqueid")
        .ok_or_else(|| GameStreamError::InvalidResponse("serverinfo without uniqueid".into()))?
        .to_string();
    let codec_mode: Option<u32> = root.child_parse("ServerCodecModeSupport");
    let codec_support = codec_mode.unwrap_or(0);
    let gfe_version = root.child_text("GfeVersion").unwrap_or_default();

    let modes = root
        .child("SupportedDisplayMode")
        .map(|list| {
            list.children_named("DisplayMode")
                .filter_map(|m| {
                    Some(DisplayMode {
                        width: m.child_parse("Width")?,
                        height: m.child_parse("Height")?,
                        refresh: m.child_parse("RefreshRate")?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ServerData {
        unique_id,
        hostname: root.child_text("hostname").unwrap_or_default().to_string(),
        paired: root.child_text("PairStatus").map(str::trim) == Some("1"),
        supports_4k: supports_4k(codec_mode, gfe_version),
        unsupported: false,
        current_game: root.child_parse("currentgame").unwrap_or(0),
        modes,
        server_info: ServerInfo {
            address: address.to_string(),
            app_version: root.child_text("appversion").unwrap_or_default().to_string(),
            gfe_version: gfe_version.to_string(),
            server_codec_mode_support: codec_support,
        },
    })
}

/// Hosts that report codec modes at all can encode 4K; older ones only
/// from GFE 2.8 on.
fn supports_4k(codec_mode: Option<u32>, gfe_version: &str) -> bool {
    if codec_mode.is_some() {
        return true;
    }
    let mut parts = gfe_version.trim().split('.').map(|p| p.parse::<u32>().ok());
    match (parts.next().flatten(), parts.next().flatten()) {
        (Some(major), minor) => (major, minor.unwrap_or(0)) >= (2, 8),
        (None, _) => false,
    }
}

pub(crate) fn parse_app_list(root: &Element) -> Vec<AppInfo> {
    root.children_named("App")
        .filter_map(|app| {
            let id = app.child_parse("ID")?;
            let name = app.child_text("AppTitle")?;
            Some(AppInfo::new(id, name))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
