use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use nightcast_core::SessionConfig;
use nightcast_gamestream::client::{DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT};
use nightcast_gamestream::ClientConfig;
use nightcast_models::{AudioConfiguration, StreamConfiguration};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cli::StreamArgs;

const CERT_FILE: &str = "client.pem";
const KEY_FILE: &str = "key.pem";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub stream: StreamSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub address: String,
    /// Client id the host pairs against. Must stay stable across runs.
    #[serde(default = "generate_unique_id")]
    pub unique_id: String,
    /// Directory holding the paired client certificate and key.
    #[serde(default = "default_key_dir")]
    pub key_dir: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_https_port")]
    pub https_port: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            unique_id: generate_unique_id(),
            key_dir: default_key_dir(),
            http_port: default_http_port(),
            https_port: default_https_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default = "default_app")]
    pub app: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Kbps. Zero picks a rate from resolution and frame rate.
    #[serde(default)]
    pub bitrate: u32,
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,
    #[serde(default)]
    pub audio_configuration: AudioConfiguration,
    #[serde(default = "default_true")]
    pub sops: bool,
    #[serde(default)]
    pub local_audio: bool,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default)]
    pub unsupported: bool,
    #[serde(default)]
    pub remote: bool,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub audio_device: Option<String>,
    /// Where the fake platform writes the raw streams.
    #[serde(default)]
    pub dump_dir: Option<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            app: default_app(),
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            bitrate: 0,
            packet_size: default_packet_size(),
            audio_configuration: AudioConfiguration::default(),
            sops: true,
            local_audio: false,
            fullscreen: false,
            unsupported: false,
            remote: false,
            platform: default_platform(),
            audio_device: None,
            dump_dir: None,
        }
    }
}

impl Config {
    /// Read `path`, writing a commented template there first if it is missing.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content =
                fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
            toml::from_str(&content).with_context(|| format!("failed to parse {path}"))?
        } else {
            tracing::info!("Config file not found at '{}', generating defaults...", path);
            let config = Config::default();
            if let Some(parent) = Path::new(path).parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, generate_config_template(&config))?;
            tracing::info!("Generated default config at '{}'", path);
            config
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `NIGHTCAST_*` overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("NIGHTCAST_ADDRESS") {
            self.host.address = value;
        }
        if let Some(value) = var("NIGHTCAST_UNIQUE_ID") {
            self.host.unique_id = value;
        }
        if let Some(value) = var("NIGHTCAST_KEY_DIR") {
            self.host.key_dir = value;
        }
        if let Some(value) = var("NIGHTCAST_APP") {
            self.stream.app = value;
        }
        if let Some(value) = var("NIGHTCAST_PLATFORM") {
            self.stream.platform = value;
        }
        if let Some(value) = var("NIGHTCAST_BITRATE") {
            match value.parse::<u32>() {
                Ok(parsed) => self.stream.bitrate = parsed,
                Err(_) => tracing::warn!(
                    "Ignoring invalid NIGHTCAST_BITRATE value '{}'; expected kbps",
                    value
                ),
            }
        }
        if let Some(value) = var("NIGHTCAST_DUMP_DIR") {
            self.stream.dump_dir = Some(value);
        }
    }

    /// Client settings, with the paired identity when one is on disk.
    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            unique_id: self.host.unique_id.clone(),
            http_port: self.host.http_port,
            https_port: self.host.https_port,
            tls: true,
            identity_pem: load_identity(Path::new(&self.host.key_dir))?,
        })
    }
}

impl StreamSettings {
    /// Let command line flags win over the file.
    pub fn merge(&mut self, opts: &StreamArgs) {
        if let Some(app) = &opts.app {
            self.app = app.clone();
        }
        if let Some(width) = opts.width {
            self.width = width;
        }
        if let Some(height) = opts.height {
            self.height = height;
        }
        if let Some(fps) = opts.fps {
            self.fps = fps;
        }
        if let Some(bitrate) = opts.bitrate {
            self.bitrate = bitrate;
        }
        if let Some(platform) = &opts.platform {
            self.platform = platform.clone();
        }
        if let Some(device) = &opts.audio {
            self.audio_device = Some(device.clone());
        }
        self.sops &= !opts.nosops;
        self.local_audio |= opts.localaudio;
        self.fullscreen |= opts.fullscreen;
        self.unsupported |= opts.unsupported;
        self.remote |= opts.remote;
    }

    pub fn effective_bitrate(&self) -> u32 {
        if self.bitrate > 0 {
            self.bitrate
        } else {
            default_bitrate(self.width, self.height, self.fps)
        }
    }

    pub fn session(&self, debug_level: u8) -> SessionConfig {
        let mut stream =
            StreamConfiguration::new(self.width, self.height, self.fps, self.effective_bitrate());
        stream.packet_size = self.packet_size;
        stream.audio_configuration = self.audio_configuration;
        stream.streaming_remotely = self.remote;

        SessionConfig {
            app: self.app.clone(),
            stream,
            sops: self.sops,
            local_audio: self.local_audio,
            audio_device: self.audio_device.clone(),
            fullscreen: self.fullscreen,
            debug_level,
        }
    }
}

/// Bitrate for a mode when none is configured.
fn default_bitrate(width: u32, height: u32, fps: u32) -> u32 {
    let pixels = u64::from(width) * u64::from(height);
    let base = if pixels <= 1280 * 720 {
        5_000
    } else if pixels <= 1920 * 1080 {
        10_000
    } else {
        20_000
    };
    if fps >= 60 {
        base * 2
    } else {
        base
    }
}

fn load_identity(dir: &Path) -> Result<Option<Vec<u8>>> {
    let cert = dir.join(CERT_FILE);
    let key = dir.join(KEY_FILE);
    match (cert.exists(), key.exists()) {
        (true, true) => {
            let mut pem = fs::read(&cert).with_context(|| format!("failed to read {}", cert.display()))?;
            pem.push(b'\n');
            pem.extend(fs::read(&key).with_context(|| format!("failed to read {}", key.display()))?);
            Ok(Some(pem))
        }
        (false, false) => {
            tracing::debug!(dir = %dir.display(), "no client identity");
            Ok(None)
        }
        _ => {
            tracing::warn!(
                dir = %dir.display(),
                "client identity is incomplete, need both {} and {}",
                CERT_FILE,
                KEY_FILE
            );
            Ok(None)
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Random 16-digit uppercase hex id.
fn generate_unique_id() -> String {
    let mut rng = rand::thread_rng();
    (0..16)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect::<String>()
        .to_ascii_uppercase()
}

fn default_key_dir() -> String {
    "keys".into()
}
fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}
fn default_https_port() -> u16 {
    DEFAULT_HTTPS_PORT
}
fn default_app() -> String {
    "Steam".into()
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_fps() -> u32 {
    60
}
fn default_packet_size() -> u32 {
    1024
}
fn default_platform() -> String {
    "auto".into()
}
fn default_true() -> bool {
    true
}

fn generate_config_template(config: &Config) -> String {
    format!(
        r#"# Nightcast Configuration
# Generated automatically on first run. Edit as needed.

[host]
# Address of the GameStream host (or pass --address).
address = "{address}"
# Identifies this client to the host. Keep it once paired.
unique_id = "{unique_id}"
# Holds client.pem and key.pem from pairing.
key_dir = "{key_dir}"
http_port = {http_port}
https_port = {https_port}

[stream]
app = "{app}"
width = {width}
height = {height}
fps = {fps}
# Kbps. 0 picks a rate from resolution and frame rate.
bitrate = {bitrate}
packet_size = {packet_size}
# "stereo", "surround51" or "surround71"
audio_configuration = "stereo"
sops = {sops}
local_audio = {local_audio}
fullscreen = {fullscreen}
unsupported = {unsupported}
remote = {remote}
# "fake", "null" or "auto"
platform = "{platform}"
# audio_device = "hw:0"
# dump_dir = "dump"
"#,
        address = config.host.address,
        unique_id = config.host.unique_id,
        key_dir = config.host.key_dir,
        http_port = config.host.http_port,
        https_port = config.host.https_port,
        app = config.stream.app,
        width = config.stream.width,
        height = config.stream.height,
        fps = config.stream.fps,
        bitrate = config.stream.bitrate,
        packet_size = config.stream.packet_size,
        sops = config.stream.sops,
        local_audio = config.stream.local_audio,
        fullscreen = config.stream.fullscreen,
        unsupported = config.stream.unsupported,
        remote = config.stream.remote,
        platform = config.stream.platform,
    )
}
