//! Seam to the streaming engine that owns the media transport.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use nightcast_models::{ServerInfo, StreamConfiguration};
use thiserror::Error;

use crate::listener::ConnectionListener;
use crate::platform::{AudioSink, VideoSink};

bitflags! {
    /// Flags handed to the video sink at setup.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DisplayFlags: u32 {
        const FULLSCREEN = 1 << 0;
    }
}

/// Setup stages an engine walks through before the stream is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PlatformInit,
    NameResolution,
    RtspHandshake,
    ControlStreamInit,
    VideoStreamInit,
    AudioStreamInit,
    InputStreamInit,
    ControlStreamStart,
    VideoStreamStart,
    AudioStreamStart,
    InputStreamStart,
}

impl Stage {
    pub const ALL: [Stage; 11] = [
        Stage::PlatformInit,
        Stage::NameResolution,
        Stage::RtspHandshake,
        Stage::ControlStreamInit,
        Stage::VideoStreamInit,
        Stage::AudioStreamInit,
        Stage::InputStreamInit,
        Stage::ControlStreamStart,
        Stage::VideoStreamStart,
        Stage::AudioStreamStart,
        Stage::InputStreamStart,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::PlatformInit => "platform initialization",
            Stage::NameResolution => "name resolution",
            Stage::RtspHandshake => "RTSP handshake",
            Stage::ControlStreamInit => "control stream initialization",
            Stage::VideoStreamInit => "video stream initialization",
            Stage::AudioStreamInit => "audio stream initialization",
            Stage::InputStreamInit => "input stream initialization",
            Stage::ControlStreamStart => "control stream establishment",
            Stage::VideoStreamStart => "video stream establishment",
            Stage::AudioStreamStart => "audio stream establishment",
            Stage::InputStreamStart => "input stream establishment",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{stage} failed with error {code}")]
    StageFailed { stage: Stage, code: i64 },
    #[error("engine already has an active connection")]
    AlreadyRunning,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the engine needs to bring a connection up.
pub struct ConnectionRequest<'a> {
    pub server_info: &'a ServerInfo,
    pub stream: &'a StreamConfiguration,
    pub listener: Arc<dyn ConnectionListener>,
    pub video: Box<dyn VideoSink>,
    pub audio: Box<dyn AudioSink>,
    pub display_flags: DisplayFlags,
    pub audio_device: Option<&'a str>,
}

/// A streaming engine.
///
/// `start_connection` blocks until the stream is established or has failed.
/// Afterwards the engine reports progress through the request's listener from
/// its own threads until `stop_connection` returns.
pub trait StreamingEngine: Send {
    fn start_connection(&mut self, request: ConnectionRequest<'_>) -> Result<(), EngineError>;

    fn stop_connection(&mut self);
}
