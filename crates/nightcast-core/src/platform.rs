//! Output surfaces for decoded media.

use nightcast_models::{AudioConfiguration, Platform};
use thiserror::Error;

use crate::engine::DisplayFlags;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform {0} is not available")]
    Unavailable(Platform),
    #[error("sink is not initialized")]
    NotInitialized,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait VideoSink: Send {
    fn setup(
        &mut self,
        width: u32,
        height: u32,
        fps: u32,
        flags: DisplayFlags,
    ) -> Result<(), PlatformError>;

    /// One complete frame of the elementary stream.
    fn submit_decode_unit(&mut self, data: &[u8]) -> Result<(), PlatformError>;

    fn cleanup(&mut self);
}

pub trait AudioSink: Send {
    fn init(
        &mut self,
        config: AudioConfiguration,
        device: Option<&str>,
    ) -> Result<(), PlatformError>;

    /// One encoded audio packet.
    fn decode_and_play_sample(&mut self, data: &[u8]);

    fn cleanup(&mut self);
}

/// Brings a platform's audio and video surfaces up and down.
pub trait PlatformRuntime: Send {
    fn start(&mut self, platform: Platform) -> Result<(), PlatformError>;

    fn stop(&mut self, platform: Platform);

    fn video_sink(&mut self, platform: Platform) -> Box<dyn VideoSink>;

    fn audio_sink(&mut self, platform: Platform, device: Option<&str>) -> Box<dyn AudioSink>;
}
