//! Audio and video surfaces selectable at runtime.
//!
//! `fake` writes the raw elementary streams to a dump directory (or just
//! counts them), `null` throws everything away. Neither decodes.

mod fake;
mod null;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nightcast_core::{AudioSink, PlatformError, PlatformRuntime, VideoSink};
use nightcast_models::Platform;
use tracing::{debug, info, warn};

pub use fake::{FakeAudio, FakeVideo, AUDIO_DUMP_FILE, VIDEO_DUMP_FILE};
pub use null::{NullAudio, NullVideo};

/// Byte and packet counters shared between a runtime and its sinks.
#[derive(Debug, Default)]
pub struct SinkStats {
    video_bytes: AtomicU64,
    video_frames: AtomicU64,
    audio_bytes: AtomicU64,
    audio_packets: AtomicU64,
}

impl SinkStats {
    pub(crate) fn record_video(&self, len: usize) {
        self.video_bytes.fetch_add(len as u64, Ordering::Relaxed);
        self.video_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_audio(&self, len: usize) {
        self.audio_bytes.fetch_add(len as u64, Ordering::Relaxed);
        self.audio_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn video_bytes(&self) -> u64 {
        self.video_bytes.load(Ordering::Relaxed)
    }

    pub fn video_frames(&self) -> u64 {
        self.video_frames.load(Ordering::Relaxed)
    }

    pub fn audio_bytes(&self) -> u64 {
        self.audio_bytes.load(Ordering::Relaxed)
    }

    pub fn audio_packets(&self) -> u64 {
        self.audio_packets.load(Ordering::Relaxed)
    }
}

/// Runtime for the built-in platforms.
#[derive(Debug, Default)]
pub struct DefaultPlatform {
    dump_dir: Option<PathBuf>,
    active: Option<Platform>,
    stats: Arc<SinkStats>,
}

impl DefaultPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `fake` sinks write their streams into `dir`.
    pub fn with_dump_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dump_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn active(&self) -> Option<Platform> {
        self.active
    }

    pub fn stats(&self) -> Arc<SinkStats> {
        Arc::clone(&self.stats)
    }
}

impl PlatformRuntime for DefaultPlatform {
    fn start(&mut self, platform: Platform) -> Result<(), PlatformError> {
        if let Some(current) = self.active {
            warn!(%current, requested = %platform, "platform already started");
            return Err(PlatformError::Unavailable(platform));
        }
        if let (Platform::Fake, Some(dir)) = (platform, &self.dump_dir) {
            std::fs::create_dir_all(dir)?;
            debug!(dir = %dir.display(), "dumping streams");
        }
        self.active = Some(platform);
        info!(%platform, "platform started");
        Ok(())
    }

    fn stop(&mut self, platform: Platform) {
        match self.active.take() {
            Some(current) if current == platform => {
                info!(
                    %platform,
                    video_bytes = self.stats.video_bytes(),
                    audio_bytes = self.stats.audio_bytes(),
                    "platform stopped"
                );
            }
            Some(current) => {
                warn!(%current, requested = %platform, "stopping a different platform");
            }
            None => debug!(%platform, "platform was not started"),
        }
    }

    fn video_sink(&mut self, platform: Platform) -> Box<dyn VideoSink> {
        match platform {
            Platform::Fake => Box::new(FakeVideo::new(
                self.dump_dir.as_ref().map(|d| d.join(VIDEO_DUMP_FILE)),
                self.stats(),
            )),
            Platform::Null => Box::new(NullVideo),
        }
    }

    fn audio_sink(&mut self, platform: Platform, device: Option<&str>) -> Box<dyn AudioSink> {
        if let Some(device) = device {
            debug!(%platform, device, "audio device is ignored by this platform");
        }
        match platform {
            Platform::Fake => Box::new(FakeAudio::new(
                self.dump_dir.as_ref().map(|d| d.join(AUDIO_DUMP_FILE)),
                self.stats(),
            )),
            Platform::Null => Box::new(NullAudio),
        }
    }
}
