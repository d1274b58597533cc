// Sinks that dump the raw elementary streams instead of decoding them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use nightcast_core::{AudioSink, DisplayFlags, PlatformError, VideoSink};
use nightcast_models::AudioConfiguration;
use tracing::{debug, warn};

use crate::SinkStats;

pub const VIDEO_DUMP_FILE: &str = "fake.h264";
pub const AUDIO_DUMP_FILE: &str = "fake.opus";

pub struct FakeVideo {
    path: Option<PathBuf>,
    out: Option<BufWriter<File>>,
    stats: Arc<SinkStats>,
}

impl FakeVideo {
    pub fn new(path: Option<PathBuf>, stats: Arc<SinkStats>) -> Self {
        Self {
            path,
            out: None,
            stats,
        }
    }
}

impl VideoSink for FakeVideo {
    fn setup(
        &mut self,
        width: u32,
        height: u32,
        fps: u32,
        flags: DisplayFlags,
    ) -> Result<(), PlatformError> {
        debug!(width, height, fps, ?flags, "fake video setup");
        if let Some(path) = &self.path {
            self.out = Some(BufWriter::new(File::create(path)?));
        }
        Ok(())
    }

    fn submit_decode_unit(&mut self, data: &[u8]) -> Result<(), PlatformError> {
        if let Some(out) = &mut self.out {
            out.write_all(data)?;
        } else if self.path.is_some() {
            return Err(PlatformError::NotInitialized);
        }
        self.stats.record_video(data.len());
        Ok(())
    }

    fn cleanup(&mut self) {
        if let Some(mut out) = self.out.take() {
            if let Err(e) = out.flush() {
                warn!(error = %e, "failed to flush video dump");
            }
        }
    }
}

pub struct FakeAudio {
    path: Option<PathBuf>,
    out: Option<BufWriter<File>>,
    stats: Arc<SinkStats>,
}

impl FakeAudio {
    pub fn new(path: Option<PathBuf>, stats: Arc<SinkStats>) -> Self {
        Self {
            path,
            out: None,
            stats,
        }
    }
}

impl AudioSink for FakeAudio {
    fn init(
        &mut self,
        config: AudioConfiguration,
        device: Option<&str>,
    ) -> Result<(), PlatformError> {
        debug!(channels = config.channel_count(), ?device, "fake audio init");
        if let Some(path) = &self.path {
            self.out = Some(BufWriter::new(File::create(path)?));
        }
        Ok(())
    }

    // Playback cannot fail back into the engine, so write errors are only logged.
    fn decode_and_play_sample(&mut self, data: &[u8]) {
        if let Some(out) = &mut self.out {
            if let Err(e) = out.write_all(data) {
                warn!(error = %e, "failed to write audio dump");
                return;
            }
        }
        self.stats.record_audio(data.len());
    }

    fn cleanup(&mut self) {
        if let Some(mut out) = self.out.take() {
            if let Err(e) = out.flush() {
                warn!(error = %e, "failed to flush audio dump");
            }
        }
    }
}
