use nightcast_core::{AudioSink, DisplayFlags, PlatformError, VideoSink};
use nightcast_models::AudioConfiguration;

pub struct NullVideo;

impl VideoSink for NullVideo {
    fn setup(
        &mut self,
        _width: u32,
        _height: u32,
        _fps: u32,
        _flags: DisplayFlags,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    fn submit_decode_unit(&mut self, _data: &[u8]) -> Result<(), PlatformError> {
        Ok(())
    }

    fn cleanup(&mut self) {}
}

pub struct NullAudio;

impl AudioSink for NullAudio {
    fn init(
        &mut self,
        _config: AudioConfiguration,
        _device: Option<&str>,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    fn decode_and_play_sample(&mut self, _data: &[u8]) {}

    fn cleanup(&mut self) {}
}
