use serde::{Deserialize, Serialize};

/// Speaker layout requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioConfiguration {
    #[default]
    Stereo,
    Surround51,
    Surround71,
}

impl AudioConfiguration {
    pub fn channel_count(self) -> u32 {
        match self {
            AudioConfiguration::Stereo => 2,
            AudioConfiguration::Surround51 => 6,
            AudioConfiguration::Surround71 => 8,
        }
    }

    pub fn channel_mask(self) -> u32 {
        match self {
            AudioConfiguration::Stereo => 0x3,
            AudioConfiguration::Surround51 => 0x3F,
            AudioConfiguration::Surround71 => 0x63F,
        }
    }

    /// Value of the `surroundAudioInfo` launch parameter.
    pub fn surround_info(self) -> u32 {
        (self.channel_mask() << 16) | self.channel_count()
    }
}

/// Negotiated stream parameters. Read-only once a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfiguration {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Video bitrate in kbps.
    pub bitrate: u32,
    pub packet_size: u32,
    pub streaming_remotely: bool,
    pub audio_configuration: AudioConfiguration,
    pub supports_hevc: bool,
    pub remote_input_aes_key: [u8; 16],
    pub remote_input_aes_iv: [u8; 16],
}

impl StreamConfiguration {
    /// New configuration with fresh remote-input key material.
    pub fn new(width: u32, height: u32, fps: u32, bitrate: u32) -> Self {
        Self {
            width,
            height,
            fps,
            bitrate,
            packet_size: 1024,
            streaming_remotely: false,
            audio_configuration: AudioConfiguration::Stereo,
            supports_hevc: false,
            remote_input_aes_key: rand::random(),
            remote_input_aes_iv: rand::random(),
        }
    }

    /// Host-side id of the remote input key: the first four IV bytes, big endian.
    pub fn remote_input_key_id(&self) -> i32 {
        let iv = &self.remote_input_aes_iv;
        i32::from_be_bytes([iv[0], iv[1], iv[2], iv[3]])
    }
}

impl Default for StreamConfiguration {
    fn default() -> Self {
        Self::new(1280, 720, 60, 10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surround_info_packs_mask_and_count() {
        assert_eq!(AudioConfiguration::Stereo.surround_info(), 0x0003_0002);
        assert_eq!(AudioConfiguration::Surround51.surround_info(), 0x003F_0006);
    }

    #[test]
    fn key_material_differs_between_configurations() {
        let a = StreamConfiguration::default();
        let b = StreamConfiguration::default();
        assert_ne!(a.remote_input_aes_key, b.remote_input_aes_key);
    }

    #[test]
    fn key_id_reads_iv_prefix() {
        let mut config = StreamConfiguration::default();
        config.remote_input_aes_iv[..4].copy_from_slice(&[0, 0, 1, 2]);
        assert_eq!(config.remote_input_key_id(), 0x0102);
    }
}
