use nightcast_models::StreamConfiguration;

pub const GS_NOT_SUPPORTED_4K: i32 = -6;
pub const GS_NOT_SUPPORTED_MODE: i32 = -8;
pub const GS_ERROR: i32 = -9;

/// Why a host refused to start a session.
///
/// The display strings are what the user sees before the client exits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("Server doesn't support 4K")]
    NotSupported4K,
    #[error("Server doesn't support {width}x{height} ({fps} fps) or try --unsupported option")]
    NotSupportedMode { width: u32, height: u32, fps: u32 },
    #[error("Gamestream error: {0}")]
    Gamestream(String),
    #[error("Errorcode starting app: {0}")]
    Code(i32),
}

impl LaunchError {
    /// Map a negative start status to its error. Non-negative statuses are success.
    ///
    /// `last_error` is the host client's own message for [`GS_ERROR`].
    pub fn from_code(code: i32, config: &StreamConfiguration, last_error: &str) -> Option<Self> {
        match code {
            c if c >= 0 => None,
            GS_NOT_SUPPORTED_4K => Some(LaunchError::NotSupported4K),
            GS_NOT_SUPPORTED_MODE => Some(LaunchError::NotSupportedMode {
                width: config.width,
                height: config.height,
                fps: config.fps,
            }),
            GS_ERROR => Some(LaunchError::Gamestream(last_error.to_string())),
            other => Some(LaunchError::Code(other)),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            LaunchError::NotSupported4K => GS_NOT_SUPPORTED_4K,
            LaunchError::NotSupportedMode { .. } => GS_NOT_SUPPORTED_MODE,
            LaunchError::Gamestream(_) => GS_ERROR,
            LaunchError::Code(code) => *code,
        }
    }
}
