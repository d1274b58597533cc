use nightcast_gamestream::{GameStreamError, LaunchError};
use thiserror::Error;

use crate::engine::EngineError;
use crate::platform::PlatformError;

/// Fatal session failures. The messages are the user-facing diagnostics.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("You must pair with the PC first")]
    NotPaired,
    #[error("Can't get app list")]
    AppList(#[source] GameStreamError),
    #[error("Can't find app {0}")]
    AppNotFound(String),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("failed to start connection: {0}")]
    Engine(#[from] EngineError),
    #[error("a session is already active")]
    AlreadyStreaming,
}
