pub mod connection;
pub mod context;
pub mod engine;
pub mod error;
pub mod headless;
pub mod listener;
pub mod platform;

pub use connection::{
    find_app_id, gamepad_mask, list_apps, pair_check, resolve_app_id, Connection, SessionConfig,
    SessionState,
};
pub use context::SessionContext;
pub use engine::{ConnectionRequest, DisplayFlags, EngineError, Stage, StreamingEngine};
pub use error::SessionError;
pub use headless::HeadlessEngine;
pub use listener::{ConnectionListener, ConsoleListener};
pub use platform::{AudioSink, PlatformError, PlatformRuntime, VideoSink};
