pub mod app;
pub mod platform;
pub mod server;
pub mod stream;

pub use app::AppInfo;
pub use platform::{Platform, UnknownPlatform};
pub use server::{DisplayMode, ServerData, ServerInfo};
pub use stream::{AudioConfiguration, StreamConfiguration};
