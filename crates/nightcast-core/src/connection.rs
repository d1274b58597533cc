//! Application lookup and session start/stop.

use std::sync::Arc;

use nightcast_gamestream::HostCatalog;
use nightcast_models::{AppInfo, Platform, ServerData, StreamConfiguration};
use tracing::{debug, info, warn};

use crate::context::SessionContext;
use crate::engine::{ConnectionRequest, DisplayFlags, StreamingEngine};
use crate::error::SessionError;
use crate::listener::ConnectionListener;
use crate::platform::PlatformRuntime;

/// Highest number of input slots the host tracks.
const MAX_GAMEPADS: usize = 4;

/// Caller-supplied settings for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub app: String,
    pub stream: StreamConfiguration,
    /// Let the host optimize its game settings for the stream.
    pub sops: bool,
    /// Keep playing audio on the host as well.
    pub local_audio: bool,
    pub audio_device: Option<String>,
    pub fullscreen: bool,
    pub debug_level: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app: "Steam".to_string(),
            stream: StreamConfiguration::default(),
            sops: true,
            local_audio: false,
            audio_device: None,
            fullscreen: true,
            debug_level: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Resolving,
    Streaming,
    Stopped,
}

/// Fail unless the host has been paired with this client.
pub fn pair_check(server: &ServerData) -> Result<(), SessionError> {
    if server.paired {
        Ok(())
    } else {
        Err(SessionError::NotPaired)
    }
}

/// Fetch the host's app catalog. Not retried.
pub async fn list_apps<C: HostCatalog>(
    catalog: &C,
    server: &ServerData,
) -> Result<Vec<AppInfo>, SessionError> {
    catalog.list_apps(server).await.map_err(SessionError::AppList)
}

/// First app in catalog order whose name matches exactly.
pub fn find_app_id(apps: &[AppInfo], name: &str) -> Option<i32> {
    apps.iter().find(|app| app.name == name).map(|app| app.id)
}

/// Resolve an app name to its id. A failed catalog query resolves nothing.
pub async fn resolve_app_id<C: HostCatalog>(
    catalog: &C,
    server: &ServerData,
    name: &str,
) -> Option<i32> {
    match list_apps(catalog, server).await {
        Ok(apps) => find_app_id(&apps, name),
        Err(err) => {
            warn!(error = ?err, "Can't get app list");
            None
        }
    }
}

/// One bit per active input device, lowest slots first, at most four.
pub fn gamepad_mask(count: usize) -> u32 {
    (0..count.min(MAX_GAMEPADS)).fold(0, |mask, _| (mask << 1) | 1)
}

/// Drives one streaming session against a host.
pub struct Connection<E, P> {
    target: Platform,
    engine: E,
    platform: P,
    listener: Arc<dyn ConnectionListener>,
    context: Arc<SessionContext>,
    input_devices: usize,
    state: SessionState,
}

impl<E: StreamingEngine, P: PlatformRuntime> Connection<E, P> {
    pub fn new(
        target: Platform,
        engine: E,
        platform: P,
        listener: Arc<dyn ConnectionListener>,
        context: Arc<SessionContext>,
    ) -> Self {
        Self {
            target,
            engine,
            platform,
            listener,
            context,
            input_devices: 0,
            state: SessionState::Idle,
        }
    }

    /// Number of active input devices announced to the host at launch.
    pub fn set_input_devices(&mut self, count: usize) {
        self.input_devices = count;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Launch `config.app` on the host and hand the stream to the engine.
    ///
    /// The caller is expected to have run [`pair_check`]. Every error is fatal
    /// for the session; the controller returns to `Idle` and nothing is retried.
    pub async fn start<C: HostCatalog>(
        &mut self,
        catalog: &C,
        server: &ServerData,
        config: &SessionConfig,
    ) -> Result<(), SessionError> {
        if self.state == SessionState::Streaming {
            return Err(SessionError::AlreadyStreaming);
        }

        self.state = SessionState::Resolving;
        let result = self.launch(catalog, server, config).await;
        self.state = match result {
            Ok(()) => SessionState::Streaming,
            Err(_) => SessionState::Idle,
        };
        result
    }

    async fn launch<C: HostCatalog>(
        &mut self,
        catalog: &C,
        server: &ServerData,
        config: &SessionConfig,
    ) -> Result<(), SessionError> {
        let app_id = resolve_app_id(catalog, server, &config.app)
            .await
            .ok_or_else(|| SessionError::AppNotFound(config.app.clone()))?;
        debug!(app = %config.app, app_id, "resolved app");

        let mask = gamepad_mask(self.input_devices);
        catalog
            .start_app(
                server,
                &config.stream,
                app_id,
                config.sops,
                config.local_audio,
                mask,
            )
            .await?;

        let mut display_flags = DisplayFlags::empty();
        if config.fullscreen {
            display_flags |= DisplayFlags::FULLSCREEN;
        }

        if config.debug_level > 0 {
            let stream = &config.stream;
            info!(
                "Stream {} x {}, {} fps, {} kbps",
                stream.width, stream.height, stream.fps, stream.bitrate
            );
            self.context.set_debug(true);
        }

        self.platform.start(self.target)?;
        let audio_device = config.audio_device.as_deref();
        let request = ConnectionRequest {
            server_info: &server.server_info,
            stream: &config.stream,
            listener: Arc::clone(&self.listener),
            video: self.platform.video_sink(self.target),
            audio: self.platform.audio_sink(self.target, audio_device),
            display_flags,
            audio_device,
        };
        if let Err(err) = self.engine.start_connection(request) {
            warn!(error = %err, platform = %self.target, "engine refused the connection, releasing platform");
            self.platform.stop(self.target);
            return Err(err.into());
        }

        info!(app = %config.app, app_id, gamepad_mask = mask, "stream started");
        Ok(())
    }

    /// Stop the engine, then release the platform surfaces.
    ///
    /// Forwarded unconditionally; what a stop without a session means is up
    /// to the engine.
    pub fn stop(&mut self) {
        if self.state != SessionState::Streaming {
            debug!(state = ?self.state, "stopping without an active stream");
        }
        if !self.context.on_controller_thread() {
            warn!("stop called off the controller thread");
        }
        self.engine.stop_connection();
        self.platform.stop(self.target);
        self.state = SessionState::Stopped;
        info!("stream stopped");
    }
}
