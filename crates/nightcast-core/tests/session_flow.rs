use std::fmt;
use std::sync::{Arc, Mutex};

use nightcast_core::{
    AudioSink, Connection, ConnectionListener, ConnectionRequest, DisplayFlags, EngineError,
    PlatformError, PlatformRuntime, SessionConfig, SessionContext, SessionError, SessionState,
    Stage, StreamingEngine, VideoSink,
};
use nightcast_gamestream::{
    GameStreamError, HostCatalog, LaunchError, GS_ERROR, GS_NOT_SUPPORTED_4K,
    GS_NOT_SUPPORTED_MODE,
};
use nightcast_models::{AppInfo, Platform, ServerData, StreamConfiguration};

type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, call: impl Into<String>) {
    calls.lock().unwrap().push(call.into());
}

struct Catalog {
    apps: Option<Vec<AppInfo>>,
    launch_code: i32,
    last_error: &'static str,
    calls: Calls,
}

impl Catalog {
    fn new(calls: &Calls) -> Self {
        Self {
            apps: Some(vec![
                AppInfo::new(881448767, "Desktop"),
                AppInfo::new(1093255277, "Steam"),
            ]),
            launch_code: 0,
            last_error: "",
            calls: Arc::clone(calls),
        }
    }
}

impl HostCatalog for Catalog {
    async fn list_apps(&self, _server: &ServerData) -> Result<Vec<AppInfo>, GameStreamError> {
        record(&self.calls, "list_apps");
        self.apps
            .clone()
            .ok_or_else(|| GameStreamError::Http("connection refused".into()))
    }

    async fn start_app(
        &self,
        _server: &ServerData,
        config: &StreamConfiguration,
        app_id: i32,
        sops: bool,
        local_audio: bool,
        gamepad_mask: u32,
    ) -> Result<(), LaunchError> {
        record(
            &self.calls,
            format!("start_app {app_id} sops={sops} local_audio={local_audio} mask={gamepad_mask}"),
        );
        match LaunchError::from_code(self.launch_code, config, self.last_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn quit_app(&self, _server: &ServerData) -> Result<(), GameStreamError> {
        record(&self.calls, "quit_app");
        Ok(())
    }
}

struct Engine {
    fail: bool,
    calls: Calls,
}

impl StreamingEngine for Engine {
    fn start_connection(&mut self, mut request: ConnectionRequest<'_>) -> Result<(), EngineError> {
        record(
            &self.calls,
            format!(
                "engine.start fullscreen={}",
                request.display_flags.contains(DisplayFlags::FULLSCREEN)
            ),
        );
        if self.fail {
            return Err(EngineError::StageFailed {
                stage: Stage::RtspHandshake,
                code: 5,
            });
        }
        request
            .video
            .setup(request.stream.width, request.stream.height, request.stream.fps, request.display_flags)
            .map_err(|_| EngineError::StageFailed {
                stage: Stage::VideoStreamInit,
                code: -1,
            })?;
        request.listener.connection_started();
        Ok(())
    }

    fn stop_connection(&mut self) {
        record(&self.calls, "engine.stop");
    }
}

struct NullVideo;

impl VideoSink for NullVideo {
    fn setup(&mut self, _: u32, _: u32, _: u32, _: DisplayFlags) -> Result<(), PlatformError> {
        Ok(())
    }

    fn submit_decode_unit(&mut self, _: &[u8]) -> Result<(), PlatformError> {
        Ok(())
    }

    fn cleanup(&mut self) {}
}

struct NullAudio;

impl AudioSink for NullAudio {
    fn init(
        &mut self,
        _: nightcast_models::AudioConfiguration,
        _: Option<&str>,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    fn decode_and_play_sample(&mut self, _: &[u8]) {}

    fn cleanup(&mut self) {}
}

struct Runtime {
    calls: Calls,
}

impl PlatformRuntime for Runtime {
    fn start(&mut self, platform: Platform) -> Result<(), PlatformError> {
        record(&self.calls, format!("platform.start {platform}"));
        Ok(())
    }

    fn stop(&mut self, platform: Platform) {
        record(&self.calls, format!("platform.stop {platform}"));
    }

    fn video_sink(&mut self, _: Platform) -> Box<dyn VideoSink> {
        Box::new(NullVideo)
    }

    fn audio_sink(&mut self, _: Platform, device: Option<&str>) -> Box<dyn AudioSink> {
        record(&self.calls, format!("audio_sink {}", device.unwrap_or("default")));
        Box::new(NullAudio)
    }
}

#[derive(Default)]
struct Listener {
    started: Mutex<u32>,
}

impl ConnectionListener for Listener {
    fn connection_started(&self) {
        *self.started.lock().unwrap() += 1;
    }

    fn connection_terminated(&self, _: i64) {}

    fn display_message(&self, _: &str) {}

    fn display_transient_message(&self, _: &str) {}

    fn log_message(&self, _: fmt::Arguments<'_>) {}
}

fn paired_server() -> ServerData {
    ServerData {
        paired: true,
        ..Default::default()
    }
}

fn connection(calls: &Calls, fail: bool) -> (Connection<Engine, Runtime>, Arc<Listener>) {
    let listener = Arc::new(Listener::default());
    let conn = Connection::new(
        Platform::Fake,
        Engine {
            fail,
            calls: Arc::clone(calls),
        },
        Runtime {
            calls: Arc::clone(calls),
        },
        listener.clone(),
        Arc::new(SessionContext::new()),
    );
    (conn, listener)
}

fn steam() -> SessionConfig {
    SessionConfig {
        app: "Steam".into(),
        stream: StreamConfiguration::new(1280, 720, 60, 10_000),
        ..Default::default()
    }
}

#[tokio::test]
async fn start_launches_resolved_app_and_streams() {
    let calls = Calls::default();
    let catalog = Catalog::new(&calls);
    let (mut conn, listener) = connection(&calls, false);
    conn.set_input_devices(2);

    let mut config = steam();
    config.audio_device = Some("hw:1".into());
    conn.start(&catalog, &paired_server(), &config).await.unwrap();

    assert_eq!(conn.state(), SessionState::Streaming);
    assert_eq!(*listener.started.lock().unwrap(), 1);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "list_apps",
            "start_app 1093255277 sops=true local_audio=false mask=3",
            "platform.start fake",
            "audio_sink hw:1",
            "engine.start fullscreen=true",
        ]
    );
}

#[tokio::test]
async fn unknown_app_fails_before_launch() {
    let calls = Calls::default();
    let catalog = Catalog::new(&calls);
    let (mut conn, _) = connection(&calls, false);

    let mut config = steam();
    config.app = "steam".into();
    let err = conn.start(&catalog, &paired_server(), &config).await.unwrap_err();

    assert!(matches!(err, SessionError::AppNotFound(_)));
    assert_eq!(err.to_string(), "Can't find app steam");
    assert_eq!(conn.state(), SessionState::Idle);
    assert_eq!(*calls.lock().unwrap(), vec!["list_apps"]);
}

#[tokio::test]
async fn unreachable_catalog_reads_as_missing_app() {
    let calls = Calls::default();
    let mut catalog = Catalog::new(&calls);
    catalog.apps = None;
    let (mut conn, _) = connection(&calls, false);

    let err = conn.start(&catalog, &paired_server(), &steam()).await.unwrap_err();
    assert_eq!(err.to_string(), "Can't find app Steam");
}

#[tokio::test]
async fn empty_catalog_resolves_nothing() {
    let calls = Calls::default();
    let mut catalog = Catalog::new(&calls);
    catalog.apps = Some(Vec::new());

    let found = nightcast_core::resolve_app_id(&catalog, &paired_server(), "Desktop").await;
    assert_eq!(found, None);
}

#[tokio::test]
async fn launch_rejections_carry_host_diagnostics() {
    let cases = [
        (GS_NOT_SUPPORTED_4K, "", "Server doesn't support 4K".to_string()),
        (
            GS_NOT_SUPPORTED_MODE,
            "",
            "Server doesn't support 1280x720 (60 fps) or try --unsupported option".to_string(),
        ),
        (GS_ERROR, "The host is busy", "Gamestream error: The host is busy".to_string()),
        (-42, "", "Errorcode starting app: -42".to_string()),
    ];

    for (code, last_error, expected) in cases {
        let calls = Calls::default();
        let mut catalog = Catalog::new(&calls);
        catalog.launch_code = code;
        catalog.last_error = last_error;
        let (mut conn, _) = connection(&calls, false);

        let err = conn.start(&catalog, &paired_server(), &steam()).await.unwrap_err();
        assert_eq!(err.to_string(), expected);
        assert!(!calls.lock().unwrap().iter().any(|c| c.starts_with("engine")));
    }
}

#[tokio::test]
async fn engine_failure_releases_platform() {
    let calls = Calls::default();
    let catalog = Catalog::new(&calls);
    let (mut conn, _) = connection(&calls, true);

    let mut config = steam();
    config.fullscreen = false;
    let err = conn.start(&catalog, &paired_server(), &config).await.unwrap_err();

    assert!(matches!(err, SessionError::Engine(_)));
    assert_eq!(conn.state(), SessionState::Idle);
    let calls = calls.lock().unwrap();
    assert_eq!(
        calls[calls.len() - 2..],
        ["engine.start fullscreen=false", "platform.stop fake"]
    );
}

#[tokio::test]
async fn stop_halts_engine_before_platform() {
    let calls = Calls::default();
    let catalog = Catalog::new(&calls);
    let (mut conn, _) = connection(&calls, false);
    conn.start(&catalog, &paired_server(), &steam()).await.unwrap();
    calls.lock().unwrap().clear();

    conn.stop();

    assert_eq!(conn.state(), SessionState::Stopped);
    assert_eq!(*calls.lock().unwrap(), vec!["engine.stop", "platform.stop fake"]);
}

#[tokio::test]
async fn debug_level_enables_engine_logging() {
    let calls = Calls::default();
    let catalog = Catalog::new(&calls);
    let (mut conn, _) = connection(&calls, false);
    assert!(!conn.context().debug());

    let mut config = steam();
    config.debug_level = 1;
    conn.start(&catalog, &paired_server(), &config).await.unwrap();
    assert!(conn.context().debug());
}

#[tokio::test]
async fn second_start_is_rejected_while_streaming() {
    let calls = Calls::default();
    let catalog = Catalog::new(&calls);
    let (mut conn, _) = connection(&calls, false);
    conn.start(&catalog, &paired_server(), &steam()).await.unwrap();

    let err = conn.start(&catalog, &paired_server(), &steam()).await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyStreaming));
}
