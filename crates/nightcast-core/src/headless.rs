//! An engine that negotiates nothing and transports nothing.
//!
//! It walks the setup stages on the caller's thread, initializing the sinks
//! at the matching stages, then parks a worker thread that reports the
//! termination once the connection is stopped. Used for dry runs and to
//! exercise the session layer without a host-side stream.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::engine::{ConnectionRequest, EngineError, Stage, StreamingEngine};

/// Reported through `stage_failed` when a sink refuses to initialize.
const SINK_INIT_FAILED: i64 = -1;

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct HeadlessEngine {
    worker: Option<Worker>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.worker.is_some()
    }
}

impl StreamingEngine for HeadlessEngine {
    fn start_connection(&mut self, request: ConnectionRequest<'_>) -> Result<(), EngineError> {
        if self.worker.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let ConnectionRequest {
            server_info,
            stream,
            listener,
            mut video,
            mut audio,
            display_flags,
            audio_device,
        } = request;

        for stage in Stage::ALL {
            listener.stage_starting(stage);
            let result = match stage {
                Stage::VideoStreamInit => {
                    video.setup(stream.width, stream.height, stream.fps, display_flags)
                }
                Stage::AudioStreamInit => audio.init(stream.audio_configuration, audio_device),
                _ => Ok(()),
            };
            if let Err(err) = result {
                warn!(%stage, error = %err, "sink initialization failed");
                listener.stage_failed(stage, SINK_INIT_FAILED);
                video.cleanup();
                audio.cleanup();
                return Err(EngineError::StageFailed {
                    stage,
                    code: SINK_INIT_FAILED,
                });
            }
            listener.stage_complete(stage);
        }

        listener.log_message(format_args!(
            "Headless connection to {} ({}x{} @ {} fps)\n",
            server_info.address, stream.width, stream.height, stream.fps
        ));
        listener.connection_started();
        info!(address = %server_info.address, "headless connection up");

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("nightcast-headless".into())
            .spawn(move || {
                // An explicit stop and a dropped sender both end the session.
                let _ = stop_rx.recv();
                video.cleanup();
                audio.cleanup();
                listener.connection_terminated(0);
            })?;

        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    fn stop_connection(&mut self) {
        let Some(worker) = self.worker.take() else {
            debug!("stop requested without an active connection");
            return;
        };
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            warn!("headless worker panicked during teardown");
        }
    }
}

impl Drop for HeadlessEngine {
    fn drop(&mut self) {
        self.stop_connection();
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use std::thread::ThreadId;

    use nightcast_models::{AudioConfiguration, ServerInfo, StreamConfiguration};

    use super::*;
    use crate::engine::DisplayFlags;
    use crate::listener::ConnectionListener;
    use crate::platform::{AudioSink, PlatformError, VideoSink};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        stage_threads: Mutex<Vec<ThreadId>>,
        terminated_on: Mutex<Option<ThreadId>>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ConnectionListener for Recorder {
        fn stage_starting(&self, stage: Stage) {
            self.stage_threads.lock().unwrap().push(thread::current().id());
            self.push(format!("starting {stage}"));
        }

        fn stage_complete(&self, stage: Stage) {
            self.push(format!("complete {stage}"));
        }

        fn stage_failed(&self, stage: Stage, error_code: i64) {
            self.push(format!("failed {stage} {error_code}"));
        }

        fn connection_started(&self) {
            self.push("started".into());
        }

        fn connection_terminated(&self, error_code: i64) {
            *self.terminated_on.lock().unwrap() = Some(thread::current().id());
            self.push(format!("terminated {error_code}"));
        }

        fn display_message(&self, message: &str) {
            self.push(format!("message {message}"));
        }

        fn display_transient_message(&self, message: &str) {
            self.push(format!("transient {message}"));
        }

        fn log_message(&self, _args: fmt::Arguments<'_>) {}
    }

    struct Video {
        fail: bool,
        cleaned: Arc<Mutex<u32>>,
    }

    impl VideoSink for Video {
        fn setup(&mut self, _: u32, _: u32, _: u32, _: DisplayFlags) -> Result<(), PlatformError> {
            if self.fail {
                Err(PlatformError::NotInitialized)
            } else {
                Ok(())
            }
        }

        fn submit_decode_unit(&mut self, _: &[u8]) -> Result<(), PlatformError> {
            Ok(())
        }

        fn cleanup(&mut self) {
            *self.cleaned.lock().unwrap() += 1;
        }
    }

    struct Audio;

    impl AudioSink for Audio {
        fn init(&mut self, _: AudioConfiguration, _: Option<&str>) -> Result<(), PlatformError> {
            Ok(())
        }

        fn decode_and_play_sample(&mut self, _: &[u8]) {}

        fn cleanup(&mut self) {}
    }

    fn start(
        engine: &mut HeadlessEngine,
        recorder: &Arc<Recorder>,
        fail_video: bool,
        cleaned: &Arc<Mutex<u32>>,
    ) -> Result<(), EngineError> {
        let info = ServerInfo {
            address: "10.0.0.2".into(),
            ..Default::default()
        };
        let stream = StreamConfiguration::default();
        engine.start_connection(ConnectionRequest {
            server_info: &info,
            stream: &stream,
            listener: recorder.clone(),
            video: Box::new(Video {
                fail: fail_video,
                cleaned: cleaned.clone(),
            }),
            audio: Box::new(Audio),
            display_flags: DisplayFlags::empty(),
            audio_device: None,
        })
    }

    #[test]
    fn walks_every_stage_then_reports_start_and_stop() {
        let recorder = Arc::new(Recorder::default());
        let cleaned = Arc::new(Mutex::new(0));
        let mut engine = HeadlessEngine::new();

        start(&mut engine, &recorder, false, &cleaned).unwrap();
        assert!(engine.is_connected());
        let events = recorder.events();
        assert_eq!(events.len(), Stage::ALL.len() * 2 + 1);
        assert_eq!(events[0], "starting platform initialization");
        assert_eq!(events.last().unwrap(), "started");

        engine.stop_connection();
        assert!(!engine.is_connected());
        assert_eq!(recorder.events().last().unwrap(), "terminated 0");
        assert_eq!(*cleaned.lock().unwrap(), 1);

        engine.stop_connection();
        let terminated = recorder
            .events()
            .iter()
            .filter(|e| e.starts_with("terminated"))
            .count();
        assert_eq!(terminated, 1);
    }

    #[test]
    fn stages_run_on_caller_and_termination_on_worker() {
        let recorder = Arc::new(Recorder::default());
        let cleaned = Arc::new(Mutex::new(0));
        let mut engine = HeadlessEngine::new();
        let caller = thread::current().id();

        start(&mut engine, &recorder, false, &cleaned).unwrap();
        let stage_threads = recorder.stage_threads.lock().unwrap().clone();
        assert_eq!(stage_threads.len(), Stage::ALL.len());
        assert!(stage_threads.iter().all(|id| *id == caller));

        engine.stop_connection();
        let terminated_on = recorder.terminated_on.lock().unwrap().unwrap();
        assert_ne!(terminated_on, caller);
    }

    #[test]
    fn sink_failure_reports_stage_failure() {
        let recorder = Arc::new(Recorder::default());
        let cleaned = Arc::new(Mutex::new(0));
        let mut engine = HeadlessEngine::new();

        let err = start(&mut engine, &recorder, true, &cleaned).unwrap_err();
        assert!(matches!(
            err,
            EngineError::StageFailed {
                stage: Stage::VideoStreamInit,
                ..
            }
        ));
        assert!(recorder
            .events()
            .contains(&"failed video stream initialization -1".to_string()));
        assert!(!recorder.events().contains(&"started".to_string()));
        assert!(!engine.is_connected());
    }

    #[test]
    fn second_start_is_rejected() {
        let recorder = Arc::new(Recorder::default());
        let cleaned = Arc::new(Mutex::new(0));
        let mut engine = HeadlessEngine::new();
        start(&mut engine, &recorder, false, &cleaned).unwrap();
        assert!(matches!(
            start(&mut engine, &recorder, false, &cleaned),
            Err(EngineError::AlreadyRunning)
        ));
    }
}
