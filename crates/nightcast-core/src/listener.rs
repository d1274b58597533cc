//! Lifecycle hooks the streaming engine calls back into.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::context::SessionContext;
use crate::engine::Stage;

/// Hooks invoked by the engine, possibly concurrently and from its own
/// threads. Implementations must return quickly.
pub trait ConnectionListener: Send + Sync {
    fn stage_starting(&self, _stage: Stage) {}

    fn stage_complete(&self, _stage: Stage) {}

    fn stage_failed(&self, _stage: Stage, _error_code: i64) {}

    fn connection_started(&self);

    fn connection_terminated(&self, error_code: i64);

    fn display_message(&self, message: &str);

    fn display_transient_message(&self, message: &str);

    fn log_message(&self, args: fmt::Arguments<'_>);
}

/// Writes status lines for the user and forwards engine logs to `tracing`.
pub struct ConsoleListener {
    out: Mutex<Box<dyn Write + Send>>,
    context: Arc<SessionContext>,
}

impl ConsoleListener {
    pub fn new(context: Arc<SessionContext>) -> Self {
        Self::with_writer(context, Box::new(io::stdout()))
    }

    pub fn with_writer(context: Arc<SessionContext>, out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            context,
        }
    }

    fn status(&self, line: fmt::Arguments<'_>) {
        // A poisoned writer only means another hook panicked mid-line.
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(out, "[*] {line}");
        let _ = out.flush();
    }
}

impl ConnectionListener for ConsoleListener {
    fn stage_failed(&self, stage: Stage, error_code: i64) {
        debug!(%stage, error_code, "connection stage failed");
    }

    fn connection_started(&self) {
        self.status(format_args!("Connection started"));
    }

    fn connection_terminated(&self, error_code: i64) {
        self.status(format_args!("Connection terminated: error {error_code}"));
    }

    fn display_message(&self, message: &str) {
        self.status(format_args!("{message}"));
    }

    fn display_transient_message(&self, message: &str) {
        self.status(format_args!("{message}"));
    }

    fn log_message(&self, args: fmt::Arguments<'_>) {
        if self.context.debug() {
            info!(target: "nightcast::engine", "{}", args);
        } else {
            debug!(target: "nightcast::engine", "{}", args);
        }
    }
}
