use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

/// State shared between the session controller and the listener hooks.
///
/// Hooks run on engine threads, so everything here is safe to read from
/// any thread.
#[derive(Debug)]
pub struct SessionContext {
    debug: AtomicBool,
    controller_thread: ThreadId,
}

impl SessionContext {
    /// Context owned by the calling thread.
    pub fn new() -> Self {
        Self {
            debug: AtomicBool::new(false),
            controller_thread: thread::current().id(),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Acquire)
    }

    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Release);
    }

    /// Thread that created the context and drives start/stop.
    pub fn controller_thread(&self) -> ThreadId {
        self.controller_thread
    }

    pub fn on_controller_thread(&self) -> bool {
        thread::current().id() == self.controller_thread
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn debug_flag_is_visible_across_threads() {
        let ctx = Arc::new(SessionContext::new());
        assert!(!ctx.debug());
        ctx.set_debug(true);
        let remote = Arc::clone(&ctx);
        let (seen, on_controller) = thread::spawn(move || (remote.debug(), remote.on_controller_thread()))
            .join()
            .unwrap();
        assert!(seen);
        assert!(!on_controller);
        assert!(ctx.on_controller_thread());
    }
}
