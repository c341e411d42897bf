//! Global pointer capture.

use std::rc::Rc;

/// Host-side pointer capture, so move and up events keep arriving when the
/// pointer leaves the canvas mid-interaction.
pub trait CaptureHost {
    fn acquire(&self);
    fn release(&self);
}

/// Holds capture for as long as it lives. Dropping the guard releases it.
pub struct CaptureGuard {
    host: Rc<dyn CaptureHost>,
}

impl CaptureGuard {
    pub fn acquire(host: Rc<dyn CaptureHost>) -> Self {
        host.acquire();
        Self { host }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.host.release();
    }
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CaptureGuard")
    }
}
