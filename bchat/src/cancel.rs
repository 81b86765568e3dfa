//! Per-session cancellation controller.

use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

/// Owns the single live cancellation token of one chat session.
///
/// At most one cancellable operation is ever live: installing the token for
/// a new exchange cancels the previous one first, so a prior round can
/// never keep mutating its accumulator after a replacement begins. The
/// in-flight read loop observes the token at least once per yielded chunk.
#[derive(Debug, Default)]
pub struct CancelController {
    live: Mutex<CancellationToken>,
}

impl CancelController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels whatever operation currently holds the live token.
    pub fn terminate(&self) {
        self.lock().cancel();
    }

    /// Cancels the previous token, installs a fresh one, and returns it.
    ///
    /// Replacing without cancelling would be a correctness bug: two rounds
    /// could both be live against one accumulator.
    pub fn begin(&self) -> CancellationToken {
        let mut live = self.lock();
        live.cancel();

        let fresh = CancellationToken::new();
        *live = fresh.clone();
        fresh
    }

    /// Clone of the current live token.
    pub fn signal(&self) -> CancellationToken {
        self.lock().clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().is_cancelled()
    }

    fn lock(&self) -> MutexGuard<'_, CancellationToken> {
        // Nothing panics while holding this lock; recover rather than
        // poison-propagate so terminate() stays callable from any thread.
        self.live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
