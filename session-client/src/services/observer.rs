use std::sync::atomic::{AtomicUsize, Ordering};

/// UI-facing callbacks the session core raises without knowing anything
/// about screens or navigation stacks.
pub trait SessionObserver: Send + Sync {
    /// Route the user to the sign-in entry point.
    fn redirect_to_sign_in(&self);

    /// Show the one user-facing notice this core produces: the session has
    /// expired and the user must sign in again.
    fn notify_session_expired(&self);
}

/// Counting observer for tests.
pub struct MockObserver {
    pub redirects: AtomicUsize,
    pub expiry_notices: AtomicUsize,
}

impl Default for MockObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObserver {
    pub fn new() -> Self {
        Self {
            redirects: AtomicUsize::new(0),
            expiry_notices: AtomicUsize::new(0),
        }
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    pub fn expiry_notice_count(&self) -> usize {
        self.expiry_notices.load(Ordering::SeqCst)
    }
}

impl SessionObserver for MockObserver {
    fn redirect_to_sign_in(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }

    fn notify_session_expired(&self) {
        self.expiry_notices.fetch_add(1, Ordering::SeqCst);
    }
}
