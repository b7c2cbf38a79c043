use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide suppression of operator-facing print calls, flipped on
/// during `update` so reload stop/start noise does not drown the reread
/// summary. Logging to the log sink is unaffected (spec §4.5). A plain
/// `AtomicBool` suffices since `update` runs serialized under the
/// supervisor lock; no thread-local scoping is needed.
#[derive(Debug, Default)]
pub struct Quiet(AtomicBool);

impl Quiet {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn enable(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
