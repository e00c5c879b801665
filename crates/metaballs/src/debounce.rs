//! Viewport resize debouncing.

/// Quiet period a resize must survive before it is applied.
pub const RESIZE_QUIET_MS: f64 = 300.0;

/// Holds the latest requested viewport size until no newer request has
/// arrived for [`RESIZE_QUIET_MS`].
#[derive(Debug, Clone, Default)]
pub struct ResizeDebounce {
    pending: Option<Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    size: (f64, f64),
    requested_ms: f64,
}

impl ResizeDebounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a resize to `size` at `now_ms`, superseding any pending one.
    pub fn request(&mut self, size: (f64, f64), now_ms: f64) {
        self.pending = Some(Pending {
            size,
            requested_ms: now_ms,
        });
    }

    /// Returns the settled size once the quiet period has passed, clearing it.
    pub fn poll(&mut self, now_ms: f64) -> Option<(f64, f64)> {
        let pending = self.pending?;
        if now_ms - pending.requested_ms < RESIZE_QUIET_MS {
            return None;
        }
        self.pending = None;
        Some(pending.size)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
