//! Counting reverb routing for activation round-trip assertions.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use voice_engine::ReverbRouting;

#[derive(Debug, Default)]
struct ProbeState {
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    active: AtomicBool,
}

/// Reverb routing fake that records every transition.
///
/// Attach the probe to an override and keep the [`ReverbMonitor`] in the
/// test to assert on activation counts.
#[derive(Debug, Default)]
pub struct ReverbProbe {
    state: Arc<ProbeState>,
}

impl ReverbProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cloneable view onto the probe's counters.
    #[must_use]
    pub fn monitor(&self) -> ReverbMonitor {
        ReverbMonitor {
            state: Arc::clone(&self.state),
        }
    }
}

impl ReverbRouting for ReverbProbe {
    fn activate(&mut self) {
        self.state.activations.fetch_add(1, Ordering::SeqCst);
        self.state.active.store(true, Ordering::SeqCst);
    }

    fn deactivate(&mut self) {
        self.state.deactivations.fetch_add(1, Ordering::SeqCst);
        self.state.active.store(false, Ordering::SeqCst);
    }
}

/// Read side of a [`ReverbProbe`].
#[derive(Debug, Clone)]
pub struct ReverbMonitor {
    state: Arc<ProbeState>,
}

impl ReverbMonitor {
    /// Number of activate calls that reached the routing.
    #[must_use]
    pub fn activations(&self) -> usize {
        self.state.activations.load(Ordering::SeqCst)
    }

    /// Number of deactivate calls that reached the routing.
    #[must_use]
    pub fn deactivations(&self) -> usize {
        self.state.deactivations.load(Ordering::SeqCst)
    }

    /// Whether the routing is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }
}
