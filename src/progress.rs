//! Progress reporting and the bridge from engine phases to host fractions.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::engine::{EngineProgress, ProgressStep};

/// Fraction reported once the container structure has been read.
pub const READ_END_PROGRESS: f64 = 0.3;
/// Fraction reported once the primary image has been decoded.
pub const DECODE_END_PROGRESS: f64 = 0.9;

/// Host-side progress receiver.
pub trait ProgressSink: Sync {
    /// Receive a fraction in `[0, 1]`. Return `false` to cancel the load.
    fn report(&self, fraction: f64) -> bool;
}

/// Progress sink that ignores reports and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f64) -> bool {
        true
    }
}

impl<F: Fn(f64) -> bool + Sync> ProgressSink for F {
    fn report(&self, fraction: f64) -> bool {
        self(fraction)
    }
}

/// The slice of the overall progress one decode call maps into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressRange {
    pub start: f64,
    pub end: f64,
}

impl ProgressRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Linear interpolation of `fraction` into the range. A fraction of 1
    /// lands exactly on `end`.
    pub fn lerp(&self, fraction: f64) -> f64 {
        if fraction >= 1.0 {
            return self.end;
        }
        (self.start + fraction * (self.end - self.start)).min(self.end)
    }
}

/// Forwards the engine's tile-decode progress to a [`ProgressSink`].
///
/// Phases other than tile decoding are acknowledged and ignored. The bridge
/// only touches its own counters, so engines may call it from any thread.
pub struct ProgressBridge<'a> {
    sink: &'a dyn ProgressSink,
    range: ProgressRange,
    total_substeps: AtomicU32,
    cancelled: AtomicBool,
}

impl<'a> ProgressBridge<'a> {
    pub fn new(sink: &'a dyn ProgressSink, range: ProgressRange) -> Self {
        Self {
            sink,
            range,
            total_substeps: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn range(&self) -> ProgressRange {
        self.range
    }

    /// Whether the sink has asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fraction of the range covered after `done` substeps.
    fn fraction(&self, done: u32) -> f64 {
        let total = self.total_substeps.load(Ordering::Acquire);
        if total == 0 {
            return 1.0;
        }
        (f64::from(done) / f64::from(total)).clamp(0.0, 1.0)
    }
}

impl EngineProgress for ProgressBridge<'_> {
    fn start(&self, step: ProgressStep, max_progress: u32) -> bool {
        if step == ProgressStep::LoadTile {
            self.total_substeps.store(max_progress, Ordering::Release);
        }
        true
    }

    fn on_progress(&self, step: ProgressStep, progress: u32) -> bool {
        if step != ProgressStep::LoadTile {
            return true;
        }
        let keep_going = self.sink.report(self.range.lerp(self.fraction(progress)));
        if !keep_going {
            self.cancelled.store(true, Ordering::Release);
        }
        keep_going
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn halfway_through_tiles_maps_into_range() {
        let seen = Mutex::new(Vec::new());
        let sink = |f: f64| {
            seen.lock().unwrap().push(f);
            true
        };
        let bridge = ProgressBridge::new(&sink, ProgressRange::new(0.3, 0.9));
        assert!(bridge.start(ProgressStep::LoadTile, 10));
        assert!(bridge.on_progress(ProgressStep::LoadTile, 5));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!((seen[0] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn range_end_is_exact() {
        assert_eq!(ProgressRange::new(0.3, 0.9).lerp(1.0), 0.9);
        assert_eq!(ProgressRange::new(0.9, 1.0).lerp(1.0), 1.0);
        assert_eq!(ProgressRange::new(0.3, 0.9).lerp(0.0), 0.3);
    }

    #[test]
    fn other_phases_are_ignored() {
        let sink = |_: f64| -> bool { panic!("no report expected") };
        let bridge = ProgressBridge::new(&sink, ProgressRange::new(0.0, 1.0));
        assert!(bridge.start(ProgressStep::Total, 3));
        assert!(bridge.on_progress(ProgressStep::Total, 1));
        assert!(!bridge.is_cancelled());
    }

    #[test]
    fn cancel_is_propagated_and_remembered() {
        let sink = |f: f64| f < 0.5;
        let bridge = ProgressBridge::new(&sink, ProgressRange::new(0.0, 1.0));
        bridge.start(ProgressStep::LoadTile, 4);
        assert!(bridge.on_progress(ProgressStep::LoadTile, 1));
        assert!(!bridge.is_cancelled());
        assert!(!bridge.on_progress(ProgressStep::LoadTile, 3));
        assert!(bridge.is_cancelled());
    }

    #[test]
    fn zero_substeps_reports_range_end() {
        let last = Mutex::new(0.0);
        let sink = |f: f64| {
            *last.lock().unwrap() = f;
            true
        };
        let bridge = ProgressBridge::new(&sink, ProgressRange::new(0.2, 0.4));
        bridge.start(ProgressStep::LoadTile, 0);
        bridge.on_progress(ProgressStep::LoadTile, 0);
        assert!((*last.lock().unwrap() - 0.4).abs() < 1e-9);
    }
}
