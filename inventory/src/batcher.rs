use std::{collections::BTreeSet, mem, time::Duration};

use iso_garden_core::PlantId;

/// Debounce window used when none is configured.
pub const DEFAULT_SYNC_WINDOW: Duration = Duration::from_millis(750);

/// Pending-set debouncer for inventory durability writes.
///
/// Every touch resets the idle timer. A batch is released only once the timer
/// reaches the window without further touches. Time advances exclusively
/// through [`SyncBatcher::tick`], so the batcher never reads a clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncBatcher {
    window: Duration,
    idle: Duration,
    pending: BTreeSet<PlantId>,
}

impl SyncBatcher {
    /// Creates a batcher releasing batches after `window` of inactivity.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            idle: Duration::ZERO,
            pending: BTreeSet::new(),
        }
    }

    /// Configured debounce window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a mutation of `plant` and restarts the window.
    pub fn touch(&mut self, plant: &PlantId) {
        if !self.pending.contains(plant) {
            let _ = self.pending.insert(plant.clone());
        }
        self.idle = Duration::ZERO;
    }

    /// Advances the idle timer, returning the pending set once the window has elapsed.
    pub fn tick(&mut self, elapsed: Duration) -> Option<BTreeSet<PlantId>> {
        if self.pending.is_empty() {
            return None;
        }
        self.idle = self.idle.saturating_add(elapsed);
        if self.idle >= self.window {
            Some(self.take())
        } else {
            None
        }
    }

    /// Releases the pending set immediately, regardless of the timer.
    pub fn flush(&mut self) -> BTreeSet<PlantId> {
        self.take()
    }

    /// Reports whether any touched key awaits a write.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn take(&mut self) -> BTreeSet<PlantId> {
        self.idle = Duration::ZERO;
        mem::take(&mut self.pending)
    }
}

impl Default for SyncBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn idle_batcher_never_fires() {
        let mut batcher = SyncBatcher::new(WINDOW);
        assert_eq!(batcher.tick(Duration::from_secs(10)), None);
    }

    #[test]
    fn touches_inside_the_window_restart_the_timer() {
        let mut batcher = SyncBatcher::new(WINDOW);
        let sakura = PlantId::from("sakura");
        let pine = PlantId::from("pine");

        batcher.touch(&sakura);
        assert_eq!(batcher.tick(Duration::from_millis(400)), None);
        batcher.touch(&pine);
        assert_eq!(batcher.tick(Duration::from_millis(400)), None);
        batcher.touch(&sakura);
        assert_eq!(batcher.tick(Duration::from_millis(499)), None);

        let batch = batcher.tick(Duration::from_millis(1)).expect("window elapsed");
        assert_eq!(batch.into_iter().collect::<Vec<_>>(), vec![pine, sakura]);
        assert!(!batcher.has_pending());
    }

    #[test]
    fn flush_releases_pending_keys_immediately() {
        let mut batcher = SyncBatcher::new(WINDOW);
        batcher.touch(&PlantId::from("fire"));
        assert_eq!(batcher.flush().len(), 1);
        assert!(batcher.flush().is_empty());
        assert_eq!(batcher.tick(WINDOW), None);
    }
}
