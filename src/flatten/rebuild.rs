/// Whether the flattened streams reflect the current scene and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildState {
    Clean,
    #[default]
    Dirty,
}

/// Rebuild bookkeeping for one model: the clean/dirty state plus a separate
/// "new data available" flag for the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildTracker {
    state: RebuildState,
    refresh: bool,
}

impl RebuildTracker {
    pub fn state(&self) -> RebuildState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == RebuildState::Dirty
    }

    /// A new scene was attached.
    pub fn opened(&mut self) {
        self.state = RebuildState::Dirty;
        self.refresh = true;
    }

    /// Geometry-affecting configuration changed.
    pub fn invalidate(&mut self) {
        self.state = RebuildState::Dirty;
    }

    /// Record the outcome of a flatten pass. An empty result leaves the
    /// tracker dirty so the next render retries.
    pub fn flattened(&mut self, produced_data: bool) {
        if produced_data {
            self.state = RebuildState::Clean;
            self.refresh = true;
        }
    }

    pub fn needs_refresh(&self) -> bool {
        self.refresh
    }

    pub fn unset_refresh(&mut self) {
        self.refresh = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_dirty_without_refresh() {
        let t = RebuildTracker::default();
        assert_eq!(t.state(), RebuildState::Dirty);
        assert!(!t.needs_refresh());
    }

    #[test]
    fn open_flatten_invalidate_cycle() {
        let mut t = RebuildTracker::default();
        t.opened();
        assert!(t.is_dirty());
        assert!(t.needs_refresh());

        t.unset_refresh();
        t.flattened(true);
        assert_eq!(t.state(), RebuildState::Clean);
        assert!(t.needs_refresh());

        t.unset_refresh();
        assert!(!t.needs_refresh());

        t.invalidate();
        assert!(t.is_dirty());
        assert!(!t.needs_refresh());
    }

    #[test]
    fn empty_flatten_stays_dirty() {
        let mut t = RebuildTracker::default();
        t.opened();
        t.unset_refresh();
        t.flattened(false);
        assert!(t.is_dirty());
        assert!(!t.needs_refresh());
    }
}
