//! Component lifecycle log: mount and unmount.
//!
//! The context's `LifecycleTracker` records which component hosts are
//! currently attached (to a parent component or to a page element) and
//! accumulates `Mount`/`Unmount` events. Hosts consume them through
//! [`Context::drain_lifecycle`](crate::Context::drain_lifecycle) or the
//! subject the run loop forwards them to.

use std::collections::HashSet;

use crate::dom::NodeId;

/// Something that happened to a component host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The host was attached to a slot or page element.
    Mount { host: NodeId },
    /// The host was detached or disposed.
    Unmount { host: NodeId },
}

/// Tracks mounted hosts and queues lifecycle events.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    mounted: HashSet<NodeId>,
    pending: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mount. Moving an already mounted host emits nothing.
    pub fn on_mount(&mut self, host: NodeId) {
        if self.mounted.insert(host) {
            self.pending.push(LifecycleEvent::Mount { host });
        }
    }

    /// Record an unmount. Hosts that were never mounted emit nothing.
    pub fn on_unmount(&mut self, host: NodeId) {
        if self.mounted.remove(&host) {
            self.pending.push(LifecycleEvent::Unmount { host });
        }
    }

    /// Unmount every mounted host for which `allocated` is false, i.e. hosts
    /// freed along with an ancestor. Returns how many were released.
    pub fn release_freed(&mut self, allocated: impl Fn(NodeId) -> bool) -> usize {
        let mut freed: Vec<NodeId> = self
            .mounted
            .iter()
            .copied()
            .filter(|&host| !allocated(host))
            .collect();
        freed.sort();
        for &host in &freed {
            self.on_unmount(host);
        }
        freed.len()
    }

    pub fn is_mounted(&self, host: NodeId) -> bool {
        self.mounted.contains(&host)
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    /// Drain the queued events, oldest first.
    pub fn drain(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<NodeId> {
        let mut sm: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn mount_then_unmount() {
        let [a] = ids(1)[..] else { unreachable!() };
        let mut tracker = LifecycleTracker::new();
        tracker.on_mount(a);
        assert!(tracker.is_mounted(a));
        tracker.on_unmount(a);
        assert_eq!(
            tracker.drain(),
            vec![LifecycleEvent::Mount { host: a }, LifecycleEvent::Unmount { host: a }]
        );
        assert!(!tracker.has_pending());
    }

    #[test]
    fn repeated_mount_and_stray_unmount_are_silent() {
        let [a, b] = ids(2)[..] else { unreachable!() };
        let mut tracker = LifecycleTracker::new();
        tracker.on_mount(a);
        tracker.on_mount(a);
        tracker.on_unmount(b);
        assert_eq!(tracker.drain(), vec![LifecycleEvent::Mount { host: a }]);
        assert_eq!(tracker.mounted_count(), 1);
    }

    #[test]
    fn freed_hosts_are_released() {
        let [a, b] = ids(2)[..] else { unreachable!() };
        let mut tracker = LifecycleTracker::new();
        tracker.on_mount(a);
        tracker.on_mount(b);
        tracker.drain();
        assert_eq!(tracker.release_freed(|host| host == a), 1);
        assert!(!tracker.is_mounted(b));
        assert_eq!(tracker.mounted_count(), 1);
        assert_eq!(tracker.drain(), vec![LifecycleEvent::Unmount { host: b }]);
        assert_eq!(tracker.release_freed(|_| true), 0);
    }
}
