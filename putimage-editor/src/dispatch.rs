use std::collections::BTreeSet;

use tracing::debug;

/// Process-wide registry of nodes with a stroke in progress.
///
/// A drag can end outside the node that started it, so the host feeds
/// every pointer release here and ends the stroke only on the nodes that
/// registered one.
#[derive(Debug, Default)]
pub struct StrokeDispatcher {
    active: BTreeSet<u32>,
}

impl StrokeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` as owning a stroke.
    pub fn begin(&mut self, node: u32) {
        if self.active.insert(node) {
            debug!("node #{node}: stroke started");
        }
    }

    /// A pointer was released somewhere. Returns the owners to notify, in
    /// node order, and forgets them.
    pub fn release(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.active).into_iter().collect()
    }

    pub fn is_active(&self, node: u32) -> bool {
        self.active.contains(&node)
    }

    /// Forget a node that was removed mid-stroke.
    pub fn remove(&mut self, node: u32) {
        self.active.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_notifies_only_owners_once() {
        let mut d = StrokeDispatcher::new();
        d.begin(3);
        d.begin(1);
        d.begin(3);
        assert!(d.is_active(1));
        assert!(!d.is_active(2));
        assert_eq!(d.release(), vec![1, 3]);
        assert!(d.release().is_empty());
    }

    #[test]
    fn removed_node_is_not_notified() {
        let mut d = StrokeDispatcher::new();
        d.begin(7);
        d.remove(7);
        assert!(d.release().is_empty());
    }
}
