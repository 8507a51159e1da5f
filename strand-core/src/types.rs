/// Identifier for a node in a [`crate::graph::PlantGraph`].
///
/// This is an index into `PlantGraph::nodes`, and is only meaningful within
/// the lifetime of a given `PlantGraph` instance.
pub type NodeId = usize;

/// Identifier for a [`crate::strand::Strand`].
///
/// Strand ids are handed out by an [`IdAllocator`] owned by a single
/// pipeline run, so two runs never share a counter.
pub type StrandId = usize;

/// Non-owning reference to one particle of one strand.
///
/// The strand owns its particle sequence; per-node indices store handles
/// instead of a second copy of the particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleHandle {
    pub strand: StrandId,
    pub index: usize,
}

impl ParticleHandle {
    pub fn new(strand: StrandId, index: usize) -> Self {
        Self { strand, index }
    }
}

/// Monotonic id counter.
///
/// Replaces process-wide static counters: every graph and every pipeline
/// run owns its own allocator.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next free id and advances the counter.
    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_is_monotonic_and_per_instance() {
        let mut a = IdAllocator::new();
        let mut b = IdAllocator::new();

        assert_eq!(a.next_id(), 0);
        assert_eq!(a.next_id(), 1);
        assert_eq!(a.next_id(), 2);

        // A second allocator is not affected by the first one.
        assert_eq!(b.next_id(), 0);

        assert_eq!(a.allocated(), 3);
        assert_eq!(b.allocated(), 1);
    }
}
