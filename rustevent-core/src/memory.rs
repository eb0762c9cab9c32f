//! Hook for returning freed memory to the operating system.

/// Best-effort request to release freed capacity after large deallocations.
///
/// Called by the parallel sort after its temporary buffer is dropped.
/// Implementations must not assume they are called at all; correctness never
/// depends on them.
pub trait ReleaseMemory: Send + Sync {
    /// Asks the allocator to give back unused memory.
    fn release_free_memory(&self);
}

impl<F> ReleaseMemory for F
where
    F: Fn() + Send + Sync,
{
    fn release_free_memory(&self) {
        self();
    }
}
