//! Identifiers for jobs and for the host-owned objects the core refers to.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct JobId(pub u32);

/// Opaque host entity (scene node). Adapters choose the encoding.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Opaque host material. Identity is the only thing the core compares.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

/// Opaque host component (behaviour, collider, renderer) that can be toggled.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

/// Monotonic allocator for JobId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_job: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_job(&mut self) -> JobId {
        let id = JobId(self.next_job);
        self.next_job = self.next_job.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_job(), JobId(0));
        assert_eq!(alloc.alloc_job(), JobId(1));
        alloc.reset();
        assert_eq!(alloc.alloc_job(), JobId(0));
    }
}
