use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

/// Free actor slots, handed out in FIFO order so that a released slot is reused as late as
/// possible.
#[derive(Debug, Clone)]
pub(crate) struct SlotPool(Arc<Mutex<VecDeque<u32>>>);

/// A slot in use. Returned into the pool on drop.
#[derive(Debug)]
pub(crate) struct SlotLease {
    pool: SlotPool,
    slot: u32,
}

impl SlotPool {
    pub fn new(max_actors: usize) -> Self {
        let max_actors = u32::try_from(max_actors).unwrap_or(u32::MAX);
        Self(Arc::new(Mutex::new((0..max_actors).collect())))
    }

    pub fn acquire(&self) -> Option<SlotLease> {
        let slot = self.0.lock().pop_front()?;
        Some(SlotLease { pool: self.clone(), slot })
    }

    /// Prevent any further acquisitions.
    pub fn drain(&self) {
        self.0.lock().clear();
    }

    #[cfg(test)]
    pub fn available(&self) -> usize {
        self.0.lock().len()
    }
}

impl Deref for SlotLease {
    type Target = u32;
    fn deref(&self) -> &Self::Target {
        &self.slot
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        self.pool.0.lock().push_back(self.slot);
    }
}
