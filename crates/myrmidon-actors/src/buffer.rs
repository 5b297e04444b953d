//! A pool of large byte regions handed over between actors without copying.
//!
//! The producer [allocates](BufferPool::allocate) a region and fills it through its
//! [`BufferLease`]. Sending the region by id [seals](BufferPool::seal) it: the lease loses write
//! access, and the region becomes a read-only [`SharedBuffer`] that any number of receivers may
//! hold. The region is released once the last holder (lease or shared handle) is dropped.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u64);

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Buffer pool exhausted: requested {requested} bytes, {available} available")]
    Exhausted { requested: usize, available: usize },

    #[error("Buffer has already been sent")]
    Sealed,

    #[error("Write out of bounds: {offset}+{len} > {size}")]
    OutOfBounds { offset: usize, len: usize, size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferStats {
    /// regions that are allocated and not yet released
    pub live_regions: usize,
    /// bytes held by the live regions
    pub live_bytes: usize,
    /// regions still owned by their lease (i.e. not sent yet)
    pub leased: usize,
}

#[derive(Debug, Clone)]
pub struct BufferPool(Arc<Inner>);

/// Exclusive write access to a region until it is sent.
pub struct BufferLease {
    id: BufferId,
    size: usize,
    cell: Arc<LeaseCell>,
    pool: Weak<Inner>,
}

/// A sealed, read-only region.
#[derive(Clone)]
pub struct SharedBuffer(Arc<Region>);

#[derive(Debug)]
struct Inner {
    max_bytes: usize,
    next_id: AtomicU64,
    live_regions: AtomicUsize,
    live_bytes: AtomicUsize,
    leased: Mutex<HashMap<BufferId, Arc<LeaseCell>>>,
}

#[derive(Debug)]
struct LeaseCell {
    region: Mutex<Option<Region>>,
}

struct Region {
    id: BufferId,
    data: Box<[u8]>,
    pool: Weak<Inner>,
}

impl BufferPool {
    pub fn new(max_bytes: usize) -> Self {
        Self(Arc::new(Inner {
            max_bytes,
            next_id: AtomicU64::new(1),
            live_regions: Default::default(),
            live_bytes: Default::default(),
            leased: Default::default(),
        }))
    }

    /// Allocate a zero-filled region of `size` bytes.
    pub fn allocate(&self, size: usize) -> Result<BufferLease, BufferError> {
        self.0.reserve(size)?;

        let id = BufferId(self.0.next_id.fetch_add(1, Ordering::Relaxed));
        let region = Region { id, data: vec![0u8; size].into_boxed_slice(), pool: Arc::downgrade(&self.0) };
        let cell = Arc::new(LeaseCell { region: Mutex::new(Some(region)) });
        self.0.leased.lock().insert(id, Arc::clone(&cell));

        log::trace!("allocated buffer {} ({} bytes)", id, size);

        Ok(BufferLease { id, size, cell, pool: Arc::downgrade(&self.0) })
    }

    /// Move the region out of its lease.
    ///
    /// Returns `None` if there is no such lease (unknown id, or already sealed).
    pub fn seal(&self, id: BufferId) -> Option<SharedBuffer> {
        let cell = self.0.leased.lock().remove(&id)?;
        let region = cell.region.lock().take()?;
        Some(SharedBuffer(Arc::new(region)))
    }

    pub fn stats(&self) -> BufferStats {
        BufferStats {
            live_regions: self.0.live_regions.load(Ordering::Acquire),
            live_bytes: self.0.live_bytes.load(Ordering::Acquire),
            leased: self.0.leased.lock().len(),
        }
    }
}

impl Inner {
    fn reserve(&self, size: usize) -> Result<(), BufferError> {
        self.live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                live.checked_add(size).filter(|total| *total <= self.max_bytes)
            })
            .map_err(|live| BufferError::Exhausted {
                requested: size,
                available: self.max_bytes.saturating_sub(live),
            })?;
        self.live_regions.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn release(&self, size: usize) {
        self.live_bytes.fetch_sub(size, Ordering::AcqRel);
        self.live_regions.fetch_sub(1, Ordering::AcqRel);
    }
}

impl BufferLease {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Whether the region has been sent and is no longer writable through this lease.
    pub fn is_sealed(&self) -> bool {
        self.cell.region.lock().is_none()
    }

    /// Mutable view of the region, `None` once the region has been sent.
    pub fn view_mut(&self) -> Option<MappedMutexGuard<'_, [u8]>> {
        MutexGuard::try_map(self.cell.region.lock(), |region| {
            region.as_mut().map(|r| &mut r.data[..])
        })
        .ok()
    }

    pub fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<(), BufferError> {
        let mut view = self.view_mut().ok_or(BufferError::Sealed)?;
        let size = view.len();
        let out_of_bounds = || BufferError::OutOfBounds { offset, len: bytes.len(), size };
        let end = offset.checked_add(bytes.len()).ok_or_else(out_of_bounds)?;
        view.get_mut(offset..end).ok_or_else(out_of_bounds)?.copy_from_slice(bytes);
        Ok(())
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        // an unsent region goes away together with the last reference to its cell
        if let Some(pool) = self.pool.upgrade() {
            pool.leased.lock().remove(&self.id);
        }
    }
}

impl SharedBuffer {
    pub fn id(&self) -> BufferId {
        self.0.id
    }

    /// Number of live handles to this region.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0.data
    }
}

impl Deref for SharedBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0.data
    }
}

impl AsRef<[u8]> for SharedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0.data
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        log::trace!("released buffer {} ({} bytes)", self.id, self.data.len());
        if let Some(pool) = self.pool.upgrade() {
            pool.release(self.data.len());
        }
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for BufferLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferLease").field("id", &self.id).field("size", &self.size).finish()
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("id", &self.0.id)
            .field("len", &self.0.data.len())
            .field("refs", &self.ref_count())
            .finish()
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region").field("id", &self.id).field("len", &self.data.len()).finish()
    }
}
