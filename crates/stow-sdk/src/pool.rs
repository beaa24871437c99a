use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

/// Default number of idle buffers a pool keeps.
pub const DEFAULT_MAX_RETAINED: usize = 16;

/// Buffers that grew beyond this capacity are dropped instead of retained.
pub const DEFAULT_MAX_CAPACITY: usize = 4 * 1024 * 1024;

struct PoolInner {
    idle: Mutex<Vec<Vec<u8>>>,
    max_retained: usize,
    max_capacity: usize,
}

/// Reusable serialization buffers.
///
/// A pool is created by the application and handed to every store that
/// should share it. [`BufferPool::acquire`] returns a [`PooledBuffer`] that
/// goes back to the pool, cleared, when dropped. Cloning a pool yields
/// another handle to the same buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_RETAINED, DEFAULT_MAX_CAPACITY)
    }

    /// Keep at most `max_retained` idle buffers of at most `max_capacity`
    /// bytes each.
    pub fn with_limits(max_retained: usize, max_capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(Vec::new()),
                max_retained,
                max_capacity,
            }),
        }
    }

    /// Take an idle buffer, or allocate a new one.
    pub fn acquire(&self) -> PooledBuffer {
        let buffer = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        PooledBuffer {
            buffer,
            pool: Arc::clone(&self.inner),
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle())
            .field("max_retained", &self.inner.max_retained)
            .field("max_capacity", &self.inner.max_capacity)
            .finish()
    }
}

/// A buffer on loan from a [`BufferPool`].
pub struct PooledBuffer {
    buffer: Vec<u8>,
    pool: Arc<PoolInner>,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        if buffer.capacity() == 0 || buffer.capacity() > self.pool.max_capacity {
            return;
        }
        buffer.clear();
        let mut idle = self.pool.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.pool.max_retained {
            idle.push(buffer);
        }
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buffer.len())
            .field("capacity", &self.buffer.capacity())
            .finish()
    }
}
