//! Lock-free shard buffer pool, avoiding an alloc/dealloc per shard as
//! receive blocks churn through the tracker's table. No alignment
//! requirements here (SIMD dispatch is out of scope); plain `Vec<u8>`
//! buffers are enough.

use crossbeam_queue::ArrayQueue;

pub struct ShardPool {
    pool: ArrayQueue<Vec<u8>>,
    shard_len: usize,
}

impl ShardPool {
    pub fn new(capacity: usize, shard_len: usize) -> Self {
        let pool = ArrayQueue::new(capacity.max(1));
        for _ in 0..capacity {
            let _ = pool.push(vec![0u8; shard_len]);
        }
        Self { pool, shard_len }
    }

    pub fn shard_len(&self) -> usize {
        self.shard_len
    }

    /// Takes a zeroed, `shard_len`-byte buffer from the pool, allocating a
    /// fresh one if the pool is currently empty.
    pub fn acquire(&self) -> Vec<u8> {
        self.pool.pop().unwrap_or_else(|| vec![0u8; self.shard_len])
    }

    /// Returns a buffer to the pool, zeroing and resizing it back to
    /// `shard_len` first. Dropped silently if the pool is already full.
    pub fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        buf.resize(self.shard_len, 0);
        let _ = self.pool.push(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_returns_zeroed_buffer_of_shard_len() {
        let pool = ShardPool::new(2, 4);
        let buf = pool.acquire();
        assert_eq!(buf, vec![0u8; 4]);
    }

    #[test]
    fn released_buffers_are_reused() {
        let pool = ShardPool::new(1, 4);
        let mut buf = pool.acquire();
        buf.copy_from_slice(&[1, 2, 3, 4]);
        pool.release(buf);
        let reused = pool.acquire();
        assert_eq!(reused, vec![0u8; 4], "released buffer must come back zeroed");
    }

    #[test]
    fn empty_pool_still_allocates() {
        let pool = ShardPool::new(0, 4);
        assert_eq!(pool.acquire(), vec![0u8; 4]);
    }
}
