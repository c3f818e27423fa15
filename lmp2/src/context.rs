//! Explicit parallel execution context
//!
//! The solver never touches the global rayon pool. Every parallel region runs
//! inside the pool owned by an [`ExecutionContext`], and the width of that pool
//! also fixes how the coupling sums are split into private accumulators.

use crate::error::CorrelationError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ExecutionContext {
    num_threads: usize,
    pool: Arc<ThreadPool>,
}

impl ExecutionContext {
    /// Build a context with `num_threads` workers (0 picks rayon's default).
    pub fn new(num_threads: usize) -> Result<Self, CorrelationError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|idx| format!("lmp2-worker-{idx}"))
            .build()?;
        let num_threads = pool.current_num_threads();
        info!("Execution context with {} worker threads", num_threads);
        Ok(ExecutionContext {
            num_threads,
            pool: Arc::new(pool),
        })
    }

    pub fn sequential() -> Result<Self, CorrelationError> {
        Self::new(1)
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Run `op` inside the context's thread pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Chunk length splitting `n_items` into at most one chunk per worker.
    ///
    /// Depends only on `n_items` and the thread count, so accumulators merged
    /// in chunk order give bit-identical sums for a fixed thread count.
    pub fn worker_chunk_len(&self, n_items: usize) -> usize {
        n_items.div_ceil(self.num_threads).max(1)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("num_threads", &self.num_threads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_width_is_used() {
        let context = ExecutionContext::new(3).unwrap();
        assert_eq!(context.num_threads(), 3);
        assert_eq!(context.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn test_worker_chunks_cover_all_items() {
        let context = ExecutionContext::new(4).unwrap();
        assert_eq!(context.worker_chunk_len(10), 3);
        assert_eq!(context.worker_chunk_len(4), 1);
        assert_eq!(context.worker_chunk_len(0), 1);
    }
}
