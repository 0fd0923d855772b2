
//! Runs one task per block, in parallel if possible.

use crate::error::UnitResult;
use crate::codec::CodecOptions;

#[cfg(feature = "rayon")]
use rayon::prelude::*;


/// Distributes block tasks over a pool of worker threads.
///
/// Each task receives the index of its block and the disjoint region of the buffer
/// that belongs to this block, so tasks never need to synchronize with each other.
/// A pass returns only after all tasks are complete, or after the first task has failed.
#[derive(Debug)]
pub struct BlockScheduler {

    #[cfg(feature = "rayon")]
    pool: Option<rayon_core::ThreadPool>,
}

impl BlockScheduler {

    /// Create the worker threads requested by the options.
    /// Falls back to sequential processing if the options ask for it,
    /// or if the thread pool cannot be created (for example on wasm).
    pub fn new(options: &CodecOptions) -> Self {
        if !options.parallel {
            return Self::sequential();
        }

        Self::with_thread_pool(options)
    }

    #[cfg(feature = "rayon")]
    fn with_thread_pool(options: &CodecOptions) -> Self {
        let mut builder = rayon_core::ThreadPoolBuilder::new()
            .thread_name(|index| format!("Block Compressor Thread #{}", index));

        if let Some(max_threads) = options.max_threads {
            builder = builder.num_threads(max_threads.max(1));
        }

        // in case thread pool creation fails (for example on wasm),
        // we revert to sequential processing
        match builder.build() {
            Ok(pool) => {
                tracing::debug!(threads = pool.current_num_threads(), "created block worker pool");
                BlockScheduler { pool: Some(pool) }
            },

            Err(error) => {
                tracing::warn!(%error, "cannot create thread pool, processing blocks sequentially");
                Self::sequential()
            },
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn with_thread_pool(_: &CodecOptions) -> Self {
        Self::sequential()
    }

    /// Process all blocks on the calling thread, in increasing block order.
    pub fn sequential() -> Self {
        BlockScheduler {
            #[cfg(feature = "rayon")]
            pool: None,
        }
    }

    /// Whether tasks are distributed over multiple threads.
    pub fn is_parallel(&self) -> bool {
        self.worker_count() > 1
    }

    /// The number of tasks that may run at the same time.
    pub fn worker_count(&self) -> usize {
        #[cfg(feature = "rayon")] {
            if let Some(pool) = &self.pool {
                return pool.current_num_threads();
            }
        }

        1
    }

    /// Split the buffer into regions of `stride` elements and call the task
    /// once for each region, with the index of the region.
    ///
    /// Returns the error of a failed task. As soon as one task has failed,
    /// no further tasks are started, but tasks already running are completed.
    /// A panic inside a task is propagated to the caller.
    pub fn for_each_block_mut<T, F>(&self, buffer: &mut [T], stride: usize, task: F) -> UnitResult
        where T: Send, F: Fn(usize, &mut [T]) -> UnitResult + Send + Sync
    {
        debug_assert!(stride > 0, "block stride must not be zero");
        debug_assert_eq!(buffer.len() % stride, 0, "buffer must contain whole blocks");

        #[cfg(feature = "rayon")] {
            if let Some(pool) = &self.pool {
                return pool.install(|| {
                    buffer.par_chunks_mut(stride).enumerate()
                        .try_for_each(|(block_index, region)| task(block_index, region))
                });
            }
        }

        buffer.chunks_mut(stride).enumerate()
            .try_for_each(|(block_index, region)| task(block_index, region))
    }
}
