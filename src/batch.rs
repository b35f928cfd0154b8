//! Fixed-size batch iteration with a caller-controlled yield point.
//!
//! Long passes (resolving tens of thousands of sources, filtering a large
//! record set) call the yield callback after every batch. The callback is
//! purely cooperative: batch size and yields never change the result.

use serde::Serialize;

/// Default number of items processed between yields.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Progress reported after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// Items processed so far.
    pub done: usize,
    pub total: usize,
    /// 1-based index of the batch just finished.
    pub batch: usize,
}

/// Run `f` over `items` in batches of `batch_size`, calling `on_yield` after
/// each batch. A `batch_size` of 0 is treated as 1.
pub fn for_each_batch<'a, T, F, Y>(items: &'a [T], batch_size: usize, mut f: F, mut on_yield: Y)
where
    F: FnMut(&'a T),
    Y: FnMut(BatchProgress),
{
    let size = batch_size.max(1);
    let total = items.len();
    let mut done = 0;
    for (i, chunk) in items.chunks(size).enumerate() {
        for item in chunk {
            f(item);
        }
        done += chunk.len();
        on_yield(BatchProgress {
            done,
            total,
            batch: i + 1,
        });
    }
}

/// Map `items` in batches, collecting the results in input order.
pub fn map_batched<T, U, F, Y>(items: &[T], batch_size: usize, mut f: F, on_yield: Y) -> Vec<U>
where
    F: FnMut(&T) -> U,
    Y: FnMut(BatchProgress),
{
    let mut out = Vec::with_capacity(items.len());
    for_each_batch(items, batch_size, |item| out.push(f(item)), on_yield);
    out
}
