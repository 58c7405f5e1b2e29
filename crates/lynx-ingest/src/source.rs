use polars::prelude::DataFrame;

use crate::error::SourceError;
use crate::frame::partition;

/// Rows per batch when a source is not told otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Lazy sequence of batches produced by [`DataSource::extract`].
///
/// An `Err` item ends the extraction; callers should not expect further
/// batches after one.
pub type BatchIter<'a> = Box<dyn Iterator<Item = Result<DataFrame, SourceError>> + 'a>;

/// Produces tabular batches for the pipeline.
pub trait DataSource {
    /// Start reading. No I/O happens until the first batch is pulled.
    fn extract(&mut self) -> BatchIter<'_>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

pub(crate) fn already_extracted<'a>() -> BatchIter<'a> {
    Box::new(std::iter::once(Err(SourceError::AlreadyExtracted)))
}

/// Run `fetch` on first pull, then hand out its result in fixed-size slices.
pub(crate) fn buffered<'a, F>(fetch: F, batch_size: usize) -> BatchIter<'a>
where
    F: FnOnce() -> Result<DataFrame, SourceError> + 'a,
{
    if batch_size == 0 {
        return Box::new(std::iter::once(Err(SourceError::InvalidBatchSize)));
    }
    Box::new(
        std::iter::once_with(fetch).flat_map(move |fetched| match fetched {
            Ok(frame) => partition(&frame, batch_size)
                .into_iter()
                .map(Ok)
                .collect::<Vec<_>>(),
            Err(err) => vec![Err(err)],
        }),
    )
}
