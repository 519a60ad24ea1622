// ddlog - core/source.rs
//
// The seam between query logic and the remote log API. The HTTP client in
// `platform::datadog` implements it; tests substitute in-memory fakes.

use crate::core::model::{QueryResponse, QueryWindow};
use crate::util::error::ApiError;

/// Anything that can answer a log query for a time window.
pub trait LogSource {
    /// Fetch one page of entries matching `query` in `window`, in ascending
    /// timestamp order. `continuation` is the previous page's token.
    fn search(
        &self,
        query: &str,
        window: &QueryWindow,
        continuation: Option<&str>,
    ) -> Result<QueryResponse, ApiError>;
}

impl<T: LogSource + ?Sized> LogSource for &T {
    fn search(
        &self,
        query: &str,
        window: &QueryWindow,
        continuation: Option<&str>,
    ) -> Result<QueryResponse, ApiError> {
        (**self).search(query, window, continuation)
    }
}
