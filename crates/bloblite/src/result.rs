//! Operation results

use crate::etag::ETag;

/// Outcome of a successful backend read or write
///
/// Reads carry the loaded value; writes use the default `()` payload and carry
/// only the new ETag. A result is only built once the backend has produced an
/// ETag, so `etag()` is always meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobOperationResult<T = ()> {
    result: T,
    etag: ETag,
}

impl BlobOperationResult<()> {
    /// Create a result for an operation that returns no content
    pub fn from_etag(etag: ETag) -> Self {
        Self { result: (), etag }
    }
}

impl<T> BlobOperationResult<T> {
    /// Create a result carrying a value and its ETag
    pub fn new(result: T, etag: ETag) -> Self {
        Self { result, etag }
    }

    /// The loaded value
    pub fn result(&self) -> &T {
        &self.result
    }

    /// The ETag of the blob version this result refers to
    pub fn etag(&self) -> &ETag {
        &self.etag
    }

    /// Consume the result and return the value
    pub fn into_result(self) -> T {
        self.result
    }

    /// Split into value and ETag
    pub fn into_parts(self) -> (T, ETag) {
        (self.result, self.etag)
    }

    /// Transform the value, keeping the ETag
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BlobOperationResult<U> {
        BlobOperationResult {
            result: f(self.result),
            etag: self.etag,
        }
    }
}
