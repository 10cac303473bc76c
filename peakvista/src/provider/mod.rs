//! Elevation tile download
//!
//! [`NetworkFetcher`] turns a [`TileId`](crate::coord::TileId) into raw tile
//! bytes from an XYZ [`TileEndpoint`], with a per-attempt timeout and
//! exponential backoff for transient failures. The HTTP transport sits behind
//! [`AsyncHttpClient`] so tests can script responses.
//!
//! ```ignore
//! use peakvista::provider::{FetchConfig, NetworkFetcher, ReqwestClient, TileEndpoint};
//!
//! let client = ReqwestClient::new(Duration::from_secs(5))?;
//! let fetcher = NetworkFetcher::new(client, TileEndpoint::default(), FetchConfig::default());
//! let bytes = fetcher.fetch_tile(tile).await?;
//! ```

mod endpoint;
mod fetcher;
mod http;

pub use endpoint::{TileEndpoint, DEFAULT_EXTENSION, DEFAULT_ORIGIN, DEFAULT_SAMPLING_ZOOM};
pub use fetcher::{
    FetchConfig, FetchError, NetworkFetcher, RetryPolicy, DEFAULT_BASE_DELAY_MS,
    DEFAULT_JITTER_RATIO, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT_MS,
};
pub use http::{AsyncHttpClient, HttpError, HttpResponse, ReqwestClient};

#[cfg(test)]
pub use http::tests::{MockAsyncHttpClient, MockReply};
