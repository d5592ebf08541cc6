//! Byte sources for images referenced by a scene.
//!
//! Rasterizers never reach the network directly: every external image is resolved through a
//! [`ResourceFetcher`], typically the image proxy client.

mod fs;
mod proxy;

use async_trait::async_trait;

use crate::foundation::error::PromoResult;

pub use fs::{FsFetcher, normalize_rel_path};
pub use proxy::{ProxyFetcher, parse_proxy_error, proxy_url};

/// Returns the raw bytes behind a resource URL or path.
///
/// Any failure is reported as [`PromoError::ResourceLoad`](crate::PromoError::ResourceLoad).
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PromoResult<Vec<u8>>;
}

/// Whether `url` names a remote resource rather than a local path.
pub fn is_remote(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
