//! Crawler module for the capture pipeline and its worker pools
//!
//! This module contains the core run logic, including:
//! - HTTP fetching for the sitemap and assets
//! - Round-robin worker pools with per-URL failure attribution
//! - The shared progress log
//! - Page capture through browser sessions
//! - Overall run coordination

mod capture;
mod coordinator;
mod fetcher;
mod pool;
mod progress;

pub use capture::{capture_worker, CaptureContext, PageRecord};
pub use coordinator::{run_snapshot, run_verify_only, Pipeline};
pub use fetcher::{build_http_client, fetch_url, FetchedBody};
pub use pool::{partition, run_pool, Ledgered};
pub use progress::{ProgressLine, ProgressSink};

pub(crate) use capture::decode_page_object;
