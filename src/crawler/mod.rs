//! Crawler module for batch fetching and link harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed timeout budget
//! - Link extraction from fetched pages
//! - The bounded-concurrency worker pool
//! - The dispatch loop tying claims and flushes together

mod dispatcher;
mod extractor;
mod fetcher;
mod pool;

pub use dispatcher::{CrawlDispatcher, CrawlSnapshot, DispatchError, RunState};
pub use extractor::extract_links;
pub use fetcher::{build_http_client, FetchFailure, FetchOutcome, PageFetcher};
pub use pool::{partition, run_pool, PoolOutcome};
