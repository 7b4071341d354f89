//! Bulk transfer in and out of the link store
//!
//! This module handles the two offline paths around the crawl cycle:
//! - Importing newline-delimited URL lists as uncrawled records
//! - Exporting the deduplicated host list of everything ever stored

mod export;
mod import;

pub use export::{export_hosts, export_hosts_to_path, EXPORT_PAGE_SIZE};
pub use import::{import_files, read_url_list};
