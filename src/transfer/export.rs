//! Unique-host export
//!
//! Reduces every stored link to its host component and writes the
//! deduplicated list, one host per line, sorted. The store is scanned in
//! fixed-size pages so memory stays bounded however large the database has
//! grown; only the host set itself is held in full.

use crate::storage::LinkStore;
use crate::LinkwellError;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use url::Url;

/// How many links are pulled from the store per page
pub const EXPORT_PAGE_SIZE: u64 = 100_000;

/// Writes the deduplicated host list for every stored link
///
/// Crawled and uncrawled records both count. Links that do not parse as
/// URLs, or parse without a host, are skipped silently. Returns the number
/// of distinct hosts written.
pub fn export_hosts<S: LinkStore, W: Write>(
    store: &S,
    writer: &mut W,
) -> Result<u64, LinkwellError> {
    export_hosts_paged(store, writer, EXPORT_PAGE_SIZE)
}

/// Exports the host list to a file at the given path
pub fn export_hosts_to_path<S: LinkStore>(
    store: &S,
    output_path: &Path,
) -> Result<u64, LinkwellError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    let hosts = export_hosts(store, &mut writer)?;
    writer.flush()?;
    Ok(hosts)
}

fn export_hosts_paged<S: LinkStore, W: Write>(
    store: &S,
    writer: &mut W,
    page_size: u64,
) -> Result<u64, LinkwellError> {
    let mut hosts: BTreeSet<String> = BTreeSet::new();

    let mut offset = 0u64;
    loop {
        let page = store.load_url_page(offset, page_size)?;
        if page.is_empty() {
            break;
        }

        for link in &page {
            if let Some(host) = host_component(link) {
                hosts.insert(host);
            }
        }

        offset += page_size;
    }

    for host in &hosts {
        writeln!(writer, "{}", host)?;
    }

    tracing::info!("Exported {} unique hosts", hosts.len());
    Ok(hosts.len() as u64)
}

/// Reduces a link to its host, keeping an explicit port
///
/// Default ports are normalized away during parsing, so `:80` on an HTTP
/// link never shows up in the export.
fn host_component(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?;

    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
