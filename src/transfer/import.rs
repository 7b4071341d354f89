//! Newline-delimited URL list import
//!
//! Seed lists are plain text files with one URL per line. No URL validation
//! happens on the way in: the store accepts any text, and a bad line simply
//! becomes a record whose fetch fails once and is used up.

use crate::storage::LinkStore;
use crate::LinkwellError;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Reads a newline-delimited URL list
///
/// Lines are trimmed, blank lines are skipped, and duplicates collapse into
/// the returned set.
pub fn read_url_list<R: BufRead>(reader: R) -> std::io::Result<HashSet<String>> {
    let mut urls = HashSet::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            urls.insert(trimmed.to_string());
        }
    }

    Ok(urls)
}

/// Imports every file as a batch of uncrawled records
///
/// Each file is read fully, deduplicated within itself, and inserted as one
/// transaction; duplicates across files insert again. Returns the total
/// number of records inserted.
///
/// # Arguments
///
/// * `store` - The link store receiving the records
/// * `paths` - Text files with one URL per line
pub fn import_files<S: LinkStore>(
    store: &mut S,
    paths: &[PathBuf],
) -> Result<u64, LinkwellError> {
    let mut total = 0u64;

    for path in paths {
        let file = File::open(path)?;
        let urls = read_url_list(BufReader::new(file))?;

        store.insert_new(&urls)?;
        total += urls.len() as u64;
        tracing::info!("Imported {} links from {}", urls.len(), path.display());
    }

    Ok(total)
}
