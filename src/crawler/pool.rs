//! Worker pool for batch crawling
//!
//! A claimed batch is split into at most `concurrency` contiguous chunks and
//! each chunk becomes one worker task. Workers walk their chunk sequentially:
//! fetch, extract, accumulate. Results only exist in worker memory until the
//! pool has fully drained and the dispatcher merges them; no store writes
//! happen here.
//!
//! Workers poll the shared stop flag before every URL. Once the flag is up a
//! worker abandons the rest of its chunk, leaving those records unclaimed in
//! the store for a later run.

use crate::crawler::extractor::extract_links;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::storage::LinkRecord;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Results accumulated by one pool run
#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// Links extracted from successfully fetched pages, deduplicated
    pub discovered: HashSet<String>,

    /// IDs of every record whose fetch was attempted, success or not
    pub completed: HashSet<i64>,
}

/// Splits a batch into at most `concurrency` contiguous chunks
///
/// Chunk size is the ceiling of `len / concurrency`, so sizes sum to the
/// batch length, no chunk exceeds that ceiling, and no empty chunks are
/// produced. Batches smaller than `concurrency` simply yield fewer chunks.
pub fn partition(batch: Vec<LinkRecord>, concurrency: usize) -> Vec<Vec<LinkRecord>> {
    if batch.is_empty() || concurrency == 0 {
        return Vec::new();
    }

    let chunk_size = batch.len().div_ceil(concurrency);
    batch.chunks(chunk_size).map(|chunk| chunk.to_vec()).collect()
}

/// Runs fetch and extract over every chunk concurrently
///
/// One worker task per chunk. A panicking worker loses its own partial
/// results but never poisons the others; whatever the surviving workers
/// produced is still merged and returned.
pub async fn run_pool(
    chunks: Vec<Vec<LinkRecord>>,
    fetcher: &PageFetcher,
    stop: Arc<AtomicBool>,
) -> PoolOutcome {
    let mut workers = JoinSet::new();

    for chunk in chunks {
        let fetcher = fetcher.clone();
        let stop = Arc::clone(&stop);
        workers.spawn(async move { crawl_chunk(chunk, fetcher, stop).await });
    }

    let mut outcome = PoolOutcome::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(partial) => {
                outcome.discovered.extend(partial.discovered);
                outcome.completed.extend(partial.completed);
            }
            Err(e) => {
                tracing::error!("Crawl worker panicked: {}", e);
            }
        }
    }

    outcome
}

/// Processes one chunk of records sequentially
async fn crawl_chunk(
    chunk: Vec<LinkRecord>,
    fetcher: PageFetcher,
    stop: Arc<AtomicBool>,
) -> PoolOutcome {
    let mut partial = PoolOutcome::default();

    for record in chunk {
        if stop.load(Ordering::Relaxed) {
            tracing::debug!("Stop observed, abandoning remainder of chunk");
            break;
        }

        match fetcher.fetch(&record.url).await {
            FetchOutcome::Success { body } => {
                let links = extract_links(&body);
                tracing::debug!("Fetched {} ({} links)", record.url, links.len());
                partial.discovered.extend(links);
            }
            FetchOutcome::Failure { reason } => {
                tracing::debug!("Fetch failed for {}: {}", record.url, reason);
            }
        }

        // The attempt itself uses the record up, success or not
        partial.completed.insert(record.id);
    }

    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::crawler::fetcher::build_http_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(id: i64, url: &str) -> LinkRecord {
        LinkRecord {
            id,
            url: url.to_string(),
            crawled: false,
        }
    }

    fn numbered_batch(len: usize) -> Vec<LinkRecord> {
        (0..len)
            .map(|i| record(i as i64, &format!("https://example.com/{}", i)))
            .collect()
    }

    fn test_fetcher() -> PageFetcher {
        PageFetcher::new(build_http_client(&CrawlerConfig::default()).unwrap())
    }

    #[test]
    fn test_partition_empty_batch() {
        assert!(partition(Vec::new(), 4).is_empty());
    }

    #[test]
    fn test_partition_zero_concurrency() {
        assert!(partition(numbered_batch(3), 0).is_empty());
    }

    #[test]
    fn test_partition_small_batch_yields_fewer_chunks() {
        let chunks = partition(numbered_batch(2), 8);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_partition_exact_division() {
        let chunks = partition(numbered_batch(8), 4);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() == 2));
    }

    #[test]
    fn test_partition_remainder_in_last_chunk() {
        // 7 across 3 workers: ceil(7/3) = 3, so 3 + 3 + 1
        let chunks = partition(numbered_batch(7), 3);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_partition_preserves_order_and_contiguity() {
        let chunks = partition(numbered_batch(10), 4);
        let flattened: Vec<i64> = chunks.iter().flatten().map(|r| r.id).collect();
        assert_eq!(flattened, (0..10).collect::<Vec<i64>>());
    }

    #[test]
    fn test_partition_properties_hold_across_shapes() {
        for len in 0..=25 {
            for concurrency in 1..=6 {
                let chunks = partition(numbered_batch(len), concurrency);
                let ceiling = if len == 0 { 0 } else { len.div_ceil(concurrency) };

                let total: usize = chunks.iter().map(|c| c.len()).sum();
                assert_eq!(total, len, "len={} c={}", len, concurrency);
                assert!(chunks.len() <= concurrency, "len={} c={}", len, concurrency);
                assert!(
                    chunks.iter().all(|c| !c.is_empty() && c.len() <= ceiling),
                    "len={} c={}",
                    len,
                    concurrency
                );
            }
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_disturb_chunk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fine"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://found.example/a">a</a><a href="https://found.example/b">b</a>"#,
            ))
            .mount(&server)
            .await;

        let batch = vec![
            record(1, &format!("{}/broken", server.uri())),
            record(2, &format!("{}/fine", server.uri())),
        ];
        let outcome = run_pool(partition(batch, 1), &test_fetcher(), Arc::new(AtomicBool::new(false))).await;

        // Both attempts completed, only the healthy page contributed links
        assert_eq!(outcome.completed, [1, 2].into_iter().collect());
        assert_eq!(
            outcome.discovered,
            ["https://found.example/a", "https://found.example/b"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[tokio::test]
    async fn test_discoveries_merge_across_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/one"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://shared.example/">s</a><a href="https://only-one.example/">1</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/two"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://shared.example/">s</a><a href="https://only-two.example/">2</a>"#,
            ))
            .mount(&server)
            .await;

        let batch = vec![
            record(1, &format!("{}/one", server.uri())),
            record(2, &format!("{}/two", server.uri())),
        ];
        // Two chunks of one record each
        let outcome = run_pool(partition(batch, 2), &test_fetcher(), Arc::new(AtomicBool::new(false))).await;

        assert_eq!(outcome.completed.len(), 2);
        assert_eq!(outcome.discovered.len(), 3);
        assert!(outcome.discovered.contains("https://shared.example/"));
    }

    #[tokio::test]
    async fn test_raised_stop_flag_abandons_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(0)
            .mount(&server)
            .await;

        let batch = vec![
            record(1, &format!("{}/a", server.uri())),
            record(2, &format!("{}/b", server.uri())),
        ];
        let outcome = run_pool(partition(batch, 2), &test_fetcher(), Arc::new(AtomicBool::new(true))).await;

        // Flag was already up: nothing fetched, nothing completed
        assert!(outcome.completed.is_empty());
        assert!(outcome.discovered.is_empty());
    }
}
