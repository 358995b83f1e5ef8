//! Pipeline orchestrator
//!
//! Chunks input rows, dispatches concurrent translation calls bounded
//! by a semaphore, merges cache hits with fresh results, retries failed
//! chunk dispatches with exponential backoff, and reassembles everything
//! into one ordered result sequence. Row correspondence is the core
//! invariant: the output always has exactly one result per input row,
//! in input order, with failures captured as data instead of aborting
//! the run (unless fail-fast is enabled).

pub mod report;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, TranslationCache};
use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{Row, RowResult, RunSummary, TranslationRequest};
use crate::core::wrap::wrap_to_source;
use crate::services::{ItemOutcome, TranslationService};

/// Orchestrates one translation run
pub struct Pipeline {
    worker: Arc<ChunkWorker>,
    max_concurrent: usize,
    progress: Option<ProgressBar>,
}

impl Pipeline {
    pub fn new(
        config: Arc<TranslatorConfig>,
        service: Arc<dyn TranslationService>,
        cache: Option<Arc<dyn TranslationCache>>,
    ) -> Self {
        let run_id = format!("{:x}", chrono::Utc::now().timestamp_millis());
        let max_concurrent = config.max_concurrent;
        Self {
            worker: Arc::new(ChunkWorker {
                config,
                service,
                cache,
                run_id,
                cache_writes: Mutex::new(Vec::new()),
            }),
            max_concurrent,
            progress: None,
        }
    }

    /// Attach a progress bar advanced once per completed chunk
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.worker.run_id
    }

    pub fn chunk_count(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.worker.config.chunk_size)
    }

    /// Translate all rows, returning one result per row in input order
    pub async fn run(&self, rows: Vec<Row>) -> Result<Vec<RowResult>> {
        let row_count = rows.len();
        let chunk_size = self.worker.config.chunk_size;
        let chunks: Vec<Vec<Row>> = rows
            .chunks(chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        info!(
            run_id = %self.worker.run_id,
            rows = row_count,
            chunks = chunks.len(),
            service = self.worker.service.name(),
            "Starting translation run"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| {
                    TranslationError::InternalError(format!("semaphore closed: {}", e))
                })?;
                let results = worker.process_chunk(index, &chunk).await?;
                Ok::<_, TranslationError>((index, results))
            });
        }

        let mut slots: Vec<Option<Vec<RowResult>>> = Vec::new();
        slots.resize_with(join_set.len(), || None);

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok((index, results))) => {
                    slots[index] = Some(results);
                    if let Some(progress) = &self.progress {
                        progress.inc(1);
                    }
                }
                Ok(Err(e)) => {
                    // Fail-fast: cancel everything still in flight
                    error!(run_id = %self.worker.run_id, "Aborting run: {}", e);
                    join_set.abort_all();
                    return Err(e);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    join_set.abort_all();
                    return Err(TranslationError::InternalError(format!(
                        "chunk task panicked: {}",
                        e
                    )));
                }
            }
        }

        self.worker.flush_cache_writes().await;

        let results: Vec<RowResult> = slots.into_iter().flatten().flatten().collect();
        if results.len() != row_count {
            return Err(TranslationError::InternalError(format!(
                "result count {} does not match input row count {}",
                results.len(),
                row_count
            )));
        }

        let summary = RunSummary::from_results(&results);
        info!(
            run_id = %self.worker.run_id,
            total = summary.total,
            translated = summary.translated,
            skipped = summary.skipped,
            failed = summary.failed,
            "Translation run finished"
        );

        Ok(results)
    }
}

/// Per-chunk state shared by all chunk tasks of a run
struct ChunkWorker {
    config: Arc<TranslatorConfig>,
    service: Arc<dyn TranslationService>,
    cache: Option<Arc<dyn TranslationCache>>,
    run_id: String,
    cache_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl ChunkWorker {
    /// Translate one chunk: cache lookup, dispatch, merge.
    ///
    /// Returns `Err` only when fail-fast should abort the run; all
    /// other failures are embedded in the returned results.
    async fn process_chunk(&self, index: usize, rows: &[Row]) -> Result<Vec<RowResult>> {
        let start = Instant::now();
        let mut slots: Vec<Option<RowResult>> = Vec::new();
        slots.resize_with(rows.len(), || None);
        let mut miss_indices: Vec<usize> = Vec::new();
        let mut cache_hits = 0usize;

        for (i, row) in rows.iter().enumerate() {
            if row.is_blank() {
                slots[i] = Some(RowResult::ok(row.row_num, row.text.clone(), String::new()));
                continue;
            }

            if let Some(cache) = &self.cache {
                let request = self.request_for(&row.text);
                if let Some(entry) = cache.get(&request.fingerprint()) {
                    cache_hits += 1;
                    slots[i] = Some(RowResult::ok(
                        row.row_num,
                        row.text.clone(),
                        entry.translated_text,
                    ));
                    continue;
                }
            }

            miss_indices.push(i);
        }

        if !miss_indices.is_empty() {
            let texts: Vec<String> = miss_indices
                .iter()
                .map(|&i| rows[i].text.clone())
                .collect();

            match self.dispatch_with_retry(index, &texts).await {
                Ok(outcomes) => {
                    for (&i, outcome) in miss_indices.iter().zip(outcomes) {
                        let row = &rows[i];
                        match outcome {
                            Ok(translated) => {
                                self.store_in_cache(&row.text, &translated);
                                slots[i] = Some(RowResult::ok(
                                    row.row_num,
                                    row.text.clone(),
                                    translated,
                                ));
                            }
                            Err(e) if self.config.fail_fast => return Err(e),
                            Err(e) => {
                                slots[i] = Some(RowResult::failed(
                                    row.row_num,
                                    row.text.clone(),
                                    e.to_string(),
                                ));
                            }
                        }
                    }
                }
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    // Chunk-level failure: every miss in this chunk
                    // carries the shared error, other chunks continue.
                    let message = e.to_string();
                    warn!(
                        run_id = %self.run_id,
                        chunk = index + 1,
                        "Chunk failed after retries: {}",
                        message
                    );
                    for &i in &miss_indices {
                        slots[i] = Some(RowResult::failed(
                            rows[i].row_num,
                            rows[i].text.clone(),
                            message.clone(),
                        ));
                    }
                }
            }
        }

        let mut results: Vec<RowResult> = slots.into_iter().flatten().collect();

        if self.config.preserve_line_lengths {
            for result in &mut results {
                if result.error.is_none() && !result.translated_text.is_empty() {
                    result.translated_text = wrap_to_source(
                        &result.source_text,
                        &result.translated_text,
                        self.config.line_length_tolerance,
                    );
                }
            }
        }

        let summary = RunSummary::from_results(&results);
        info!(
            run_id = %self.run_id,
            chunk = index + 1,
            translated = summary.translated,
            skipped = summary.skipped,
            failed = summary.failed,
            cache_hits,
            cache_misses = miss_indices.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Chunk complete"
        );

        Ok(results)
    }

    /// Dispatch a batch with up to `max_retries` attempts and
    /// exponential backoff. A mismatched batch length counts as a
    /// failed attempt just like an outright error.
    async fn dispatch_with_retry(
        &self,
        chunk_index: usize,
        texts: &[String],
    ) -> Result<Vec<ItemOutcome>> {
        let max_retries = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=max_retries {
            if attempt > 1 {
                let backoff = Duration::from_secs(2u64.pow(attempt - 1));
                debug!(
                    run_id = %self.run_id,
                    chunk = chunk_index + 1,
                    "Retrying chunk in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    max_retries
                );
                sleep(backoff).await;
            }

            match self.service.translate_batch(texts).await {
                Ok(outcomes) if outcomes.len() == texts.len() => {
                    if attempt > 1 {
                        info!(
                            run_id = %self.run_id,
                            chunk = chunk_index + 1,
                            "Chunk recovered on attempt {}",
                            attempt
                        );
                    }
                    return Ok(outcomes);
                }
                Ok(outcomes) => {
                    let e = TranslationError::BatchSizeMismatch {
                        expected: texts.len(),
                        actual: outcomes.len(),
                    };
                    warn!(
                        run_id = %self.run_id,
                        chunk = chunk_index + 1,
                        "Attempt {}/{} failed: {}",
                        attempt,
                        max_retries,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    warn!(
                        run_id = %self.run_id,
                        chunk = chunk_index + 1,
                        "Attempt {}/{} failed: {}",
                        attempt,
                        max_retries,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TranslationError::ProviderError {
            message: "chunk dispatch failed without attempts".to_string(),
        }))
    }

    fn request_for(&self, text: &str) -> TranslationRequest {
        TranslationRequest::new(text, &*self.config.source_lang, &*self.config.target_lang)
    }

    /// Write-behind cache population: never blocks the result path,
    /// flushed before the run returns.
    fn store_in_cache(&self, source_text: &str, translated: &str) {
        let Some(cache) = &self.cache else { return };
        if translated.is_empty() {
            return;
        }

        let request = self.request_for(source_text);
        let entry = CacheEntry::new(&request, translated);
        let cache = Arc::clone(cache);
        let handle = tokio::task::spawn_blocking(move || cache.set(&request.fingerprint(), entry));

        if let Ok(mut writes) = self.cache_writes.lock() {
            writes.push(handle);
        }
    }

    async fn flush_cache_writes(&self) {
        let handles = match self.cache_writes.lock() {
            Ok(mut writes) => std::mem::take(&mut *writes),
            Err(_) => return,
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted service for pipeline tests
    struct MockService {
        batches: Mutex<Vec<Vec<String>>>,
        calls: AtomicUsize,
        fail_marker: Option<String>,
        fail_first_attempts: usize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockService {
        fn suffixing() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_marker: None,
                fail_first_attempts: 0,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn failing_on(marker: &str) -> Self {
            Self {
                fail_marker: Some(marker.to_string()),
                ..Self::suffixing()
            }
        }

        fn flaky(failures: usize) -> Self {
            Self {
                fail_first_attempts: failures,
                ..Self::suffixing()
            }
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .map(|batch| batch.len())
                .collect()
        }
    }

    #[async_trait]
    impl TranslationService for MockService {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemOutcome>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().unwrap().push(texts.to_vec());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if call < self.fail_first_attempts {
                return Err(TranslationError::ProviderError {
                    message: "transient".to_string(),
                });
            }

            if let Some(marker) = &self.fail_marker {
                if texts.iter().any(|text| text.contains(marker)) {
                    return Err(TranslationError::ProviderError {
                        message: "marked batch failed".to_string(),
                    });
                }
            }

            Ok(texts.iter().map(|text| Ok(format!("{}-de", text))).collect())
        }
    }

    fn rows(texts: &[&str]) -> Vec<Row> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Row::new(i + 2, *text))
            .collect()
    }

    fn pipeline_with(
        service: Arc<MockService>,
        cache: Option<Arc<dyn TranslationCache>>,
        config: TranslatorConfig,
    ) -> Pipeline {
        Pipeline::new(Arc::new(config), service, cache)
    }

    fn quick_config() -> TranslatorConfig {
        TranslatorConfig {
            chunk_size: 2,
            max_concurrent: 4,
            max_retries: 3,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_row_count_and_order_preserved() {
        let service = Arc::new(MockService::suffixing());
        let pipeline = pipeline_with(Arc::clone(&service), None, quick_config());

        let input = rows(&["one", "two", "", "four", "five"]);
        let results = pipeline.run(input).await.unwrap();

        assert_eq!(results.len(), 5);
        let row_nums: Vec<usize> = results.iter().map(|r| r.row_num).collect();
        assert_eq!(row_nums, vec![2, 3, 4, 5, 6]);
        assert_eq!(results[0].translated_text, "one-de");
        assert_eq!(results[2].translated_text, "");
        assert!(results[2].is_skipped());
        assert_eq!(results[4].translated_text, "five-de");
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunk_count_and_batch_sizes() {
        let service = Arc::new(MockService::suffixing());
        let mut config = quick_config();
        config.chunk_size = 3;
        let pipeline = pipeline_with(Arc::clone(&service), None, config);

        let input = rows(&["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(pipeline.chunk_count(input.len()), 3);
        pipeline.run(input).await.unwrap();

        let mut sizes = service.batch_sizes();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 3, 3]);
        assert!(sizes.iter().all(|&size| size <= 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_avoids_second_provider_call() {
        let service = Arc::new(MockService::suffixing());
        let cache: Arc<dyn TranslationCache> = Arc::new(MemoryCache::new(100, 24));
        let config = quick_config();

        let first = pipeline_with(Arc::clone(&service), Some(Arc::clone(&cache)), config.clone());
        first.run(rows(&["hello"])).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        let second = pipeline_with(Arc::clone(&service), Some(Arc::clone(&cache)), config);
        let results = second.run(rows(&["hello"])).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(results[0].translated_text, "hello-de");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_with_backoff() {
        let service = Arc::new(MockService::flaky(2));
        let mut config = quick_config();
        config.chunk_size = 10;
        let pipeline = pipeline_with(Arc::clone(&service), None, config);

        let start = tokio::time::Instant::now();
        let results = pipeline.run(rows(&["one", "two"])).await.unwrap();

        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        assert!(results.iter().all(|r| r.error.is_none()));
        // Backoff between the three attempts: 2s then 4s
        assert!(start.elapsed() >= Duration::from_secs(6));
        assert!(start.elapsed() < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_chunk_marks_only_its_rows() {
        let service = Arc::new(MockService::failing_on("bad"));
        let mut config = quick_config();
        config.chunk_size = 1;
        let pipeline = pipeline_with(Arc::clone(&service), None, config);

        let results = pipeline.run(rows(&["good", "bad", "fine"])).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].error.is_none());
        assert!(results[1].error.as_deref().unwrap().contains("marked batch"));
        assert!(results[2].error.is_none());
        // The failing chunk was retried, the others were not
        assert_eq!(service.calls.load(Ordering::SeqCst), 2 + 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_aborts_before_later_chunks() {
        let service = Arc::new(MockService::failing_on("bad"));
        let mut config = quick_config();
        config.chunk_size = 1;
        config.max_concurrent = 1;
        config.max_retries = 1;
        config.fail_fast = true;
        let pipeline = pipeline_with(Arc::clone(&service), None, config);

        let err = pipeline
            .run(rows(&["good", "bad", "never-sent"]))
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::ProviderError { .. }));
        let batches = service.batches.lock().unwrap().clone();
        assert_eq!(batches.len(), 2);
        assert!(!batches
            .iter()
            .any(|batch| batch.iter().any(|text| text == "never-sent")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_stays_within_bound() {
        let service = Arc::new(MockService::suffixing());
        let mut config = quick_config();
        config.chunk_size = 1;
        config.max_concurrent = 5;
        let pipeline = pipeline_with(Arc::clone(&service), None, config);

        let input: Vec<Row> = (0..20).map(|i| Row::new(i + 2, format!("row {}", i))).collect();
        pipeline.run(input).await.unwrap();

        assert!(service.max_in_flight.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_line_wrapping_is_applied() {
        let service = Arc::new(MockService::suffixing());
        let mut config = quick_config();
        config.preserve_line_lengths = true;
        config.line_length_tolerance = 1.2;
        let pipeline = pipeline_with(Arc::clone(&service), None, config);

        // "word word-de" is 12 chars against a 9-char source (bound 10)
        let results = pipeline.run(rows(&["word word"])).await.unwrap();
        assert!(results[0].translated_text.contains('\n'));
    }
}
