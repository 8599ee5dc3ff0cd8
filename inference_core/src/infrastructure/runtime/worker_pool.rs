// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Pool (document preprocessing)
//!
//! Parallel workers that chunk and extract metadata from documents,
//! independent of inference. Backed by a `rayon::ThreadPool` the way the
//! teacher sizes its own worker pools off `std::thread::available_parallelism`;
//! admission is bounded (`max_queue_size`) and fails fast with `QueueFull`
//! rather than blocking the caller, matching the Scheduler's backpressure
//! discipline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver};
use parking_lot::Mutex;

use inference_core_domain::error::InferenceError;

#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub max_workers: usize,
    pub max_queue_size: usize,
    pub task_timeout: Duration,
    pub batch_size: usize,
    pub batch_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            max_queue_size: 1000,
            task_timeout: Duration::from_secs(5 * 60),
            batch_size: 10,
            batch_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            overlap_size: 50,
        }
    }
}

/// Sentence-aware split on `[.!?]`, accumulating sentences into chunks up
/// to `chunk_size` characters, then prefixing each chunk (after the first)
/// with the last `overlap_size` words of the previous chunk. Empty input
/// yields a single trivial chunk.
pub fn chunk_document(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![String::new()];
    }

    let sentences = split_sentences(text);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        if !current.is_empty() && current.len() + sentence.len() > config.chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.is_empty() {
        chunks.push(text.to_string());
    }

    apply_overlap(chunks, config.overlap_size)
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            sentences.push(current.trim().to_string());
            current.clear();
        }
    }
    let remainder = current.trim();
    if !remainder.is_empty() {
        sentences.push(remainder.to_string());
    }
    sentences.into_iter().filter(|s| !s.is_empty()).collect()
}

fn apply_overlap(chunks: Vec<String>, overlap_size: usize) -> Vec<String> {
    if overlap_size == 0 || chunks.len() < 2 {
        return chunks;
    }
    let mut result = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        if index == 0 {
            result.push(chunk.clone());
            continue;
        }
        let previous_words: Vec<&str> = chunks[index - 1].split_whitespace().collect();
        let overlap_start = previous_words.len().saturating_sub(overlap_size);
        let overlap_text = previous_words[overlap_start..].join(" ");
        if overlap_text.is_empty() {
            result.push(chunk.clone());
        } else {
            result.push(format!("{overlap_text} {chunk}"));
        }
    }
    result
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    inflight: Arc<AtomicUsize>,
    config: WorkerPoolConfig,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Result<Self, InferenceError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers.max(1))
            .build()
            .map_err(|e| InferenceError::internal(format!("failed to build worker pool: {e}")))?;
        Ok(Self {
            pool,
            inflight: Arc::new(AtomicUsize::new(0)),
            config,
        })
    }

    pub fn queue_len(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }

    /// Submits a chunking job, failing fast with `QueueFull` once
    /// `max_queue_size` in-flight jobs are outstanding. Returns a receiver
    /// the caller can wait on up to `task_timeout`.
    pub fn submit_chunking(
        &self,
        text: String,
        chunking: ChunkingConfig,
    ) -> Result<Receiver<Vec<String>>, InferenceError> {
        if self.inflight.load(Ordering::SeqCst) >= self.config.max_queue_size {
            return Err(InferenceError::queue_full(format!(
                "worker pool at capacity ({})",
                self.config.max_queue_size
            )));
        }
        self.inflight.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = bounded(1);
        let inflight = self.inflight.clone();
        self.pool.spawn(move || {
            let chunks = chunk_document(&text, &chunking);
            let _ = tx.send(chunks);
            inflight.fetch_sub(1, Ordering::SeqCst);
        });
        Ok(rx)
    }

    pub fn task_timeout(&self) -> Duration {
        self.config.task_timeout
    }
}

/// Flushes accumulated items once `batch_size` is reached or `batch_timeout`
/// has elapsed since the first item in the current batch, whichever comes
/// first when `should_flush` is polled.
pub struct Batcher<T> {
    pending: Mutex<(Vec<T>, Option<std::time::Instant>)>,
    batch_size: usize,
    batch_timeout: Duration,
}

impl<T> Batcher<T> {
    pub fn new(batch_size: usize, batch_timeout: Duration) -> Self {
        Self {
            pending: Mutex::new((Vec::new(), None)),
            batch_size,
            batch_timeout,
        }
    }

    pub fn push(&self, item: T) {
        let mut state = self.pending.lock();
        if state.0.is_empty() {
            state.1 = Some(std::time::Instant::now());
        }
        state.0.push(item);
    }

    pub fn should_flush(&self) -> bool {
        let state = self.pending.lock();
        if state.0.len() >= self.batch_size {
            return true;
        }
        matches!(state.1, Some(started) if started.elapsed() >= self.batch_timeout)
    }

    pub fn drain(&self) -> Vec<T> {
        let mut state = self.pending.lock();
        state.1 = None;
        std::mem::take(&mut state.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_single_trivial_chunk() {
        let chunks = chunk_document("", &ChunkingConfig::default());
        assert_eq!(chunks, vec![String::new()]);
    }

    #[test]
    fn every_non_final_chunk_respects_chunk_size_before_overlap() {
        let config = ChunkingConfig {
            chunk_size: 5,
            overlap_size: 1,
        };
        let chunks = chunk_document("A. B. C. D.", &config);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn concatenation_after_overlap_strip_equals_input() {
        let config = ChunkingConfig {
            chunk_size: 5,
            overlap_size: 1,
        };
        let input = "A. B. C. D.";
        let chunks = chunk_document(input, &config);
        let first_words: Vec<&str> = chunks[0].split_whitespace().collect();
        let mut rebuilt = first_words.join(" ");
        for chunk in &chunks[1..] {
            let words: Vec<&str> = chunk.split_whitespace().collect();
            let stripped = &words[config.overlap_size.min(words.len())..];
            if !rebuilt.is_empty() {
                rebuilt.push(' ');
            }
            rebuilt.push_str(&stripped.join(" "));
        }
        let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(normalize(&rebuilt), normalize(input));
    }

    #[test]
    fn queue_full_once_max_queue_size_outstanding() {
        let config = WorkerPoolConfig {
            max_workers: 0,
            max_queue_size: 1,
            ..WorkerPoolConfig::default()
        };
        let pool = WorkerPool::new(WorkerPoolConfig { max_workers: 1, ..config }).unwrap();
        pool.inflight.fetch_add(1, Ordering::SeqCst);
        let result = pool.submit_chunking("hello world".into(), ChunkingConfig::default());
        assert!(matches!(result, Err(InferenceError::QueueFull(_))));
    }

    #[test]
    fn batcher_flushes_at_batch_size() {
        let batcher: Batcher<u32> = Batcher::new(3, Duration::from_secs(5));
        batcher.push(1);
        batcher.push(2);
        assert!(!batcher.should_flush());
        batcher.push(3);
        assert!(batcher.should_flush());
        assert_eq!(batcher.drain(), vec![1, 2, 3]);
    }
}
