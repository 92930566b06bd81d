//! Aggregation Engine
//!
//! Per-sender debounce buffers. Every submission for a sender rearms that
//! sender's flush timer; when the timer fires the buffered texts are merged
//! into the last payload and handed to the delivery collaborator.
//!
//! Locking: the `DashMap` entry guard is the per-key lock. Lookup-or-create,
//! mutation and timer cancel+rearm all happen while it is held. A timer only
//! flushes if the generation it was armed with is still current, checked and
//! removed atomically with `remove_if`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::merge::{merge_texts, rebuild_payload, Annotation};
use super::normalize::normalize;
use super::types::{Accepted, DeliveryError, Shape, SubmitError};

/// Downstream collaborator receiving merged payloads.
///
/// Called once per flush on a detached task; the result is only logged.
pub trait Deliver: Send + Sync + 'static {
    fn deliver(&self, payload: Value) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Pending state for one sender while its burst is open.
struct BufferState {
    key: String,
    texts: Vec<String>,
    last_payload: Value,
    shape: Shape,
    first_timestamp: DateTime<Utc>,
    last_timestamp: DateTime<Utc>,
    /// Generation of the currently armed timer.
    generation: u64,
    pending_flush: Option<JoinHandle<()>>,
}

impl BufferState {
    fn new(key: String, payload: Value, shape: Shape, now: DateTime<Utc>) -> Self {
        Self {
            key,
            texts: Vec::new(),
            last_payload: payload,
            shape,
            first_timestamp: now,
            last_timestamp: now,
            generation: 0,
            pending_flush: None,
        }
    }

    /// Fold one event into the burst. Exact-match duplicates are dropped.
    fn record(&mut self, text: String, payload: Value, shape: Shape, now: DateTime<Utc>) {
        if !text.is_empty() && !self.texts.contains(&text) {
            self.texts.push(text);
        }
        self.last_payload = payload;
        self.shape = shape;
        self.last_timestamp = now;
    }

    /// Cancel the outstanding timer (if any) and install a new one.
    fn rearm(&mut self, generation: u64, handle: JoinHandle<()>) {
        if let Some(previous) = self.pending_flush.take() {
            previous.abort();
        }
        self.generation = generation;
        self.pending_flush = Some(handle);
    }
}

struct Inner<D> {
    buffers: DashMap<String, BufferState>,
    window: Duration,
    annotate: bool,
    deliver: Arc<D>,
    next_generation: AtomicU64,
}

/// Debounce engine keyed by sender id.
///
/// Cheap to clone; clones share the same buffers. Must be used from within a
/// Tokio runtime since timers and deliveries are spawned tasks.
pub struct Aggregator<D> {
    inner: Arc<Inner<D>>,
}

impl<D> Clone for Aggregator<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Deliver> Aggregator<D> {
    /// Create an engine flushing each sender `window_ms` after its last event.
    pub fn new(window_ms: u64, deliver: D) -> Self {
        Self::with_options(window_ms, false, deliver)
    }

    /// Like [`Aggregator::new`]; `annotate` stamps `source`, `firstTimestamp`
    /// and `lastTimestamp` onto flushed payloads.
    pub fn with_options(window_ms: u64, annotate: bool, deliver: D) -> Self {
        Self {
            inner: Arc::new(Inner {
                buffers: DashMap::new(),
                window: Duration::from_millis(window_ms),
                annotate,
                deliver: Arc::new(deliver),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Buffer one inbound event and (re)arm its sender's flush timer.
    pub fn submit(&self, payload: Value) -> Result<Accepted, SubmitError> {
        let normalized = normalize(&payload);
        let Some(key) = normalized.key else {
            debug!("Rejecting event without waId");
            return Err(SubmitError::MissingKey);
        };

        let now = Utc::now();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        let mut state = self
            .inner
            .buffers
            .entry(key.clone())
            .or_insert_with(|| BufferState::new(key.clone(), Value::Null, normalized.shape, now));

        state.record(normalized.text, payload, normalized.shape, now);
        let handle = Inner::arm(&self.inner, key, generation);
        state.rearm(generation, handle);

        debug!(
            wa_id = %state.key,
            texts = state.texts.len(),
            shape = %state.shape,
            generation,
            "Event buffered"
        );

        Ok(Accepted {
            window_ms: self.window_ms(),
        })
    }

    /// Configured debounce window in milliseconds.
    pub fn window_ms(&self) -> u64 {
        self.inner.window.as_millis() as u64
    }

    /// Number of senders with an open burst.
    pub fn pending_keys(&self) -> usize {
        self.inner.buffers.len()
    }

    /// Whether `key` currently has unflushed events.
    pub fn is_buffering(&self, key: &str) -> bool {
        self.inner.buffers.contains_key(key)
    }

    /// Capture time of the first event in `key`'s open burst.
    pub fn burst_started_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.inner.buffers.get(key).map(|s| s.first_timestamp)
    }
}

impl<D: Deliver> Inner<D> {
    fn arm(this: &Arc<Self>, key: String, generation: u64) -> JoinHandle<()> {
        let inner = Arc::clone(this);
        tokio::spawn(async move {
            tokio::time::sleep(inner.window).await;
            inner.flush(&key, generation);
        })
    }

    fn flush(&self, key: &str, generation: u64) {
        // Removing first guarantees cleanup whatever happens below.
        let Some((_, state)) = self
            .buffers
            .remove_if(key, |_, state| state.generation == generation)
        else {
            debug!(wa_id = %key, generation, "Flush timer superseded, skipping");
            return;
        };

        let merged = merge_texts(&state.texts);
        let annotation = self.annotate.then_some(Annotation {
            first_timestamp: state.first_timestamp,
            last_timestamp: state.last_timestamp,
        });

        let payload = match rebuild_payload(
            &state.last_payload,
            state.shape,
            &merged,
            annotation.as_ref(),
        ) {
            Ok(payload) => payload,
            Err(e) => {
                error!(wa_id = %state.key, error = %e, "Failed to combine buffered messages");
                return;
            }
        };

        info!(
            wa_id = %state.key,
            texts = state.texts.len(),
            shape = %state.shape,
            burst_ms = (state.last_timestamp - state.first_timestamp).num_milliseconds(),
            "Flushing merged payload"
        );

        let deliver = Arc::clone(&self.deliver);
        let key = state.key;
        tokio::spawn(async move {
            if let Err(e) = deliver.deliver(payload).await {
                warn!(wa_id = %key, error = %e, "Callback delivery failed");
            }
        });
    }
}
