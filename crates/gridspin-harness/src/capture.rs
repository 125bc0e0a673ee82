#![forbid(unsafe_code)]

//! Capture `tracing` output for assertions.
//!
//! ```rust,ignore
//! let (result, logs) = with_captured_tracing(|| sim.advance(Duration::from_secs(5)));
//! assert!(logs.errors(gridspin_runtime::animator::LOG_TARGET).is_empty());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

/// A span opened while capturing.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub name: String,
    pub fields: HashMap<String, String>,
}

/// An event emitted while capturing.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: tracing::Level,
    pub target: String,
    /// The event's message, if it had one.
    pub message: String,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

/// `tracing_subscriber` layer that records spans and events.
#[derive(Debug, Clone, Default)]
pub struct SpanCapture {
    inner: Arc<Mutex<Captured>>,
}

/// Read side of a [`SpanCapture`].
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    inner: Arc<Mutex<Captured>>,
}

impl SpanCapture {
    #[must_use]
    pub fn new() -> (Self, CaptureHandle) {
        let layer = Self::default();
        let handle = CaptureHandle {
            inner: layer.inner.clone(),
        };
        (layer, handle)
    }
}

impl CaptureHandle {
    #[must_use]
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.lock().spans.clone()
    }

    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().events.clone()
    }

    /// Events at `level` under `target`.
    #[must_use]
    pub fn at_level(&self, target: &str, level: tracing::Level) -> Vec<CapturedEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| e.level == level && e.target == target)
            .cloned()
            .collect()
    }

    /// Error events under `target`.
    #[must_use]
    pub fn errors(&self, target: &str) -> Vec<CapturedEvent> {
        self.at_level(target, tracing::Level::ERROR)
    }

    /// Spans named `name`.
    #[must_use]
    pub fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.lock()
            .spans
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Captured> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let span = CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        };
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spans
            .push(span);
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        let captured = CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields,
        };
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .push(captured);
    }
}

/// Run `f` with a capturing subscriber installed on this thread.
pub fn with_captured_tracing<T>(f: impl FnOnce() -> T) -> (T, CaptureHandle) {
    let (layer, handle) = SpanCapture::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_events_with_fields_and_message() {
        let ((), logs) = with_captured_tracing(|| {
            tracing::error!(target: "gridspin.test", offset = 3_u64, "step failed");
        });
        let errors = logs.errors("gridspin.test");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "step failed");
        assert_eq!(errors[0].fields["offset"], "3");
    }

    #[test]
    fn captures_span_fields() {
        let ((), logs) = with_captured_tracing(|| {
            let _s = tracing::debug_span!("gridspin.step", epoch = 2_u64).entered();
        });
        let spans = logs.spans_named("gridspin.step");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].fields["epoch"], "2");
    }
}
