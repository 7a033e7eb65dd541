use serde::Serialize;
use tokio::sync::mpsc;

/// Progress notifications for one enrichment run, in emission order.
///
/// The orchestrator emits everything up to `Analyzed` (or `Failed`).
/// `Completed` is sent by whoever persists the artifacts, once the files
/// exist, and names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EnrichmentEvent {
    Initializing,
    Processing { stage: String },
    Analyzed { identifier: String },
    Completed { identifier: String, files: Vec<String> },
    Failed { error: String },
}

impl EnrichmentEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Optional listener handle passed into each run. Sends never block and a
/// dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<EnrichmentEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<EnrichmentEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that discards everything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EnrichmentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: EnrichmentEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn processing(&self, stage: &str) {
        self.emit(EnrichmentEvent::Processing { stage: stage.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_after_receiver_dropped_is_silent() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(EnrichmentEvent::Initializing);
        EventSink::none().processing("lookup");
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(EnrichmentEvent::Initializing);
        sink.processing("lookup");
        sink.emit(EnrichmentEvent::Analyzed { identifier: "CVE-2021-44228".into() });
        sink.emit(EnrichmentEvent::Completed { identifier: "CVE-2021-44228".into(), files: Vec::new() });
        assert_eq!(rx.try_recv().unwrap(), EnrichmentEvent::Initializing);
        assert_eq!(rx.try_recv().unwrap(), EnrichmentEvent::Processing { stage: "lookup".into() });
        assert!(!rx.try_recv().unwrap().is_terminal());
        assert!(rx.try_recv().unwrap().is_terminal());
    }

    #[test]
    fn test_event_json_shape() {
        let value = serde_json::to_value(EnrichmentEvent::Failed { error: "boom".into() }).unwrap();
        assert_eq!(value["event"], "failed");
        assert_eq!(value["error"], "boom");

        let done = EnrichmentEvent::Completed {
            identifier: "CVE-2021-44228".into(),
            files: vec!["CVE-2021-44228_STIX_Bundle.json".into()],
        };
        let value = serde_json::to_value(done).unwrap();
        assert_eq!(value["event"], "completed");
        assert_eq!(value["files"][0], "CVE-2021-44228_STIX_Bundle.json");
    }
}
