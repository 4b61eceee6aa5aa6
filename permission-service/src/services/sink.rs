//! Fire-and-forget decision events for audit and metrics.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

use crate::config::SinkKind;
use crate::models::ResourceKind;

/// Which rule granted access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantPath {
    IsMaintainer,
    IsAdmin,
    IsGranted,
}

impl GrantPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantPath::IsMaintainer => "is_maintainer",
            GrantPath::IsAdmin => "is_admin",
            GrantPath::IsGranted => "is_granted",
        }
    }
}

impl fmt::Display for GrantPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionEvent {
    pub consumer_id: Uuid,
    pub resource_kind: ResourceKind,
    pub resource: String,
    pub path: GrantPath,
}

/// Receives decision events. Errors are ignored by the authorizer.
pub trait DecisionSink: Send + Sync {
    fn emit(&self, event: &DecisionEvent) -> Result<(), anyhow::Error>;
}

pub struct TracingDecisionSink;

impl DecisionSink for TracingDecisionSink {
    fn emit(&self, event: &DecisionEvent) -> Result<(), anyhow::Error> {
        tracing::info!(
            consumer_id = %event.consumer_id,
            resource_kind = %event.resource_kind,
            resource = %event.resource,
            path = %event.path,
            "Permission granted"
        );
        Ok(())
    }
}

/// Counts grants as `authz_grants_total{path, kind}`.
pub struct MetricsDecisionSink;

impl DecisionSink for MetricsDecisionSink {
    fn emit(&self, event: &DecisionEvent) -> Result<(), anyhow::Error> {
        metrics::counter!(
            "authz_grants_total",
            "path" => event.path.as_str(),
            "kind" => event.resource_kind.as_str()
        )
        .increment(1);
        Ok(())
    }
}

pub struct NoopDecisionSink;

impl DecisionSink for NoopDecisionSink {
    fn emit(&self, _event: &DecisionEvent) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

/// Keeps every emitted event. Can be told to fail after recording.
#[derive(Default)]
pub struct RecordingDecisionSink {
    events: Mutex<Vec<DecisionEvent>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl RecordingDecisionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn paths(&self) -> Vec<GrantPath> {
        self.events().into_iter().map(|e| e.path).collect()
    }
}

impl DecisionSink for RecordingDecisionSink {
    fn emit(&self, event: &DecisionEvent) -> Result<(), anyhow::Error> {
        self.events
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock events: {}", e))?
            .push(event.clone());
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(anyhow::anyhow!("sink unavailable"));
        }
        Ok(())
    }
}

pub fn build_decision_sink(kind: SinkKind) -> Box<dyn DecisionSink> {
    match kind {
        SinkKind::Tracing => Box::new(TracingDecisionSink),
        SinkKind::Metrics => Box::new(MetricsDecisionSink),
        SinkKind::None => Box::new(NoopDecisionSink),
    }
}
