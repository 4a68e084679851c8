//! Structured logging for resource analysis and values patching
//!
//! Events carry an `event` field plus the workload coordinates so they can be
//! filtered when a subscriber emits JSON.

use crate::models::{ResourceRecommendation, WorkloadPath};
use crate::patch::{PatchAction, PatchError, ResourceField};
use tracing::{debug, info, warn};

/// Structured logger for values patching events
#[derive(Debug, Clone)]
pub struct PatchLogger {
    source: String,
}

impl Default for PatchLogger {
    fn default() -> Self {
        Self::new("values")
    }
}

impl PatchLogger {
    /// `source` names the document being patched, usually a file path
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Log a field written into the document
    pub fn log_field_patched(
        &self,
        path: &WorkloadPath,
        field: ResourceField,
        value: &str,
        action: PatchAction,
    ) {
        let (line, inserted) = match action {
            PatchAction::Replaced { line } => (line, 0),
            PatchAction::Inserted { line, count } => (line, count),
        };

        debug!(
            event = "field_patched",
            source = %self.source,
            section = %path.section,
            workload = %path.workload,
            container = %path.container,
            resource_type = field.resource_type(),
            resource = field.key(),
            value = %value,
            line = line,
            inserted_lines = inserted,
            "Patched resource value"
        );
    }

    /// Log a field that could not be located and was left alone
    pub fn log_field_skipped(&self, path: &WorkloadPath, field: ResourceField, error: &PatchError) {
        debug!(
            event = "field_skipped",
            source = %self.source,
            section = %path.section,
            workload = %path.workload,
            container = %path.container,
            resource_type = field.resource_type(),
            resource = field.key(),
            error = %error,
            "Skipped resource value"
        );
    }

    /// Log a recommendation whose workload is absent from the document
    pub fn log_workload_not_found(&self, release: &str, name: &str, workload: &str) {
        warn!(
            event = "workload_not_found",
            source = %self.source,
            release = %release,
            name = %name,
            workload = %workload,
            "Workload not found in values"
        );
    }

    /// Log a generated recommendation
    pub fn log_recommendation(&self, rec: &ResourceRecommendation) {
        info!(
            event = "recommendation_generated",
            release = %rec.release,
            kind = %rec.kind,
            name = %rec.name,
            container = %rec.container,
            cpu_usage_millicores = rec.cpu_usage,
            memory_usage_bytes = rec.mem_usage,
            cpu_request_millicores = rec.recommended_cpu_request,
            cpu_limit_millicores = rec.recommended_cpu_limit,
            memory_request_bytes = rec.recommended_mem_request,
            memory_limit_bytes = rec.recommended_mem_limit,
            "Generated resource recommendation"
        );
    }
}
