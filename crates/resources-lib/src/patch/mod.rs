//! Formatting-preserving patches for Helm values files
//!
//! Recommendations are written into the raw text of a values file. The
//! document is decoded once to resolve which workload paths exist; all edits
//! then happen on a line buffer so comments, blank lines, anchors and aliases
//! stay byte-for-byte intact.

mod applier;
mod buffer;
mod discovery;
mod locator;


pub use applier::{apply_value_patch, PatchAction};
pub use buffer::{indentation, LineBuffer};
pub use discovery::{find_workload_paths, WORKLOAD_SECTIONS};
pub use locator::{block_end, find_child, find_target, Anchor};

use crate::models::{ResourceRecommendation, WorkloadPath};
use crate::observability::PatchLogger;
use crate::quantity::{format_cpu_for_yaml, format_memory_for_yaml};
use serde_yaml::Value;
use thiserror::Error;

/// Errors produced while patching a values file
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to parse values file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("workload {0} not found")]
    WorkloadNotFound(String),

    #[error("target location not found: {0}")]
    TargetNotFound(WorkloadPath),
}

/// One `requests`/`limits` value under a `resources` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceField {
    LimitsCpu,
    LimitsMemory,
    RequestsCpu,
    RequestsMemory,
}

impl ResourceField {
    /// Order in which fields are applied
    pub const ALL: [ResourceField; 4] = [
        ResourceField::LimitsCpu,
        ResourceField::LimitsMemory,
        ResourceField::RequestsCpu,
        ResourceField::RequestsMemory,
    ];

    /// `requests` or `limits`
    pub fn resource_type(self) -> &'static str {
        match self {
            ResourceField::LimitsCpu | ResourceField::LimitsMemory => "limits",
            ResourceField::RequestsCpu | ResourceField::RequestsMemory => "requests",
        }
    }

    /// `cpu` or `memory`
    pub fn key(self) -> &'static str {
        match self {
            ResourceField::LimitsCpu | ResourceField::RequestsCpu => "cpu",
            ResourceField::LimitsMemory | ResourceField::RequestsMemory => "memory",
        }
    }

    /// Recommended raw value for this field
    pub fn recommended(self, rec: &ResourceRecommendation) -> i64 {
        match self {
            ResourceField::LimitsCpu => rec.recommended_cpu_limit,
            ResourceField::LimitsMemory => rec.recommended_mem_limit,
            ResourceField::RequestsCpu => rec.recommended_cpu_request,
            ResourceField::RequestsMemory => rec.recommended_mem_request,
        }
    }

    /// Value as written into a values file
    pub fn format(self, raw: i64) -> String {
        match self {
            ResourceField::LimitsCpu | ResourceField::RequestsCpu => format_cpu_for_yaml(raw),
            ResourceField::LimitsMemory | ResourceField::RequestsMemory => {
                format_memory_for_yaml(raw)
            }
        }
    }
}

/// Applies resource recommendations to values files
#[derive(Debug, Clone)]
pub struct ValuesPatcher {
    sections: Vec<String>,
    logger: PatchLogger,
}

impl Default for ValuesPatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuesPatcher {
    /// Patcher for the `services` and `workers` sections
    pub fn new() -> Self {
        Self::with_sections(WORKLOAD_SECTIONS.iter().copied())
    }

    /// Patcher for a custom set of top-level workload sections
    pub fn with_sections<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
            logger: PatchLogger::default(),
        }
    }

    /// Replace the logger, e.g. to tag events with the values file name
    pub fn with_logger(mut self, logger: PatchLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Apply `rec` to `text` and return the patched document
    ///
    /// Up to four fields are written per resolved path, each only if its
    /// recommended value is positive. A field that cannot be located is
    /// skipped without failing the whole patch. The input is left untouched
    /// on error.
    pub fn apply(&self, text: &str, rec: &ResourceRecommendation) -> Result<String, PatchError> {
        let mut values: Value = serde_yaml::from_str(text)?;
        values.apply_merge()?;

        let workload = rec.workload_key();
        let paths = select_container_paths(
            find_workload_paths(&values, &self.sections, workload),
            &rec.container,
        );
        if paths.is_empty() {
            self.logger.log_workload_not_found(&rec.release, &rec.name, workload);
            return Err(PatchError::WorkloadNotFound(workload.to_string()));
        }

        let mut buffer = LineBuffer::from_text(text);
        for path in &paths {
            self.apply_to_path(&mut buffer, path, rec);
        }

        Ok(buffer.into_text())
    }

    fn apply_to_path(
        &self,
        buffer: &mut LineBuffer,
        path: &WorkloadPath,
        rec: &ResourceRecommendation,
    ) {
        for field in ResourceField::ALL {
            let raw = field.recommended(rec);
            if raw <= 0 {
                continue;
            }

            let value = field.format(raw);
            match apply_value_patch(buffer, path, field, &value) {
                Ok(action) => self.logger.log_field_patched(path, field, &value, action),
                Err(err) => self.logger.log_field_skipped(path, field, &err),
            }
        }
    }
}

/// Narrow `paths` to the recommendation's container when the values name it
///
/// Paths are kept as-is when no container is given or none of them carries
/// that name, e.g. positional `container-<n>` entries.
fn select_container_paths(paths: Vec<WorkloadPath>, container: &str) -> Vec<WorkloadPath> {
    if container.is_empty() || !paths.iter().any(|p| p.container == container) {
        return paths;
    }
    paths.into_iter().filter(|p| p.container == container).collect()
}

/// Apply `rec` to `text` using the default workload sections
pub fn apply_patches_to_yaml(
    text: &str,
    rec: &ResourceRecommendation,
) -> Result<String, PatchError> {
    ValuesPatcher::new().apply(text, rec)
}
