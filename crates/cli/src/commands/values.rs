//! Writing recommendations back into a values file

use anyhow::{Context, Result};
use resources_lib::{PatchError, PatchLogger, ResourceRecommendation, ValuesPatcher};
use std::path::Path;

use crate::output::{print_info, print_success, print_warning};

/// Outcome of patching one values document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// Recommendations that changed the document
    pub patched: usize,
    /// Recommendations whose values already matched
    pub unchanged: usize,
    /// Workload keys absent from the document
    pub missing: Vec<String>,
}

/// Apply every recommendation to `text` in order
///
/// A missing workload is recorded and skipped. Any other error aborts.
pub fn patch_values(
    text: &str,
    recommendations: &[ResourceRecommendation],
    patcher: &ValuesPatcher,
) -> Result<(String, PatchSummary)> {
    let mut current = text.to_string();
    let mut summary = PatchSummary::default();

    for rec in recommendations {
        match patcher.apply(&current, rec) {
            Ok(patched) => {
                if patched == current {
                    summary.unchanged += 1;
                } else {
                    summary.patched += 1;
                }
                current = patched;
            }
            Err(PatchError::WorkloadNotFound(workload)) => summary.missing.push(workload),
            Err(err) => return Err(err).context("Failed to patch values"),
        }
    }

    Ok((current, summary))
}

/// Patch the values file at `path`
///
/// With `dry_run` the patched document goes to stdout and the file is left
/// alone. The file is only rewritten when its content changes.
pub fn patch_values_file(
    path: &Path,
    recommendations: &[ResourceRecommendation],
    sections: Option<&[String]>,
    dry_run: bool,
) -> Result<PatchSummary> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read values file {}", path.display()))?;

    let patcher = match sections {
        Some(sections) => ValuesPatcher::with_sections(sections.iter().cloned()),
        None => ValuesPatcher::new(),
    }
    .with_logger(PatchLogger::new(path.display().to_string()));

    let (patched, summary) = patch_values(&text, recommendations, &patcher)?;

    for workload in &summary.missing {
        print_warning(&format!(
            "Workload {} not found in {}",
            workload,
            path.display()
        ));
    }

    if dry_run {
        print!("{}", patched);
        return Ok(summary);
    }

    if patched != text {
        std::fs::write(path, &patched)
            .with_context(|| format!("Failed to write values file {}", path.display()))?;
        print_success(&format!(
            "Updated {} ({} recommendations applied)",
            path.display(),
            summary.patched
        ));
    } else {
        print_info(&format!("{} is already up to date", path.display()));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MI: i64 = 1024 * 1024;

    const VALUES: &str = "# Backend chart values
image:
  tag: 1.4.2

services:
  api:
    replicas: 2
    resources:
      requests:
        cpu: 100m # baseline
        memory: 128Mi
  web:
    replicas: 1
";

    fn recommendation(name: &str, cpu_request: i64, mem_request: i64) -> ResourceRecommendation {
        ResourceRecommendation {
            release: "backend".to_string(),
            kind: "Deployment".to_string(),
            name: name.to_string(),
            recommended_cpu_request: cpu_request,
            recommended_mem_request: mem_request,
            ..Default::default()
        }
    }

    #[test]
    fn test_patch_values_collects_missing_workloads() {
        let recs = vec![
            recommendation("backend-api", 500, 256 * MI),
            recommendation("backend-scheduler", 500, 256 * MI),
        ];
        let (patched, summary) = patch_values(VALUES, &recs, &ValuesPatcher::new()).unwrap();

        assert!(patched.contains("        cpu: 500m\n        memory: 256Mi\n"));
        assert!(patched.starts_with("# Backend chart values\nimage:\n  tag: 1.4.2\n"));
        assert_eq!(summary.patched, 1);
        assert_eq!(summary.missing, vec!["scheduler".to_string()]);
    }

    #[test]
    fn test_patch_values_rejects_invalid_document() {
        let recs = vec![recommendation("backend-api", 500, 0)];
        let err = patch_values("services: [", &recs, &ValuesPatcher::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to patch values"));
    }

    #[test]
    fn test_patch_values_file_writes_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.yaml");
        std::fs::write(&path, VALUES).unwrap();

        let recs = vec![recommendation("backend-api", 1500, 0)];
        let summary = patch_values_file(&path, &recs, None, false).unwrap();
        assert_eq!(summary.patched, 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, VALUES.replace("cpu: 100m # baseline", "cpu: 1.5"));

        // Nothing left to change
        let summary = patch_values_file(&path, &recs, None, false).unwrap();
        assert_eq!(summary.patched, 0);
        assert_eq!(summary.unchanged, 1);
    }

    #[test]
    fn test_dry_run_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.yaml");
        std::fs::write(&path, VALUES).unwrap();

        let recs = vec![recommendation("backend-web", 500, 256 * MI)];
        let summary = patch_values_file(&path, &recs, None, true).unwrap();
        assert_eq!(summary.patched, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), VALUES);
    }

    #[test]
    fn test_custom_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.yaml");
        std::fs::write(&path, "jobs:\n  migrate:\n    resources:\n      requests:\n        cpu: 100m\n").unwrap();

        let recs = vec![recommendation("backend-migrate", 500, 0)];
        let sections = vec!["jobs".to_string()];
        let summary = patch_values_file(&path, &recs, Some(&sections), false).unwrap();

        assert_eq!(summary.patched, 1);
        assert!(std::fs::read_to_string(&path).unwrap().contains("cpu: 500m"));
    }
}
