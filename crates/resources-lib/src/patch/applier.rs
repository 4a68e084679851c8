//! Writes one resource value into the line buffer
//!
//! An existing leaf line is overwritten in place. Otherwise the innermost
//! missing level (`resources`, `requests`/`limits`, or the leaf) is
//! synthesized two spaces below its parent and inserted at the end of the
//! parent block.

use super::buffer::LineBuffer;
use super::locator::{block_end, find_child, find_target, Anchor};
use super::{PatchError, ResourceField};
use crate::models::WorkloadPath;

const INDENT_STEP: usize = 2;
const RESOURCES_KEY: &str = "resources";

/// How a field patch changed the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    /// An existing value line was rewritten
    Replaced { line: usize },
    /// New lines were inserted starting at `line`
    Inserted { line: usize, count: usize },
}

/// Locate `field` under `path` and set it to `value`
///
/// All lookups run against the buffer's current state.
pub fn apply_value_patch(
    buffer: &mut LineBuffer,
    path: &WorkloadPath,
    field: ResourceField,
    value: &str,
) -> Result<PatchAction, PatchError> {
    let Located {
        target,
        resources,
        resource_type,
        leaf,
    } = locate(buffer, path, field)?;

    if let Some(leaf) = leaf {
        let line = buffer.line(leaf.line);
        let prefix = &line[..leaf.indent];
        let replaced = format!("{}{}: {}{}", prefix, field.key(), value, line_ending(line));
        buffer.replace(leaf.line, replaced);
        return Ok(PatchAction::Replaced { line: leaf.line });
    }

    let (anchor, new_lines) = match (resources, resource_type) {
        (None, _) => (
            target,
            vec![
                key_line(target.indent + INDENT_STEP, RESOURCES_KEY),
                key_line(target.indent + 2 * INDENT_STEP, field.resource_type()),
                value_line(target.indent + 3 * INDENT_STEP, field.key(), value),
            ],
        ),
        (Some(resources), None) => (
            resources,
            vec![
                key_line(resources.indent + INDENT_STEP, field.resource_type()),
                value_line(resources.indent + 2 * INDENT_STEP, field.key(), value),
            ],
        ),
        (Some(_), Some(resource_type)) => (
            resource_type,
            vec![value_line(resource_type.indent + INDENT_STEP, field.key(), value)],
        ),
    };

    Ok(insert_at_block_end(buffer, anchor, new_lines))
}

/// Result of the nested lookups for one field
struct Located {
    target: Anchor,
    resources: Option<Anchor>,
    resource_type: Option<Anchor>,
    leaf: Option<Anchor>,
}

fn locate(
    buffer: &LineBuffer,
    path: &WorkloadPath,
    field: ResourceField,
) -> Result<Located, PatchError> {
    let target = find_target(buffer, path)?;
    let resources = find_child(buffer, target, RESOURCES_KEY);
    let resource_type = resources.and_then(|r| find_child(buffer, r, field.resource_type()));
    let leaf = resource_type.and_then(|t| find_child(buffer, t, field.key()));

    Ok(Located {
        target,
        resources,
        resource_type,
        leaf,
    })
}

fn insert_at_block_end(
    buffer: &mut LineBuffer,
    anchor: Anchor,
    lines: Vec<String>,
) -> PatchAction {
    let position = block_end(buffer, anchor);
    let count = lines.len();
    let eol = line_ending(buffer.line(anchor.line));
    let lines = lines.into_iter().map(|line| line + eol).collect();
    buffer.insert_lines(position, lines);
    PatchAction::Inserted {
        line: position,
        count,
    }
}

/// `"\r"` for a line read from a CRLF document
fn line_ending(line: &str) -> &'static str {
    if line.ends_with('\r') {
        "\r"
    } else {
        ""
    }
}

fn key_line(indent: usize, key: &str) -> String {
    format!("{}{}:", " ".repeat(indent), key)
}

fn value_line(indent: usize, key: &str, value: &str) -> String {
    format!("{}{}: {}", " ".repeat(indent), key, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(
        text: &str,
        path: &WorkloadPath,
        field: ResourceField,
        value: &str,
    ) -> (String, PatchAction) {
        let mut buffer = LineBuffer::from_text(text);
        let action = apply_value_patch(&mut buffer, path, field, value).unwrap();
        (buffer.into_text(), action)
    }

    #[test]
    fn test_replaces_existing_leaf_keeping_its_indent() {
        let text = "services:\n  api:\n    resources:\n      limits:\n         cpu: 1   # odd indent\n";
        let (patched, action) = patch(
            text,
            &WorkloadPath::new("services", "api", ""),
            ResourceField::LimitsCpu,
            "500m",
        );
        assert_eq!(
            patched,
            "services:\n  api:\n    resources:\n      limits:\n         cpu: 500m\n"
        );
        assert_eq!(action, PatchAction::Replaced { line: 4 });
    }

    #[test]
    fn test_inserts_whole_resources_block() {
        let text = "services:\n  api:\n    image: app\n  web:\n    image: nginx\n";
        let (patched, action) = patch(
            text,
            &WorkloadPath::new("services", "api", ""),
            ResourceField::RequestsMemory,
            "256Mi",
        );
        assert_eq!(
            patched,
            "services:\n  api:\n    image: app\n    resources:\n      requests:\n        memory: 256Mi\n  web:\n    image: nginx\n"
        );
        assert_eq!(action, PatchAction::Inserted { line: 3, count: 3 });
    }

    #[test]
    fn test_inserts_resource_type_after_existing_sibling() {
        let text = "services:\n  api:\n    resources:\n      requests:\n        cpu: 100m\n  web: {}\n";
        let (patched, _) = patch(
            text,
            &WorkloadPath::new("services", "api", ""),
            ResourceField::LimitsCpu,
            "1.5",
        );
        assert_eq!(
            patched,
            "services:\n  api:\n    resources:\n      requests:\n        cpu: 100m\n      limits:\n        cpu: 1.5\n  web: {}\n"
        );
    }

    #[test]
    fn test_inserts_leaf_into_existing_resource_type() {
        let text = "workers:\n  queue:\n    containers:\n      - name: main\n        resources:\n          limits:\n            cpu: 1\n";
        let (patched, action) = patch(
            text,
            &WorkloadPath::new("workers", "queue", "main"),
            ResourceField::LimitsMemory,
            "1.0Gi",
        );
        assert_eq!(
            patched,
            "workers:\n  queue:\n    containers:\n      - name: main\n        resources:\n          limits:\n            cpu: 1\n\n            memory: 1.0Gi\n"
        );
        // The empty line after the final newline is blank, so it still
        // belongs to the block and the insertion lands past it.
        assert_eq!(action, PatchAction::Inserted { line: 8, count: 1 });
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let text = "services:\r\n  api:\r\n    resources:\r\n      limits:\r\n        cpu: 1\r\n  web: {}\r\n";
        let path = WorkloadPath::new("services", "api", "");

        let (patched, action) = patch(text, &path, ResourceField::LimitsCpu, "500m");
        assert_eq!(
            patched,
            "services:\r\n  api:\r\n    resources:\r\n      limits:\r\n        cpu: 500m\r\n  web: {}\r\n"
        );
        assert_eq!(action, PatchAction::Replaced { line: 4 });

        let (patched, _) = patch(&patched, &path, ResourceField::LimitsMemory, "1.0Gi");
        assert_eq!(
            patched,
            "services:\r\n  api:\r\n    resources:\r\n      limits:\r\n        cpu: 500m\r\n        memory: 1.0Gi\r\n  web: {}\r\n"
        );
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let mut buffer = LineBuffer::from_text("services:\n  api: {}\n");
        let err = apply_value_patch(
            &mut buffer,
            &WorkloadPath::new("workers", "api", ""),
            ResourceField::LimitsCpu,
            "1",
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::TargetNotFound(_)));
    }
}
