//! Forward scanners that find nested blocks in a values document
//!
//! Every scan starts on the line after its anchor and stops at the first
//! non-blank line indented at or below the anchor (the end of the block).
//! Nothing here parses YAML: keys are matched on trimmed line text.

use super::buffer::LineBuffer;
use super::PatchError;
use crate::models::WorkloadPath;

const CONTAINERS_KEY: &str = "containers:";
const LIST_ITEM_PREFIX: &str = "- ";

/// A located line and its indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub line: usize,
    pub indent: usize,
}

impl Anchor {
    fn at(buffer: &LineBuffer, line: usize) -> Self {
        Self {
            line,
            indent: buffer.indent(line),
        }
    }
}

/// Find the line that opens the block addressed by `path`
///
/// For a container path this is the matching `containers` list item (or the
/// line carrying `name: <container>`), otherwise the workload line itself.
pub fn find_target(buffer: &LineBuffer, path: &WorkloadPath) -> Result<Anchor, PatchError> {
    let section_header = format!("{}:", path.section);
    let workload_key = format!("{}:", path.workload);
    let container_name = format!("name: {}", path.container);

    let mut section_found = false;
    let mut workload_found = false;
    let mut in_containers = false;
    let mut item_index: Option<usize> = None;

    for (i, line) in buffer.lines_from(0) {
        let trimmed = line.trim();

        if !section_found {
            section_found = trimmed == section_header;
            continue;
        }

        if !workload_found {
            if trimmed.starts_with(&workload_key) {
                workload_found = true;
                if !path.has_container() {
                    return Ok(Anchor::at(buffer, i));
                }
            }
            continue;
        }

        if !in_containers {
            if trimmed.starts_with(CONTAINERS_KEY) {
                in_containers = true;
                item_index = None;
            }
            continue;
        }

        if trimmed.starts_with(LIST_ITEM_PREFIX) {
            let index = item_index.map_or(0, |n| n + 1);
            item_index = Some(index);
            if path.container == format!("container-{}", index) {
                return Ok(Anchor::at(buffer, i));
            }
        }

        if line.contains(&container_name) {
            return Ok(Anchor::at(buffer, i));
        }

        // Compared against the width of the `containers:` token, not the
        // indentation of the line that carried it.
        if buffer.indent(i) <= CONTAINERS_KEY.len()
            && !trimmed.is_empty()
            && !trimmed.starts_with(LIST_ITEM_PREFIX)
            && !trimmed.contains("name:")
        {
            break;
        }
    }

    Err(PatchError::TargetNotFound(path.clone()))
}

/// Find a direct or nested `<key>:` line inside the block opened by `parent`
pub fn find_child(buffer: &LineBuffer, parent: Anchor, key: &str) -> Option<Anchor> {
    let prefix = format!("{}:", key);

    for (i, line) in buffer.lines_from(parent.line + 1) {
        let trimmed = line.trim();
        let indent = buffer.indent(i);

        if !trimmed.is_empty() && indent <= parent.indent {
            break;
        }
        if trimmed.starts_with(&prefix) {
            return Some(Anchor { line: i, indent });
        }
    }

    None
}

/// Index of the first line after the block opened by `anchor`
///
/// This is the first sibling or dedented line, or the buffer length.
pub fn block_end(buffer: &LineBuffer, anchor: Anchor) -> usize {
    buffer
        .lines_from(anchor.line + 1)
        .find(|&(i, _)| !buffer.is_blank(i) && buffer.indent(i) <= anchor.indent)
        .map_or(buffer.len(), |(i, _)| i)
}
