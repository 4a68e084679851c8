//! Resolves a workload name to concrete paths in the decoded values tree

use crate::models::WorkloadPath;
use serde_yaml::Value;

/// Top-level sections that hold workload definitions
pub const WORKLOAD_SECTIONS: &[&str] = &["services", "workers"];

/// Every `(section, workload, container)` location of `workload`
///
/// A workload with a `containers` list yields one path per list entry, named
/// by the entry's `name` or `container-<index>`. Otherwise the workload itself
/// is the only path.
pub fn find_workload_paths(
    values: &Value,
    sections: &[String],
    workload: &str,
) -> Vec<WorkloadPath> {
    let mut paths = Vec::new();

    for section in sections {
        let Some(workload_data) = values
            .get(section.as_str())
            .and_then(Value::as_mapping)
            .and_then(|s| s.get(workload))
            .filter(|w| w.is_mapping())
        else {
            continue;
        };

        match workload_data.get("containers").and_then(Value::as_sequence) {
            Some(containers) => {
                for (index, container) in containers.iter().enumerate() {
                    if !container.is_mapping() {
                        continue;
                    }
                    let name = container
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("container-{}", index));
                    paths.push(WorkloadPath::new(section.as_str(), workload, name));
                }
            }
            None => paths.push(WorkloadPath::new(section.as_str(), workload, "")),
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> Vec<String> {
        WORKLOAD_SECTIONS.iter().map(|s| s.to_string()).collect()
    }

    fn decode(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_workload_without_containers() {
        let values = decode("services:\n  api:\n    image: app\n");
        assert_eq!(
            find_workload_paths(&values, &sections(), "api"),
            vec![WorkloadPath::new("services", "api", "")]
        );
    }

    #[test]
    fn test_containers_named_and_positional() {
        let values = decode(
            "workers:\n  queue:\n    containers:\n      - name: main\n      - image: helper\n      - just-a-string\n      - name: last\n",
        );
        assert_eq!(
            find_workload_paths(&values, &sections(), "queue"),
            vec![
                WorkloadPath::new("workers", "queue", "main"),
                WorkloadPath::new("workers", "queue", "container-1"),
                WorkloadPath::new("workers", "queue", "last"),
            ]
        );
    }

    #[test]
    fn test_workload_in_both_sections() {
        let values = decode("services:\n  api: {}\nworkers:\n  api:\n    replicas: 1\n");
        let paths = find_workload_paths(&values, &sections(), "api");
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].section, "services");
        assert_eq!(paths[1].section, "workers");
    }

    #[test]
    fn test_missing_or_scalar_workload() {
        let values = decode("services:\n  api: disabled\nother:\n  web: {}\n");
        assert!(find_workload_paths(&values, &sections(), "api").is_empty());
        assert!(find_workload_paths(&values, &sections(), "web").is_empty());
        assert!(find_workload_paths(&Value::Null, &sections(), "api").is_empty());
    }
}
