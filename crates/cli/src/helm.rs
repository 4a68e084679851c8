//! Helm release access through the `helm` binary

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Runs `helm` subcommands
pub struct HelmClient {
    binary: OsString,
    kubeconfig: Option<PathBuf>,
}

impl HelmClient {
    /// Use `$HELM_BIN` when running as a Helm plugin, `helm` otherwise
    pub fn from_env() -> Self {
        let binary = std::env::var_os("HELM_BIN").unwrap_or_else(|| OsString::from("helm"));
        Self {
            binary,
            kubeconfig: None,
        }
    }

    pub fn with_binary(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig: None,
        }
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<&Path>) -> Self {
        self.kubeconfig = kubeconfig.map(Path::to_path_buf);
        self
    }

    /// Rendered manifest of a deployed release
    pub async fn get_manifest(&self, release: &str, namespace: &str) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command.args(["get", "manifest", release]);
        if !namespace.is_empty() {
            command.args(["--namespace", namespace]);
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            command.arg("--kubeconfig").arg(kubeconfig);
        }

        debug!(release = %release, namespace = %namespace, "Fetching release manifest");
        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary.to_string_lossy()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("helm get manifest {} failed: {}", release, stderr.trim());
        }

        String::from_utf8(output.stdout).context("Release manifest is not valid UTF-8")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable stand-in for `helm`
    fn fake_helm(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("helm");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_get_manifest_passes_release_and_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let helm = fake_helm(dir.path(), r#"echo "args: $*""#);

        let manifest = HelmClient::with_binary(&helm)
            .get_manifest("backend", "apps")
            .await
            .unwrap();
        assert_eq!(manifest, "args: get manifest backend --namespace apps\n");
    }

    #[tokio::test]
    async fn test_get_manifest_reports_helm_errors() {
        let dir = tempfile::tempdir().unwrap();
        let helm = fake_helm(dir.path(), "echo 'Error: release: not found' >&2\nexit 1");

        let err = HelmClient::with_binary(&helm)
            .get_manifest("missing", "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("release: not found"));
    }
}
