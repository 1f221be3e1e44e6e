//! Post-install smoke test: run `<binary> --version`.
//!
//! Verification never fails the run. Its outcome only changes what the
//! report tells the user.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Time allowed for a version query before the child is killed.
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of verifying one installed binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The binary ran and reported a version.
    Verified {
        /// Trimmed version output.
        output: String,
    },
    /// The binary could not be run successfully.
    Unverified {
        /// What went wrong.
        reason: String,
    },
    /// Verification was disabled.
    Skipped,
}

/// Runs `binary --version` with [`VERIFY_TIMEOUT`].
pub async fn verify_binary(binary: &Path) -> Verification {
    verify_with_timeout(binary, VERIFY_TIMEOUT).await
}

/// Runs `binary --version`, killing it after `timeout`.
pub async fn verify_with_timeout(binary: &Path, timeout: Duration) -> Verification {
    if !binary.is_file() {
        return Verification::Unverified {
            reason: format!("{} does not exist", binary.display()),
        };
    }

    let mut command = Command::new(binary);
    command
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Verification::Unverified {
                reason: format!("failed to run {}: {e}", binary.display()),
            };
        }
        Err(_) => {
            return Verification::Unverified {
                reason: format!("{} --version timed out after {}s", binary.display(), timeout.as_secs()),
            };
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let detail = if stderr.is_empty() { stdout } else { stderr };
        return Verification::Unverified {
            reason: format!("{} --version exited with {}: {detail}", binary.display(), output.status),
        };
    }

    let text = if stdout.is_empty() { stderr } else { stdout };
    log::info!("verified {}: {text}", binary.display());
    Verification::Verified { output: text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_binary_is_unverified() {
        let temp = tempfile::tempdir().unwrap();
        let result = verify_binary(&temp.path().join("lux")).await;
        assert!(matches!(result, Verification::Unverified { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_trimmed_stdout() {
        let temp = tempfile::tempdir().unwrap();
        let bin = script(temp.path(), "lux", "echo '  lux 0.4.1  '");

        let result = verify_binary(&bin).await;

        assert_eq!(
            result,
            Verification::Verified {
                output: "lux 0.4.1".into()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn falls_back_to_stderr_when_stdout_empty() {
        let temp = tempfile::tempdir().unwrap();
        let bin = script(temp.path(), "lpm", "echo 'lpm 1.2.0' >&2");

        let result = verify_binary(&bin).await;

        assert_eq!(
            result,
            Verification::Verified {
                output: "lpm 1.2.0".into()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_unverified() {
        let temp = tempfile::tempdir().unwrap();
        let bin = script(temp.path(), "lux", "echo boom >&2; exit 3");

        let Verification::Unverified { reason } = verify_binary(&bin).await else {
            panic!("expected Unverified");
        };
        assert!(reason.contains("boom"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hanging_binary_times_out() {
        let temp = tempfile::tempdir().unwrap();
        let bin = script(temp.path(), "lux", "exec sleep 30");

        let Verification::Unverified { reason } =
            verify_with_timeout(&bin, Duration::from_millis(200)).await
        else {
            panic!("expected Unverified");
        };
        assert!(reason.contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_executable_file_is_unverified() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("lux");
        std::fs::write(&path, "not a program").unwrap();

        let result = verify_binary(&path).await;

        assert!(matches!(result, Verification::Unverified { .. }));
    }
}
