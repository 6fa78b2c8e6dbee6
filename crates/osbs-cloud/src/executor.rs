use std::process::{Command, Stdio};

use crate::oc::OcError;

/// Abstraction over `oc` CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
pub trait OcExecutor {
    /// Execute an `oc` command and capture stdout.
    fn exec(&self, args: &[String]) -> Result<String, OcError>;
}

/// Real `oc` CLI executor.
pub struct RealExecutor {
    binary: String,
}

impl RealExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for RealExecutor {
    fn default() -> Self {
        Self::new("oc")
    }
}

impl OcExecutor for RealExecutor {
    fn exec(&self, args: &[String]) -> Result<String, OcError> {
        tracing::debug!(binary = %self.binary, ?args, "running oc");

        let output = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| OcError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| OcError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(OcError::CommandFailed {
                args: args.to_vec(),
                stderr,
            })
        }
    }
}
