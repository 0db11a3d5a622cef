//! External command helpers.

use std::process::{Command, Output};

use super::ExtractionError;

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Run a command, returning its stdout on success.
///
/// A missing executable maps to [`ExtractionError::ToolNotFound`] carrying
/// `install_hint`; a non-zero exit maps to [`ExtractionError::ToolFailed`]
/// with the tool's stderr.
pub fn run_tool(cmd: &mut Command, tool: &str, install_hint: &str) -> Result<String, ExtractionError> {
    tracing::debug!(command = ?cmd, "Running external tool");
    handle_cmd_output(cmd.output(), tool, install_hint)
}

fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool: &str,
    install_hint: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ToolFailed {
                    tool: tool.to_string(),
                    message: stderr.trim().to_string(),
                })
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::ToolNotFound(
            format!("{} ({})", tool, install_hint),
        )),
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_reported() {
        let mut cmd = Command::new("definitely-not-an-installed-tool-4711");
        let err = run_tool(&mut cmd, "nothing", "install nothing").unwrap_err();
        assert!(matches!(err, ExtractionError::ToolNotFound(ref hint) if hint.contains("install nothing")));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_reports_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);
        let err = run_tool(&mut cmd, "sh", "").unwrap_err();
        match err {
            ExtractionError::ToolFailed { tool, message } => {
                assert_eq!(tool, "sh");
                assert_eq!(message, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_tool_returns_stdout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf hello"]);
        assert_eq!(run_tool(&mut cmd, "sh", "").unwrap(), "hello");
    }
}
