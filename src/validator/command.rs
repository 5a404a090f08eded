//! Validation by running an external program

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use crate::validator::{Validator, Verdict};
use crate::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDOUT_CAPTURE: &str = ".tfsource-stdout";
const STDERR_CAPTURE: &str = ".tfsource-stderr";

/// Runs a program against the content placed in a private working directory.
///
/// The content is written to `file_name` inside a fresh temporary directory,
/// which is also the program's working directory. Exit status 0 means the
/// content is valid. Output is captured to files rather than pipes so that a
/// killed child can never leave the reader blocked.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    program: String,
    args: Vec<String>,
    file_name: String,
}

impl CommandValidator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            file_name: "main.tf".to_string(),
        }
    }

    /// `terraform validate -no-color`
    pub fn terraform() -> Self {
        Self::new(
            "terraform",
            vec!["validate".to_string(), "-no-color".to_string()],
        )
    }

    /// Name the content file is written under (default `main.tf`)
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    fn run(&self, workdir: &Path, timeout: Duration) -> Result<ExitStatus> {
        let stdout = create_capture(&workdir.join(STDOUT_CAPTURE))?;
        let stderr = create_capture(&workdir.join(STDERR_CAPTURE))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| Error::io(PathBuf::from(&self.program), e))?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::warn!(program = %self.program, ?timeout, "validator killed after timeout");
                        return Err(Error::Timeout {
                            operation: format!("validation with {}", self.program),
                            after: timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
                }
                Err(e) => return Err(Error::io(PathBuf::from(&self.program), e)),
            }
        }
    }
}

impl Validator for CommandValidator {
    fn validate(&self, content: &str, timeout: Duration) -> Result<Verdict> {
        let workdir = tempfile::Builder::new()
            .prefix("tfsource-validate-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;

        let input = workdir.path().join(&self.file_name);
        std::fs::write(&input, content).map_err(|e| Error::io(&input, e))?;

        tracing::debug!(program = %self.program, args = ?self.args, "running validator");
        let status = self.run(workdir.path(), timeout)?;

        if status.success() {
            return Ok(Verdict::Valid);
        }

        let stdout = read_capture(&workdir.path().join(STDOUT_CAPTURE));
        let stderr = read_capture(&workdir.path().join(STDERR_CAPTURE));
        Ok(Verdict::Invalid(diagnostic(&stdout, &stderr, status)))
    }
}

fn create_capture(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| Error::io(path, e))
}

fn read_capture(path: &Path) -> String {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default()
}

/// Prefer stderr, fall back to stdout, then to the bare exit status
fn diagnostic(stdout: &str, stderr: &str, status: ExitStatus) -> String {
    if !stderr.is_empty() {
        stderr.to_string()
    } else if !stdout.is_empty() {
        stdout.to_string()
    } else {
        match status.code() {
            Some(code) => format!("validator exited with status {}", code),
            None => "validator terminated by signal".to_string(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandValidator {
        CommandValidator::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_zero_exit_is_valid() {
        let validator = shell("grep -q resource main.tf");
        let verdict = validator.validate("resource X {}", Duration::from_secs(10)).unwrap();
        assert_eq!(verdict, Verdict::Valid);
    }

    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let validator = shell("echo 'Error: Unsupported block type' >&2; exit 1");
        let verdict = validator.validate("bogus {}", Duration::from_secs(10)).unwrap();
        assert_eq!(verdict, Verdict::Invalid("Error: Unsupported block type".to_string()));
    }

    #[test]
    fn test_stdout_used_when_stderr_empty() {
        let validator = shell("echo 'only stdout'; exit 3");
        let verdict = validator.validate("x", Duration::from_secs(10)).unwrap();
        assert_eq!(verdict.diagnostic(), Some("only stdout"));
    }

    #[test]
    fn test_silent_failure_reports_status() {
        let validator = shell("exit 7");
        let verdict = validator.validate("x", Duration::from_secs(10)).unwrap();
        assert_eq!(verdict.diagnostic(), Some("validator exited with status 7"));
    }

    #[test]
    fn test_content_written_under_file_name() {
        let validator = shell("test \"$(cat vars.tfvars)\" = 'region = \"eu\"'")
            .with_file_name("vars.tfvars");
        let verdict = validator.validate("region = \"eu\"", Duration::from_secs(10)).unwrap();
        assert!(verdict.is_valid());
    }

    #[test]
    fn test_slow_validator_times_out() {
        let validator = shell("sleep 5");
        let started = Instant::now();
        let err = validator.validate("x", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let validator = CommandValidator::new("tfsource-no-such-validator", Vec::new());
        let err = validator.validate("x", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
