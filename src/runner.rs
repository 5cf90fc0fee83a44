use std::{
    path::Path,
    process::{Command, Stdio},
    time::Instant,
};

use tracing::{debug, error};

use crate::models::RunResult;

/// Something that evaluates a script file and reports the outcome.
pub trait Runner {
    fn invoke(&mut self, script: &Path) -> RunResult;
}

/// Runs the external interpreter as a blocking child process.
///
/// The script is always passed as a file path, never inline through an
/// evaluate flag: inline evaluation reports wrong line numbers.
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Runner for ProcessRunner {
    fn invoke(&mut self, script: &Path) -> RunResult {
        let start = Instant::now();

        // No timeout: a script that never finishes blocks the caller.
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(script)
            .stdin(Stdio::null())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                error!(program = %self.program, error = %e, "Failed to start interpreter");
                return RunResult::Failure {
                    stderr: format!("failed to start '{}': {}", self.program, e),
                };
            }
        };

        debug!(
            script = %script.display(),
            status = ?output.status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Interpreter finished"
        );

        if output.status.success() {
            RunResult::Success {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            }
        } else {
            RunResult::Failure {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        }
    }
}
