//! Blocking process spawning.

use crate::{PlatformError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, trace};

/// Process builder.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    /// Program to execute.
    program: PathBuf,
    /// Arguments.
    args: Vec<String>,
    /// Environment variables to add/override.
    env_override: BTreeMap<String, String>,
}

impl ProcessBuilder {
    /// Create a new process builder.
    #[must_use]
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env_override: BTreeMap::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Set environment variable.
    #[must_use]
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env_override
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// The arguments.
    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Program and arguments as one line, for messages.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(char::is_whitespace) || arg.is_empty() {
                line.push_str(&format!("{arg:?}"));
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (k, v) in &self.env_override {
            cmd.env(k, v);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Execute and return output.
    ///
    /// # Errors
    /// Returns error if the process cannot be spawned.
    pub fn output(&self) -> Result<Output> {
        trace!(command = %self.command_line(), "spawning");
        self.build_command()
            .output()
            .map_err(|e| PlatformError::spawn_failed(self.command_line(), e.to_string()))
    }

    /// Execute, check for success and return stdout.
    ///
    /// # Errors
    /// Returns error if the command cannot be spawned or exits with non-zero
    /// status.
    pub fn run(&self) -> Result<String> {
        let output = self.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if output.status.success() {
            debug!(command = %self.command_line(), "process succeeded");
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PlatformError::ProcessFailed {
                command: self.command_line(),
                code: output.status.code().unwrap_or(-1),
                output: format!("{stdout}{stderr}").trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_spaces() {
        let builder = ProcessBuilder::new("pip")
            .arg("install")
            .args(["foo>=1", "bar; os_name == 'nt'"]);
        assert_eq!(builder.command_line(), r#"pip install foo>=1 "bar; os_name == 'nt'""#);
        assert_eq!(builder.get_args().len(), 3);
    }

    #[test]
    fn spawn_failure() {
        let err = ProcessBuilder::new("/definitely/not/a/program").run().unwrap_err();
        assert!(matches!(err, PlatformError::SpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_stdout() {
        let out = ProcessBuilder::new("sh")
            .args(["-c", "echo \"$GREETING\""])
            .env("GREETING", "hello")
            .run()
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_failure() {
        let err = ProcessBuilder::new("sh")
            .args(["-c", "echo oops >&2; exit 3"])
            .run()
            .unwrap_err();
        match err {
            PlatformError::ProcessFailed { code, output, .. } => {
                assert_eq!(code, 3);
                assert_eq!(output, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
