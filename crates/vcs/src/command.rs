//! Subprocess execution for VCS tools

use std::path::{Path, PathBuf};
use tokio::process::Command;
use vendr_errors::{Error, VcsError};

/// A VCS command line, built up before it is run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl VcsCommand {
    /// Create a new command for `program`
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Add an argument to the command
    #[must_use]
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments to the command
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path argument
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        let display = path.display().to_string();
        self.arg(display)
    }

    /// Set the working directory for the command
    #[must_use]
    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Run the command to completion and return its stdout
    ///
    /// # Errors
    ///
    /// Returns `VcsError::SpawnFailed` when the tool cannot be started and
    /// `VcsError::CommandFailed` when it exits unsuccessfully.
    pub async fn run(&self) -> Result<String, Error> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        // Never block on credential prompts
        command.env("GIT_TERMINAL_PROMPT", "0");
        command.stdin(std::process::Stdio::null());

        let output = command
            .output()
            .await
            .map_err(|e| VcsError::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                program: self.program.clone(),
                args: self.args.join(" "),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
