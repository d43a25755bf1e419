use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// One external program invocation. `stdin` carries secrets and is never
/// included in the `Display` form used for logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    /// Inherit the terminal instead of capturing output (e.g. `az login`).
    pub interactive: bool,
}

impl CommandSpec {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            ..Self::default()
        }
    }

    /// Splits `invocation` into program + leading args, e.g. `["sudo", "docker"]`.
    pub fn from_invocation(invocation: &[&str]) -> Self {
        let mut spec = Self::new(invocation.first().copied().unwrap_or_default());
        spec.args = invocation
            .iter()
            .skip(1)
            .map(|s| s.to_string())
            .collect();
        spec
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Best single-line reason for a failed command.
    pub fn reason(&self) -> String {
        let err = self.stderr.trim();
        if !err.is_empty() {
            return err.lines().last().unwrap_or(err).to_string();
        }
        match self.code {
            Some(c) => format!("exit status {}", c),
            None => "terminated by signal".to_string(),
        }
    }
}

pub trait CommandRunner {
    /// Runs the command to completion. `Err` means it could not be started;
    /// a non-zero exit is reported through `CommandOutput::success`.
    fn run(&self, cmd: &CommandSpec) -> anyhow::Result<CommandOutput>;

    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Runs and turns a non-zero exit into an error.
    fn run_checked(&self, cmd: &CommandSpec) -> anyhow::Result<CommandOutput> {
        let out = self.run(cmd)?;
        if !out.success {
            anyhow::bail!("`{}` failed: {}", cmd, out.reason());
        }
        Ok(out)
    }
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> anyhow::Result<CommandOutput> {
        tracing::debug!(command = %cmd, "running");
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);

        if cmd.interactive {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|e| anyhow::anyhow!("cannot start `{}`: {}", cmd.program, e))?;
            return Ok(CommandOutput {
                success: status.success(),
                code: status.code(),
                ..CommandOutput::default()
            });
        }

        command
            .stdin(if cmd.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command
            .spawn()
            .map_err(|e| anyhow::anyhow!("cannot start `{}`: {}", cmd.program, e))?;
        if let Some(input) = &cmd.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())?;
            }
        }
        let out = child.wait_with_output()?;
        Ok(CommandOutput {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}
