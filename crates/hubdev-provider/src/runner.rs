//! Shell command execution
//!
//! Commands run through the platform shell so callers can pass arguments that
//! rely on quoting or substitution, the same way they would type them.

use crate::{ProviderError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Options for a single command invocation
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory (inherits the current directory when `None`)
    pub cwd: Option<PathBuf>,
    /// Arguments appended to the command line verbatim
    pub args: Vec<String>,
    /// Suppress command logging and output streaming
    pub silent: bool,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
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

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// Join a command and its arguments into the line handed to the shell
pub fn command_line(command: &str, args: &[String]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Single-quote a value for POSIX shells
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Runs external commands and returns their stdout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `options`. Resolves with the captured stdout when the
    /// process exits 0, otherwise fails with [`ProviderError::CommandFailed`].
    async fn run(&self, command: &str, options: &CommandOptions) -> Result<String>;
}

/// [`CommandRunner`] backed by the system shell
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    shell_flag: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner {
    #[cfg(not(windows))]
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
            shell_flag: "-c".to_string(),
        }
    }

    #[cfg(windows)]
    pub fn new() -> Self {
        Self {
            shell: "cmd".to_string(),
            shell_flag: "/C".to_string(),
        }
    }
}

#[derive(Clone, Copy)]
enum OutputTarget {
    Stdout,
    Stderr,
}

/// Read a child stream line by line until EOF, echoing unless silent.
/// Bytes that are not valid UTF-8 are replaced rather than treated as errors.
async fn collect_lines<R>(stream: Option<R>, target: OutputTarget, silent: bool) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut collected = String::new();
    let Some(stream) = stream else {
        return Ok(collected);
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        let line = String::from_utf8_lossy(&buf);
        if !silent {
            match target {
                OutputTarget::Stdout => println!("{}", line),
                OutputTarget::Stderr => eprintln!("{}", line),
            }
        }
        collected.push_str(&line);
        collected.push('\n');
    }

    Ok(collected)
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, options: &CommandOptions) -> Result<String> {
        let line = command_line(command, &options.args);

        if options.silent {
            tracing::debug!("running: {}", line);
        } else {
            tracing::info!("command: {}", line);
        }

        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.shell_flag).arg(&line);
        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (output, _) = tokio::try_join!(
            collect_lines(stdout, OutputTarget::Stdout, options.silent),
            collect_lines(stderr, OutputTarget::Stderr, options.silent),
        )?;

        let status = child.wait().await?;
        if !status.success() {
            return Err(ProviderError::CommandFailed {
                command: line,
                code: status.code(),
            });
        }

        Ok(output)
    }
}
