use crate::browser::{BrowserDriver, BrowserSession, DriverError};
use crate::config::{BrowserConfig, TimeoutsConfig};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Longest argument echoed into error messages and logs
const MAX_ARG_DISPLAY: usize = 80;

/// Per-command deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTimeouts {
    pub viewport: Duration,
    pub open: Duration,
    pub wait: Duration,
    pub screenshot: Duration,
    pub html: Duration,
    pub eval: Duration,
}

impl From<&TimeoutsConfig> for CommandTimeouts {
    fn from(config: &TimeoutsConfig) -> Self {
        Self {
            viewport: Duration::from_secs(config.viewport),
            open: Duration::from_secs(config.open),
            wait: Duration::from_secs(config.wait),
            screenshot: Duration::from_secs(config.screenshot),
            html: Duration::from_secs(config.html),
            eval: Duration::from_secs(config.eval),
        }
    }
}

impl Default for CommandTimeouts {
    fn default() -> Self {
        Self::from(&TimeoutsConfig::default())
    }
}

/// Driver backed by a session-scoped browser CLI
///
/// Every command runs as `<command> --session <name> <args...>`. The tool
/// keeps each named browser alive between invocations, so a session handle
/// is only a name plus the settings needed to spawn the tool.
#[derive(Debug, Clone)]
pub struct AgentBrowser {
    command: String,
    home_dir: Option<PathBuf>,
    timeouts: CommandTimeouts,
}

impl AgentBrowser {
    pub fn new(command: impl Into<String>, home_dir: Option<PathBuf>, timeouts: CommandTimeouts) -> Self {
        Self {
            command: command.into(),
            home_dir,
            timeouts,
        }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.home_dir.clone(),
            CommandTimeouts::from(&config.timeouts),
        )
    }
}

impl BrowserDriver for AgentBrowser {
    type Session = AgentSession;

    fn session(&self, name: &str) -> Result<AgentSession, DriverError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(DriverError::Session(
                name.to_string(),
                "session names must be non-empty and contain no whitespace".to_string(),
            ));
        }
        Ok(AgentSession {
            name: name.to_string(),
            command: self.command.clone(),
            home_dir: self.home_dir.clone(),
            timeouts: self.timeouts,
        })
    }
}

/// One named session of an [`AgentBrowser`]
#[derive(Debug)]
pub struct AgentSession {
    name: String,
    command: String,
    home_dir: Option<PathBuf>,
    timeouts: CommandTimeouts,
}

impl AgentSession {
    /// Runs one driver command and returns its trimmed stdout
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<String, DriverError> {
        let label = describe(args);
        tracing::trace!("[{}] {}", self.name, label);

        let mut cmd = Command::new(&self.command);
        cmd.arg("--session")
            .arg(&self.name)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(home) = &self.home_dir {
            cmd.env("HOME", home);
        }

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => {
                return Err(DriverError::Timeout {
                    command: label,
                    limit: timeout,
                })
            }
            Ok(Err(source)) => {
                return Err(DriverError::Spawn {
                    command: label,
                    source,
                })
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(DriverError::Failed {
                command: label,
                code: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl BrowserSession for AgentSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        let (w, h) = (width.to_string(), height.to_string());
        self.run(&["set", "viewport", w.as_str(), h.as_str()], self.timeouts.viewport)
            .await
            .map(drop)
    }

    async fn open(&mut self, url: &str) -> Result<(), DriverError> {
        self.run(&["open", url], self.timeouts.open).await.map(drop)
    }

    async fn wait(&mut self, millis: u64) -> Result<(), DriverError> {
        let ms = millis.to_string();
        self.run(&["wait", ms.as_str()], self.timeouts.wait).await.map(drop)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        let target = path.to_string_lossy();
        self.run(&["screenshot", "--full", target.as_ref()], self.timeouts.screenshot)
            .await
            .map(drop)
    }

    async fn html(&mut self) -> Result<String, DriverError> {
        self.run(&["get", "html", "html"], self.timeouts.html).await
    }

    async fn eval(&mut self, script: &str) -> Result<String, DriverError> {
        self.run(&["eval", script], self.timeouts.eval).await
    }
}

/// Short human-readable form of a command line
fn describe(args: &[&str]) -> String {
    args.iter()
        .map(|arg| {
            let single_line = arg.lines().next().unwrap_or("");
            if single_line.len() < arg.len() || arg.chars().count() > MAX_ARG_DISPLAY {
                let head: String = single_line.chars().take(MAX_ARG_DISPLAY).collect();
                format!("{}...", head)
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
