//! Collaborators that live in the user's desktop session: idle time,
//! notifications and the enable flag.

use crate::capability::*;
use crate::consts::*;
use crate::errors::*;
use crate::util::*;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

make_log_macro!(debug, "session");
make_log_macro!(warn, "session");

/// Idle time from `xprintidle`. If the tool is not installed the user is
/// reported as always active.
pub struct XPrintIdle {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    missing: bool,
}

impl Default for XPrintIdle {
    fn default() -> Self {
        Self {
            program: IDLE_COMMAND.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(1),
            missing: false,
        }
    }
}

#[async_trait]
impl IdleTimeProvider for XPrintIdle {
    async fn idle_ms(&mut self) -> Result<u64> {
        if self.missing {
            return Ok(0);
        }

        let program = &self.program;
        let mut command = Command::new(program);
        // A child that outlives the timeout is killed when its future is dropped
        command.args(&self.args).kill_on_drop(true);
        let output = match timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                warn!("'{program}' not found, inactivity dimming is disabled");
                self.missing = true;
                return Ok(0);
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(AlsError::Other(format!(
                    "'{program}' did not answer within {:?}",
                    self.timeout
                )));
            }
        };

        if !output.status.success() {
            return Err(AlsError::Other(format!(
                "'{program}' failed ({}), is an X server running?",
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().parse()?)
    }
}

/// Desktop notifications through `notify-send`.
pub struct NotifySend {
    brightness_max: u32,
    missing: bool,
}

impl NotifySend {
    pub fn new(brightness_max: u32) -> Self {
        Self {
            brightness_max,
            missing: false,
        }
    }

    fn args(&self, level: u32, lux: f64) -> Result<Vec<String>> {
        let percent =
            scale_to_clamped_percent(level as f64, self.brightness_max as f64, 10.0, 100.0)?;
        Ok(vec![
            "Brightness Updated".into(),
            format!("Set to {level} (Lux: {lux:.0})"),
            format!("--hint=int:value:{}", percent as u32),
            "--hint=string:x-canonical-private-icon:display-brightness".into(),
            "--expire-time=1500".into(),
        ])
    }
}

#[async_trait]
impl NotificationSink for NotifySend {
    async fn notify(&mut self, level: u32, lux: f64) -> Result<()> {
        if self.missing {
            return Ok(());
        }

        match Command::new(NOTIFY_COMMAND)
            .args(self.args(level, lux)?)
            .status()
            .await
        {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(AlsError::Other(format!(
                "'{NOTIFY_COMMAND}' exited with {status}"
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("'{NOTIFY_COMMAND}' not found, notifications are disabled");
                self.missing = true;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// The user's on/off switch for automatic brightness, kept in a small file.
///
/// A missing file means enabled, otherwise the content must be `1`.
pub struct FileToggle {
    path: PathBuf,
}

impl FileToggle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.als_controller_state`
    pub fn in_home() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| AlsError::Other("Could not determine the home directory".into()))?;
        Ok(Self::new(home.join(TOGGLE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<bool> {
        match read_file(&self.path).await {
            Ok(content) => Ok(content.trim() == "1"),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set(&self, enabled: bool) -> Result<()> {
        debug!("{} <- {enabled}", self.path.display());
        tokio::fs::write(&self.path, if enabled { "1\n" } else { "0\n" })
            .await
            .error(&format!("Could not write {}", self.path.display()))
    }

    /// Flip the flag, returning the new state.
    pub async fn toggle(&self) -> Result<bool> {
        let enabled = !self.read().await?;
        self.set(enabled).await?;
        Ok(enabled)
    }
}

#[async_trait]
impl EnableToggle for FileToggle {
    async fn is_enabled(&mut self) -> Result<bool> {
        self.read().await
    }
}
