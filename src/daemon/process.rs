//! Starting the daemon as a detached background process.

use super::DaemonError;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Starts a daemon in the background. Returns once the process is spawned,
/// not once it is ready.
pub trait DaemonLauncher: Send + Sync {
    fn launch(&self) -> Result<(), DaemonError>;
}

/// Re-executes the current binary as `<exe> serve`, detached into its own
/// process group with output appended to the daemon log.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    exe: PathBuf,
    log_path: PathBuf,
    envs: Vec<(String, String)>,
}

impl ProcessLauncher {
    pub fn current_exe(log_path: impl Into<PathBuf>) -> Result<Self, DaemonError> {
        Ok(Self {
            exe: std::env::current_exe()?,
            log_path: log_path.into(),
            envs: Vec::new(),
        })
    }

    /// Extra environment for the child, e.g. the config home it should use.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl DaemonLauncher for ProcessLauncher {
    fn launch(&self) -> Result<(), DaemonError> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (stdout, stderr) = match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|log| Ok((log.try_clone()?, log)))
        {
            Ok((out, err)) => (Stdio::from(out), Stdio::from(err)),
            Err(e) => {
                tracing::warn!(path = %self.log_path.display(), error = %e, "Daemon log unavailable");
                (Stdio::null(), Stdio::null())
            }
        };

        let mut command = Command::new(&self.exe);
        command
            .arg("serve")
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn()?;
        tracing::info!(pid = child.id(), exe = %self.exe.display(), "Started fetch daemon");
        Ok(())
    }
}
