use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use crate::error::{Error, Result};

/// The backend executable, started with the client and killed with it.
///
/// Dropping the handle kills the process, so it lives exactly as long as
/// the application state that owns it.
#[derive(Debug)]
pub struct BackendProcess {
    path: PathBuf,
    child: Child,
}

impl BackendProcess {
    pub fn spawn(path: &Path) -> Result<Self> {
        let child = Command::new(path).spawn().map_err(|source| Error::Spawn {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("🚀 Started backend {} (pid {})", path.display(), child.id());
        Ok(Self {
            path: path.to_path_buf(),
            child,
        })
    }

    /// True while the process hasn't exited
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the process and reap it. Killing an exited process is not an error.
    pub fn kill(&mut self) -> Result<()> {
        if self.is_running() {
            self.child.kill()?;
        }
        self.child.wait()?;
        log::info!("🛑 Stopped backend {}", self.path.display());
        Ok(())
    }
}

impl Drop for BackendProcess {
    fn drop(&mut self) {
        if let Err(e) = self.kill() {
            log::warn!("⚠️  Could not stop backend {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_backend");
        match BackendProcess::spawn(&missing) {
            Err(Error::Spawn { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_after_exit_is_fine() {
        // `true` exits straight away, so kill only has to reap it
        let mut process = BackendProcess::spawn(Path::new("true")).unwrap();
        process.kill().unwrap();
        assert!(!process.is_running());
        drop(process);
    }
}
