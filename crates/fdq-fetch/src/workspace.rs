//! Per-run temporary workspace

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use fdq_core::Result;

const RELEASE_ATTEMPTS: u32 = 3;
const RELEASE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// A directory scoped to one orchestration run.
///
/// Every fetched file lives inside this directory, and callers must not
/// assume files persist past the run. The directory is unique per run so
/// concurrent runs never interfere through the filesystem.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create the workspace directory, including intermediate directories.
    ///
    /// Safe to call against an existing base path.
    pub fn acquire(base: &Path) -> Result<Self> {
        let root = base.join(format!("run-{}", Uuid::new_v4()));
        fs::create_dir_all(&root)?;
        debug!(path = %root.display(), "acquired workspace");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Recursively delete the workspace.
    ///
    /// Per-entry failures are logged and skipped after granting the owner
    /// write permission; if the top-level removal still fails, the whole
    /// release is retried up to [`RELEASE_ATTEMPTS`] times with a short
    /// delay. Exhausting the retries returns `false` and is never fatal to
    /// the run that used the workspace.
    pub async fn release(self) -> bool {
        self.release_with(|path| fs::remove_dir_all(path)).await
    }

    async fn release_with<F>(self, mut remove_root: F) -> bool
    where
        F: FnMut(&Path) -> std::io::Result<()>,
    {
        for attempt in 1..=RELEASE_ATTEMPTS {
            sweep_entries(&self.root);

            match remove_root(&self.root) {
                Ok(()) => {
                    debug!(path = %self.root.display(), "released workspace");
                    return true;
                }
                Err(e) if attempt < RELEASE_ATTEMPTS => {
                    warn!(
                        path = %self.root.display(),
                        error = %e,
                        attempt,
                        "workspace removal failed, retrying"
                    );
                    tokio::time::sleep(RELEASE_RETRY_DELAY).await;
                }
                Err(e) => {
                    warn!(
                        path = %self.root.display(),
                        error = %e,
                        "workspace removal failed after {RELEASE_ATTEMPTS} attempts"
                    );
                }
            }
        }

        false
    }
}

/// Best-effort removal of everything under `dir`.
///
/// Files are made writable before deletion so permission bits set by the
/// download cannot block cleanup; entries that still cannot be removed are
/// logged and left for the top-level retry.
fn sweep_entries(dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot list workspace entries");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        make_writable(&path);

        let removed = if path.is_dir() {
            sweep_entries(&path);
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };

        if let Err(e) = removed {
            warn!(path = %path.display(), error = %e, "cannot remove workspace entry");
        }
    }
}

fn make_writable(path: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            if let Err(e) = fs::set_permissions(path, permissions) {
                warn!(path = %path.display(), error = %e, "cannot restore write permission");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn locked_root() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "workspace root is locked")
    }

    #[tokio::test]
    async fn acquire_creates_a_unique_directory_per_run() {
        let base = tempfile::tempdir().unwrap();

        let first = Workspace::acquire(base.path()).unwrap();
        let second = Workspace::acquire(base.path()).unwrap();

        assert!(first.path().is_dir());
        assert!(second.path().is_dir());
        assert_ne!(first.path(), second.path());

        assert!(first.release().await);
        assert!(second.release().await);
    }

    #[tokio::test]
    async fn release_removes_nested_contents() {
        let base = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire(base.path()).unwrap();

        let nested = workspace.path().join("docs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("a.pdf"), b"pdf bytes").unwrap();
        fs::write(workspace.path().join("b.pdf"), b"pdf bytes").unwrap();

        let root = workspace.path().to_path_buf();
        assert!(workspace.release().await);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn release_retries_top_level_removal_up_to_the_bound() {
        let base = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire(base.path()).unwrap();
        fs::write(workspace.path().join("a.pdf"), b"pdf bytes").unwrap();

        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();
        let released = workspace
            .release_with(move |_path| {
                seen.fetch_add(1, Ordering::SeqCst);
                Err(locked_root())
            })
            .await;

        assert!(!released);
        assert_eq!(attempts.load(Ordering::SeqCst), RELEASE_ATTEMPTS);
    }

    #[tokio::test]
    async fn release_recovers_when_a_retry_succeeds() {
        let base = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire(base.path()).unwrap();

        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();
        let released = workspace
            .release_with(move |path| {
                if seen.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(locked_root())
                } else {
                    fs::remove_dir_all(path)
                }
            })
            .await;

        assert!(released);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn release_clears_readonly_files() {
        let base = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire(base.path()).unwrap();

        let file = workspace.path().join("locked.pdf");
        fs::write(&file, b"pdf bytes").unwrap();
        let mut permissions = fs::metadata(&file).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&file, permissions).unwrap();

        let root = workspace.path().to_path_buf();
        assert!(workspace.release().await);
        assert!(!root.exists());
    }
}
