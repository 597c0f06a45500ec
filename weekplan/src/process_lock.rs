//! Process-level lock serializing writers of one store.
//!
//! The planner reads every key at startup and writes full snapshots back, so two
//! concurrent mutating invocations would silently drop each other's edits. Each mutating
//! command holds `weekplan-store.lock` (an advisory `flock`) for its whole run; read-only
//! commands skip it.

use anyhow::{Context, Result};
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

const STORE_LOCK_FILE: &str = "weekplan-store.lock";

/// Held by a mutating command until it exits.
pub struct StoreWriterGuard {
    _lock: ProcessLock,
}

/// Acquire the writer lock for the store at `store_path`.
///
/// Fails immediately if another weekplan process is writing the same store.
pub fn acquire_store_guard(store_path: &Path) -> Result<StoreWriterGuard> {
    match try_acquire_lock(STORE_LOCK_FILE, store_path)? {
        Some(lock) => Ok(StoreWriterGuard { _lock: lock }),
        None => anyhow::bail!(
            "another weekplan command is modifying {}; try again when it finishes",
            store_path.display()
        ),
    }
}

struct ProcessLock {
    file: File,
    path: PathBuf,
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        let _ = unlock_file(&self.file);
        let _ = fs::remove_file(&self.path);
    }
}

fn try_acquire_lock(filename: &str, store_path: &Path) -> Result<Option<ProcessLock>> {
    let dir = lock_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create runtime lock directory: {}", dir.display()))?;

    let path = dir.join(scoped_lock_filename(filename, store_path));
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("failed to open lock file: {}", path.display()))?;

    match lock_file_nonblocking(&file) {
        Ok(()) => {
            // Owner pid, for debugging stale locks.
            let _ = file.set_len(0);
            let _ = file.seek(SeekFrom::Start(0));
            let _ = writeln!(file, "pid={}", std::process::id());
            let _ = file.flush();

            Ok(Some(ProcessLock { file, path }))
        }
        Err(e) if is_lock_busy(&e) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to lock file: {}", path.display())),
    }
}

fn lock_dir() -> PathBuf {
    let mut dir = match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir(),
    };
    dir.push("weekplan");
    dir
}

/// One lock per store file, so separate XDG roots never contend.
fn scoped_lock_filename(base_filename: &str, store_path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    store_path.to_string_lossy().hash(&mut hasher);
    let digest = hasher.finish();
    format!("{base_filename}.{digest:016x}")
}

fn is_lock_busy(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock)
        || matches!(error.raw_os_error(), Some(11) | Some(35))
}

#[cfg(unix)]
fn lock_file_nonblocking(file: &File) -> io::Result<()> {
    const LOCK_EX: i32 = 2;
    const LOCK_NB: i32 = 4;
    let fd = file.as_raw_fd();
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn unlock_file(file: &File) -> io::Result<()> {
    const LOCK_UN: i32 = 8;
    let fd = file.as_raw_fd();
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(fd, LOCK_UN) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
extern "C" {
    fn flock(fd: i32, operation: i32) -> i32;
}

#[cfg(not(unix))]
compile_error!("weekplan store locks currently require Unix (macOS/Linux)");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_names_are_scoped_per_store() {
        let a = scoped_lock_filename(STORE_LOCK_FILE, Path::new("/tmp/a/store.db"));
        let b = scoped_lock_filename(STORE_LOCK_FILE, Path::new("/tmp/b/store.db"));
        assert!(a.starts_with(STORE_LOCK_FILE));
        assert_ne!(a, b);
    }

    #[test]
    fn test_second_writer_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = dir.path().join("store.db");

        let first = acquire_store_guard(&store).unwrap();
        assert!(acquire_store_guard(&store).is_err());

        drop(first);
        assert!(acquire_store_guard(&store).is_ok());
    }
}
