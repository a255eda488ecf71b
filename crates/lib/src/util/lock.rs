//! Exclusive advisory lock on a store directory, shared by every process and
//! every handle that opens the same directory.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

const LOCK_FILENAME: &str = ".lock";

/// Held while a store mutates its files. Released on drop.
pub struct DirLock {
  _file: File,
  path: PathBuf,
}

impl DirLock {
  /// Block until `{dir}/.lock` is held exclusively.
  pub fn exclusive(dir: &Path) -> io::Result<Self> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOCK_FILENAME);

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&path)?;
    lock_exclusive(&file)?;

    Ok(DirLock { _file: file, path })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use rustix::io::Errno;
  use std::os::unix::io::AsFd;

  loop {
    match flock(file.as_fd(), FlockOperation::LockExclusive) {
      Ok(()) => return Ok(()),
      Err(Errno::INTR) => continue,
      Err(e) => return Err(io::Error::from_raw_os_error(e.raw_os_error())),
    }
  }
}

#[cfg(windows)]
fn lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized,
  // and `handle` stays open for the duration of the call.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, LOCKFILE_EXCLUSIVE_LOCK, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
