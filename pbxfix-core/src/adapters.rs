//! Default filesystem-backed port implementations.

use crate::ports::{ReadPort, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Filesystem read operations.
#[derive(Debug, Clone, Default)]
pub struct FsReadPort;

impl ReadPort for FsReadPort {
    fn read_file(&self, path: &Utf8Path) -> anyhow::Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("read {}", path))
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

/// Keeps writes in memory. Used for dry runs and by embedders that want to
/// inspect output before touching disk.
#[derive(Debug, Default)]
pub struct RecordingWritePort {
    files: RefCell<BTreeMap<Utf8PathBuf, Vec<u8>>>,
    dirs: RefCell<BTreeSet<Utf8PathBuf>>,
}

impl RecordingWritePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }

    pub fn dirs(&self) -> Vec<Utf8PathBuf> {
        self.dirs.borrow().iter().cloned().collect()
    }
}

impl WritePort for RecordingWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        debug!(path = path.as_str(), bytes = contents.len(), "recorded write");
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        self.dirs.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }
}
