//! Disk-backed filesystem root
//!
//! Serves a directory tree from the local disk. Directory handles open fine
//! and report `is_dir` through `stat`, which is what lets the resolver fall
//! back to index documents.

use super::{base_name, FileMeta, Vfs, VfsFile};
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs;
use tokio::io::{AsyncRead, ReadBuf};

/// A filesystem root anchored at a disk directory
#[derive(Debug, Clone)]
pub struct DiskRoot {
    root: PathBuf,
}

impl DiskRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// An open disk entry (regular file or directory)
pub struct DiskFile {
    file: fs::File,
    name: String,
}

impl AsyncRead for DiskFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl VfsFile for DiskFile {
    async fn stat(&self) -> io::Result<FileMeta> {
        let meta = self.file.metadata().await?;
        Ok(FileMeta {
            name: self.name.clone(),
            is_dir: meta.is_dir(),
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

impl Vfs for DiskRoot {
    type File = DiskFile;

    async fn open(&self, path: &str) -> io::Result<DiskFile> {
        // The resolver hands over cleaned absolute paths, so the relative
        // part cannot contain `..` segments and stays inside the root.
        let relative = path.trim_start_matches('/');
        let full = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        };
        let file = fs::File::open(&full).await?;
        Ok(DiskFile {
            file,
            name: base_name(path),
        })
    }
}
