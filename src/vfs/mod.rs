//! Virtual filesystem module
//!
//! The abstraction the content resolver works against. A [`Vfs`] maps
//! URL-style paths to openable handles; a handle yields its metadata through
//! a separate fallible `stat` step, mirroring how filesystem lookups can
//! succeed while metadata retrieval still fails.

pub mod disk;
pub mod mem;

pub use disk::DiskRoot;
pub use mem::MemRoot;

use std::future::Future;
use std::io;
use std::time::SystemTime;
use tokio::io::AsyncRead;

/// Metadata of an opened filesystem entry
#[derive(Debug, Clone)]
pub struct FileMeta {
    /// Base name of the entry
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Last modification time, if the backing store tracks one
    pub modified: Option<SystemTime>,
    /// Size in bytes (0 for directories)
    pub len: u64,
}

/// An open, readable filesystem handle
pub trait VfsFile: AsyncRead + Send + Unpin {
    /// Retrieve the entry's metadata
    fn stat(&self) -> impl Future<Output = io::Result<FileMeta>> + Send;
}

/// A filesystem root that resolves URL-style paths to handles
///
/// Paths handed to `open` are expected to be lexically cleaned absolute
/// paths (leading `/`, no `.` or `..` segments); the content resolver
/// guarantees this.
pub trait Vfs: Send + Sync {
    type File: VfsFile;

    fn open(&self, path: &str) -> impl Future<Output = io::Result<Self::File>> + Send;
}

/// Base name of a cleaned absolute path, for handle metadata
pub(crate) fn base_name(path: &str) -> String {
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("/")
        .to_string()
}
