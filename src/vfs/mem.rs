//! In-memory filesystem root
//!
//! A small path-keyed tree, useful for embedded assets and for exercising
//! the resolver and handlers without touching the disk. Adding a file
//! creates its ancestor directories implicitly.

use super::{base_name, FileMeta, Vfs, VfsFile};
use hyper::body::Bytes;
use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::SystemTime;
use tokio::io::{AsyncRead, ReadBuf};

#[derive(Debug, Clone)]
enum MemEntry {
    File {
        data: Bytes,
        modified: Option<SystemTime>,
    },
    Dir,
}

/// An in-memory filesystem keyed by cleaned absolute paths
#[derive(Debug, Clone, Default)]
pub struct MemRoot {
    entries: HashMap<String, MemEntry>,
}

impl MemRoot {
    #[must_use]
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert("/".to_string(), MemEntry::Dir);
        Self { entries }
    }

    /// Insert a file, creating ancestor directories as needed
    pub fn add_file(&mut self, path: &str, data: impl Into<Bytes>) {
        self.add_file_with_modified(path, data, None);
    }

    /// Insert a file with an explicit modification time
    pub fn add_file_with_modified(
        &mut self,
        path: &str,
        data: impl Into<Bytes>,
        modified: Option<SystemTime>,
    ) {
        self.add_ancestors(path);
        self.entries.insert(
            path.to_string(),
            MemEntry::File {
                data: data.into(),
                modified,
            },
        );
    }

    /// Insert an empty directory
    pub fn add_dir(&mut self, path: &str) {
        self.add_ancestors(path);
        self.entries.insert(path.to_string(), MemEntry::Dir);
    }

    fn add_ancestors(&mut self, path: &str) {
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let parent = if prefix.is_empty() { "/" } else { &prefix };
            self.entries
                .entry(parent.to_string())
                .or_insert(MemEntry::Dir);
            prefix = format!("{prefix}/{segment}");
        }
    }
}

/// An opened in-memory entry
#[derive(Debug)]
pub struct MemFile {
    cursor: Cursor<Bytes>,
    meta: FileMeta,
}

impl AsyncRead for MemFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.cursor).poll_read(cx, buf)
    }
}

impl VfsFile for MemFile {
    async fn stat(&self) -> io::Result<FileMeta> {
        Ok(self.meta.clone())
    }
}

impl Vfs for MemRoot {
    type File = MemFile;

    async fn open(&self, path: &str) -> io::Result<MemFile> {
        let key = if path == "/" {
            "/"
        } else {
            path.trim_end_matches('/')
        };
        match self.entries.get(key) {
            Some(MemEntry::File { data, modified }) => Ok(MemFile {
                meta: FileMeta {
                    name: base_name(key),
                    is_dir: false,
                    modified: *modified,
                    len: data.len() as u64,
                },
                cursor: Cursor::new(data.clone()),
            }),
            Some(MemEntry::Dir) => Ok(MemFile {
                meta: FileMeta {
                    name: base_name(key),
                    is_dir: true,
                    modified: None,
                    len: 0,
                },
                cursor: Cursor::new(Bytes::new()),
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such entry")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn file_round_trip() {
        let mut root = MemRoot::new();
        root.add_file("/a/b.txt", &b"payload"[..]);

        let mut file = root.open("/a/b.txt").await.unwrap();
        let meta = file.stat().await.unwrap();
        assert_eq!(meta.name, "b.txt");
        assert_eq!(meta.len, 7);
        assert!(!meta.is_dir);

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"payload");
    }

    #[tokio::test]
    async fn ancestors_exist_as_directories() {
        let mut root = MemRoot::new();
        root.add_file("/a/b/c.txt", &b"x"[..]);

        for dir in ["/", "/a", "/a/b"] {
            let meta = root.open(dir).await.unwrap().stat().await.unwrap();
            assert!(meta.is_dir, "{dir} should be a directory");
        }
    }

    #[tokio::test]
    async fn missing_entry_is_not_found() {
        let root = MemRoot::new();
        let err = root.open("/ghost").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
