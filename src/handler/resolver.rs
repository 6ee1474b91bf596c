//! Content resolution module
//!
//! Maps a request path to an openable, stat-able resource in a virtual
//! filesystem, with directory-to-index fallback: a path that resolves to a
//! directory is retried once with the configured index document appended.

use crate::vfs::{FileMeta, Vfs, VfsFile};

/// Lexically clean a URL path.
///
/// The result is always absolute: a missing leading `/` is added, `.` and
/// empty segments are dropped, and `..` pops the previous segment (ignored
/// at the root). This keeps every resolved path inside the filesystem root
/// without consulting the filesystem.
pub fn clean_path(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    if stack.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", stack.join("/"))
    }
}

/// Resolve a URL path against a filesystem root.
///
/// Opens the cleaned path and retrieves its metadata; when the path is a
/// directory, retries once with `index_file` appended. Every failure (open,
/// stat, or an index document that is itself a directory) collapses to
/// `None` — callers cannot distinguish "missing" from "unreadable", which
/// is all a fallback-serving layer needs.
///
/// A returned handle always carries successfully retrieved metadata.
pub async fn resolve<F: Vfs>(
    fs: &F,
    url_path: &str,
    index_file: &str,
) -> Option<(F::File, FileMeta)> {
    let mut path = clean_path(url_path);

    // At most one directory-to-index redirection: nested "the index is
    // itself a directory" chains are treated as unresolvable.
    for redirected in [false, true] {
        let file = fs.open(&path).await.ok()?;
        let meta = file.stat().await.ok()?;
        if !meta.is_dir {
            return Some((file, meta));
        }
        if redirected {
            return None;
        }
        path = format!("{}/{index_file}", path.trim_end_matches('/'));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemRoot;

    fn site() -> MemRoot {
        let mut root = MemRoot::new();
        root.add_file("/index.html", &b"<p>home</p>"[..]);
        root.add_file("/docs/index.html", &b"<p>docs</p>"[..]);
        root.add_file("/docs/guide.html", &b"<p>guide</p>"[..]);
        // A directory whose index entry is itself a directory.
        root.add_dir("/weird/index.html");
        root
    }

    #[test]
    fn clean_path_normalizes() {
        assert_eq!(clean_path("/a/b/c"), "/a/b/c");
        assert_eq!(clean_path("a/b"), "/a/b");
        assert_eq!(clean_path("/a//b/"), "/a/b");
        assert_eq!(clean_path("/a/./b"), "/a/b");
        assert_eq!(clean_path("/a/b/../c"), "/a/c");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path(""), "/");
    }

    #[test]
    fn clean_path_blocks_traversal() {
        assert_eq!(clean_path("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(clean_path("../../../x"), "/x");
        assert_eq!(clean_path("/a/../../.."), "/");
    }

    #[tokio::test]
    async fn regular_file_resolves_unchanged() {
        let fs = site();
        let (_, meta) = resolve(&fs, "/docs/guide.html", "index.html")
            .await
            .unwrap();
        assert_eq!(meta.name, "guide.html");
        assert!(!meta.is_dir);
    }

    #[tokio::test]
    async fn directory_falls_back_to_index_once() {
        let fs = site();
        let (_, meta) = resolve(&fs, "/docs/", "index.html").await.unwrap();
        assert_eq!(meta.name, "index.html");
        assert_eq!(meta.len, 11);
    }

    #[tokio::test]
    async fn root_directory_resolves_to_root_index() {
        let fs = site();
        let (_, meta) = resolve(&fs, "/", "index.html").await.unwrap();
        assert_eq!(meta.name, "index.html");
    }

    #[tokio::test]
    async fn index_that_is_a_directory_is_not_found() {
        let fs = site();
        assert!(resolve(&fs, "/weird", "index.html").await.is_none());
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let fs = site();
        assert!(resolve(&fs, "/nope.html", "index.html").await.is_none());
    }

    #[tokio::test]
    async fn uncleaned_path_reaches_the_same_file() {
        let fs = site();
        let (_, meta) = resolve(&fs, "docs/../docs//guide.html", "index.html")
            .await
            .unwrap();
        assert_eq!(meta.name, "guide.html");
    }
}
