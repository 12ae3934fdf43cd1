//! Debug-mode persistence of raw links.
//!
//! A run in debug mode writes every raw link to `debug_<username>.json`. The next
//! debug run for the same username reads that file instead of querying sources.

use crate::error::EngineError;
use crate::link::Link;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CACHE_FILE_PREFIX: &str = "debug_";

#[derive(Serialize)]
struct CacheDocumentRef<'a> {
    res: &'a [Link],
}

#[derive(Deserialize)]
struct CacheDocument {
    res: Vec<CachedLink>,
}

#[derive(Deserialize)]
struct CachedLink {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    source: String,
}

/// Directory of `debug_<username>.json` files.
#[derive(Debug, Clone)]
pub struct RunCache {
    dir: PathBuf,
}

impl RunCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for `username`; path separators in the name are replaced.
    pub fn path_for(&self, username: &str) -> PathBuf {
        let safe: String = username
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '\0' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{}{}.json", CACHE_FILE_PREFIX, safe))
    }

    /// Links stored for `username`, or `None` when no cache file exists.
    ///
    /// Links are rebuilt from their raw fields, so they are normalized again and
    /// start unfiltered.
    pub fn load(&self, username: &str) -> Result<Option<Vec<Link>>, EngineError> {
        let path = self.path_for(username);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(EngineError::CacheIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let doc: CacheDocument =
            serde_json::from_str(&content).map_err(|source| EngineError::CacheFormat {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Some(
            doc.res
                .into_iter()
                .map(|l| Link::new(l.url, l.title, username, l.source))
                .collect(),
        ))
    }

    /// Write `links` for `username` as pretty JSON; returns the file path.
    pub fn store(&self, username: &str, links: &[Link]) -> Result<PathBuf, EngineError> {
        let path = self.path_for(username);
        let io_err = |source| EngineError::CacheIo {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let content = serde_json::to_string_pretty(&CacheDocumentRef { res: links }).map_err(
            |source| EngineError::CacheFormat {
                path: path.display().to_string(),
                source,
            },
        )?;
        std::fs::write(&path, content).map_err(io_err)?;
        Ok(path)
    }
}

impl Default for RunCache {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_username() {
        let cache = RunCache::new("/tmp/trawl");
        assert_eq!(
            cache.path_for("johndoe"),
            PathBuf::from("/tmp/trawl/debug_johndoe.json")
        );
        assert_eq!(
            cache.path_for("../etc/passwd"),
            PathBuf::from("/tmp/trawl/debug_.._etc_passwd.json")
        );
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RunCache::new(dir.path()).load("nobody").unwrap().is_none());
    }

    #[test]
    fn test_round_trip_resets_filter_flag() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RunCache::new(dir.path());

        let mut flagged = Link::new("https://site.com/about", "About", "john", "bing");
        flagged.mark_filtered();
        let links = vec![
            Link::new("https://GitHub.com/John/", "John · GitHub", "john", "google"),
            flagged,
        ];

        let path = cache.store("john", &links).unwrap();
        assert!(path.ends_with("debug_john.json"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["res"].as_array().unwrap().len(), 2);
        assert_eq!(raw["res"][1]["filtered"], true);

        let loaded = cache.load("john").unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].url(), "https://github.com/john");
        assert_eq!(loaded[0].title(), "John · GitHub");
        assert_eq!(loaded[0].source(), "google");
        assert!(!loaded[1].is_filtered());
    }

    #[test]
    fn test_malformed_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RunCache::new(dir.path());
        std::fs::write(cache.path_for("john"), "{\"links\": []}").unwrap();
        assert!(matches!(
            cache.load("john"),
            Err(EngineError::CacheFormat { .. })
        ));
    }
}
