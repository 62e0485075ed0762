//! On-disk store of downloaded race pages.
//!
//! Layout: `<base_dir>/<race key>/{race,result,odds}.html`, one folder per
//! race, named by the race card's query string.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The three documents kept for every race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    RaceCard,
    Result,
    Odds,
}

impl PageKind {
    pub const ALL: [PageKind; 3] = [PageKind::RaceCard, PageKind::Result, PageKind::Odds];

    /// File name inside a race folder
    pub fn file_name(&self) -> &'static str {
        match self {
            PageKind::RaceCard => "race.html",
            PageKind::Result => "result.html",
            PageKind::Odds => "odds.html",
        }
    }
}

/// File-based race page store
pub struct HtmlStore {
    base_dir: PathBuf,
}

impl HtmlStore {
    /// Create a store rooted at the given directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Folder for a race key
    pub fn race_dir(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }

    /// Write one page, creating the race folder. Existing files are overwritten.
    pub fn write(&self, key: &str, kind: PageKind, html: &str) -> Result<PathBuf> {
        let dir = self.race_dir(key);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(kind.file_name());
        std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }

    /// True when all three pages of a race are present
    pub fn is_complete(&self, key: &str) -> bool {
        let dir = self.race_dir(key);
        PageKind::ALL.iter().all(|kind| dir.join(kind.file_name()).is_file())
    }

    /// Read one page of a race folder
    pub fn read(race_dir: &Path, kind: PageKind) -> Result<String> {
        let path = race_dir.join(kind.file_name());
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// All race folders, sorted by folder name
    pub fn race_dirs(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to list {}", self.base_dir.display()))?;

        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HtmlStore::new(tmp.path().join("html"));

        let path = store
            .write("rno=1&jcd=01&hd=20240101", PageKind::Odds, "<html>odds</html>")
            .unwrap();
        assert!(path.ends_with("rno=1&jcd=01&hd=20240101/odds.html"));

        let dir = store.race_dir("rno=1&jcd=01&hd=20240101");
        assert_eq!(HtmlStore::read(&dir, PageKind::Odds).unwrap(), "<html>odds</html>");
        assert!(HtmlStore::read(&dir, PageKind::RaceCard).is_err());
    }

    #[test]
    fn test_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HtmlStore::new(tmp.path());

        store.write("k", PageKind::Result, "old").unwrap();
        store.write("k", PageKind::Result, "new").unwrap();
        assert_eq!(HtmlStore::read(&store.race_dir("k"), PageKind::Result).unwrap(), "new");
    }

    #[test]
    fn test_is_complete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HtmlStore::new(tmp.path());

        store.write("k", PageKind::RaceCard, "a").unwrap();
        store.write("k", PageKind::Result, "b").unwrap();
        assert!(!store.is_complete("k"));

        store.write("k", PageKind::Odds, "c").unwrap();
        assert!(store.is_complete("k"));
    }

    #[test]
    fn test_race_dirs_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HtmlStore::new(tmp.path());

        for key in ["rno=2&jcd=01&hd=20240101", "rno=10&jcd=01&hd=20240101", "rno=1&jcd=01&hd=20240101"] {
            store.write(key, PageKind::RaceCard, "x").unwrap();
        }
        std::fs::write(tmp.path().join("stray.txt"), "ignored").unwrap();

        let names: Vec<String> = store
            .race_dirs()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "rno=1&jcd=01&hd=20240101",
                "rno=10&jcd=01&hd=20240101",
                "rno=2&jcd=01&hd=20240101",
            ]
        );
    }

    #[test]
    fn test_missing_base_dir() {
        let store = HtmlStore::new("/nonexistent/boatrace/html");
        assert!(store.race_dirs().is_err());
    }
}
