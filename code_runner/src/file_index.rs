use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Base-name lookup over a submission tree.
///
/// Students zip their work with arbitrary nesting, so rubric scripts and
/// displayed files are referenced by name only. Hidden entries (dotfiles and
/// dot-directories) are not indexed. When two files share a name the first one
/// in sorted walk order wins.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    entries: HashMap<String, PathBuf>,
}

impl FileIndex {
    pub fn build(root: &Path) -> Self {
        let mut entries = HashMap::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.entry(name).or_insert_with(|| entry.into_path());
        }

        Self { entries }
    }

    pub fn resolve(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_files_at_any_depth_and_skips_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("hw1/src")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("hw1/src/search.py"), "print(1)").unwrap();
        fs::write(root.join("README"), "").unwrap();
        fs::write(root.join(".env"), "").unwrap();
        fs::write(root.join(".git/config"), "").unwrap();

        let index = FileIndex::build(root);

        assert_eq!(
            index.resolve("search.py"),
            Some(root.join("hw1/src/search.py").as_path())
        );
        assert!(index.resolve("README").is_some());
        assert!(index.resolve(".env").is_none());
        assert!(index.resolve("config").is_none());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn missing_root_gives_empty_index() {
        let dir = tempdir().unwrap();
        let index = FileIndex::build(&dir.path().join("nope"));
        assert!(index.is_empty());
    }
}
