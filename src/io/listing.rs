// Name Index
// Case-insensitive index of file paths for stores that know their contents up front

use std::collections::{BTreeMap, BTreeSet};

use crate::resource::path::{normalize_dir, normalize_path};

/// Sorted set of `/`-separated file paths, looked up case-insensitively.
///
/// Keys are lowercased; values keep the spelling the file was added with.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    files: BTreeMap<String, String>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file path; returns the normalized spelling
    pub fn insert(&mut self, path: &str) -> String {
        let normalized = normalize_path(path);
        self.files
            .insert(normalized.to_lowercase(), normalized.clone());
        normalized
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(&normalize_path(path).to_lowercase())
    }

    /// Stored spelling of `path`, if present
    pub fn lookup(&self, path: &str) -> Option<&str> {
        self.files
            .get(&normalize_path(path).to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names directly inside `dir`
    pub fn files_in(&self, dir: &str) -> Vec<String> {
        let (prefix, depth) = dir_prefix(dir);
        self.under(&prefix)
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .filter_map(|(_, spelled)| spelled.split('/').nth(depth).map(str::to_string))
            .collect()
    }

    /// Names of the folders directly under `dir`
    pub fn folders_in(&self, dir: &str) -> Vec<String> {
        let (prefix, depth) = dir_prefix(dir);
        let mut seen = BTreeSet::new();
        let mut folders = Vec::new();
        for (key, spelled) in self.under(&prefix) {
            let rest = &key[prefix.len()..];
            let Some((folder, _)) = rest.split_once('/') else {
                continue;
            };
            if seen.insert(folder.to_string()) {
                if let Some(name) = spelled.split('/').nth(depth) {
                    folders.push(name.to_string());
                }
            }
        }
        folders
    }

    /// Every folder below `dir`, relative to it
    pub fn folders_recursive(&self, dir: &str) -> Vec<String> {
        let (prefix, depth) = dir_prefix(dir);
        let mut seen = BTreeSet::new();
        let mut folders = Vec::new();
        for (key, spelled) in self.under(&prefix) {
            let rest: Vec<&str> = key[prefix.len()..].split('/').collect();
            let spelled: Vec<&str> = spelled.split('/').skip(depth).collect();
            // Lowercasing never adds or removes a separator, so the segments
            // of key and spelling line up one to one.
            for n in 1..rest.len().min(spelled.len()) {
                if seen.insert(rest[..n].join("/")) {
                    folders.push(spelled[..n].join("/"));
                }
            }
        }
        folders.sort_by_key(|f| f.to_lowercase());
        folders
    }

    /// `(key, spelling)` of every file below the lowercased `prefix`
    fn under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a String)> + 'a {
        self.files
            .range(prefix.to_string()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
    }
}

/// Lowercased directory prefix and its number of segments
fn dir_prefix(dir: &str) -> (String, usize) {
    let prefix = normalize_dir(dir).to_lowercase();
    let depth = prefix.matches('/').count();
    (prefix, depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> NameIndex {
        let mut index = NameIndex::new();
        for path in [
            "Core/UI/door01.png",
            "core/ui/Icons/close.png",
            "ui/door01.redirect",
            "ui/readme.txt",
            "top.txt",
        ] {
            index.insert(path);
        }
        index
    }

    #[test]
    fn test_files_in_is_case_insensitive() {
        let index = index();
        assert_eq!(index.files_in("core/ui"), vec!["door01.png"]);
        assert_eq!(index.files_in("ui/"), vec!["door01.redirect", "readme.txt"]);
        assert_eq!(index.files_in(""), vec!["top.txt"]);
        assert!(index.files_in("missing").is_empty());
    }

    #[test]
    fn test_folders() {
        let index = index();
        assert_eq!(index.folders_in(""), vec!["Core", "ui"]);
        assert_eq!(index.folders_in("CORE"), vec!["UI"]);
        assert_eq!(
            index.folders_recursive(""),
            vec!["Core", "Core/UI", "core/ui/Icons", "ui"]
        );
        assert_eq!(index.folders_recursive("core/ui"), vec!["Icons"]);
    }

    #[test]
    fn test_lookup_keeps_spelling() {
        let mut index = index();
        assert_eq!(index.lookup("CORE/ui/DOOR01.png"), Some("Core/UI/door01.png"));
        assert_eq!(index.remove("top.txt"), Some("top.txt".to_string()));
        assert_eq!(index.lookup("top.txt"), None);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_case_folding_that_changes_byte_lengths() {
        // U+212A lowercases to one byte shorter, U+0130 to one byte longer.
        let mut index = NameIndex::new();
        index.insert("\u{212A}/\u{130}\u{130}/a.txt");
        index.insert("\u{212A}/b.txt");

        assert_eq!(index.folders_in(""), vec!["\u{212A}"]);
        assert_eq!(index.folders_in("k/"), vec!["\u{130}\u{130}"]);
        assert_eq!(index.files_in("k"), vec!["b.txt"]);
        assert_eq!(index.files_in("\u{212A}/\u{130}\u{130}"), vec!["a.txt"]);
        assert_eq!(
            index.folders_recursive(""),
            vec!["\u{212A}", "\u{212A}/\u{130}\u{130}"]
        );
    }
}
