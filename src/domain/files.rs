use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Repository-relative path to textual content. Keys are unique; iteration is
/// in path order, which is the order files are committed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    files: BTreeMap<String, String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<str>, content: impl Into<String>) {
        self.files
            .insert(normalize_path(path.as_ref()), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize_path(path)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(path, content)| (path.as_str(), content.as_str()))
    }

    /// Merges `overlay` on top of `self`. On a path collision the overlay's
    /// content wins; for the PR workflow the overlay is the test file set.
    pub fn merged_with(&self, overlay: &FileSet) -> FileSet {
        let mut merged = self.clone();
        for (path, content) in overlay.iter() {
            merged.insert(path, content);
        }
        merged
    }

    pub fn collisions(&self, other: &FileSet) -> Vec<String> {
        self.files
            .keys()
            .filter(|path| other.files.contains_key(*path))
            .cloned()
            .collect()
    }
}

impl<P: AsRef<str>, C: Into<String>> FromIterator<(P, C)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for (path, content) in iter {
            set.insert(path, content);
        }
        set
    }
}

fn normalize_path(path: &str) -> String {
    let mut trimmed = path.trim();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_start_matches('/').replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_wins_on_collision() {
        let implementation: FileSet = [("a.py", "X"), ("b.py", "B")].into_iter().collect();
        let tests: FileSet = [("a.py", "Y")].into_iter().collect();

        let merged = implementation.merged_with(&tests);
        assert_eq!(merged.get("a.py"), Some("Y"));
        assert_eq!(merged.get("b.py"), Some("B"));
        assert_eq!(merged.len(), 2);
        assert_eq!(implementation.collisions(&tests), vec!["a.py"]);
    }

    #[test]
    fn normalizes_path_spellings() {
        let mut files = FileSet::new();
        files.insert("./src/main.py", "one");
        files.insert("/src/main.py", "two");
        assert_eq!(files.len(), 1);
        assert_eq!(files.get("src/main.py"), Some("two"));
    }

    #[test]
    fn iterates_in_path_order() {
        let files: FileSet = [("z.py", ""), ("a.py", ""), ("m/b.py", "")]
            .into_iter()
            .collect();
        assert_eq!(files.paths(), vec!["a.py", "m/b.py", "z.py"]);
    }
}
