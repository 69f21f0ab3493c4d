//! Directory tree adapter.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::detect::Fragment;

use super::{FragmentSource, SourceError};

/// How many leading bytes are inspected for the binary heuristic.
const BINARY_SNIFF_LEN: usize = 8000;

/// Walks a root directory, honoring gitignore syntax, and yields one
/// fragment per readable text file.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    follow_symlinks: bool,
    verbose: bool,
}

impl DirectorySource {
    /// Creates a walker rooted at `root`. Symlinks are skipped unless
    /// `follow_symlinks` is set.
    #[must_use]
    pub fn new(root: PathBuf, follow_symlinks: bool, verbose: bool) -> Self {
        Self {
            root,
            follow_symlinks,
            verbose,
        }
    }

    /// Path relative to the scan root, for stable finding coordinates.
    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

impl FragmentSource for DirectorySource {
    fn fragments(&self, sink: &mut dyn FnMut(Fragment)) -> Result<(), SourceError> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(self.follow_symlinks)
            .filter_entry(|entry| entry.file_name() != std::ffi::OsStr::new(".git"))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    if self.verbose {
                        eprintln!("[VERBOSE] skipping unreadable entry: {err}");
                    }
                    continue;
                }
            };
            if entry.file_type().map_or(true, |ft| !ft.is_file()) {
                continue;
            }

            let is_symlink = entry.path_is_symlink();
            if is_symlink && !self.follow_symlinks {
                continue;
            }

            // When a symlink is followed, the finding reports the
            // resolved target as its file and keeps the link path.
            let (file_path, symlink_path) = if is_symlink {
                match fs::canonicalize(entry.path()) {
                    Ok(target) => {
                        let target = match target.strip_prefix(
                            fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone()),
                        ) {
                            Ok(rel) => rel.to_path_buf(),
                            Err(_) => target,
                        };
                        (target, Some(self.relative(entry.path()).to_path_buf()))
                    }
                    Err(err) => {
                        if self.verbose {
                            eprintln!(
                                "[VERBOSE] skipping dangling symlink {}: {err}",
                                entry.path().display()
                            );
                        }
                        continue;
                    }
                }
            } else {
                (self.relative(entry.path()).to_path_buf(), None)
            };

            let bytes = match fs::read(entry.path()) {
                Ok(b) => b,
                Err(err) => {
                    eprintln!("WARN: could not read {}: {err}", entry.path().display());
                    continue;
                }
            };
            if bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0) {
                continue;
            }

            let mut fragment =
                Fragment::from_file(file_path, String::from_utf8_lossy(&bytes).into_owned());
            fragment.symlink_path = symlink_path;
            sink(fragment);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect(source: &DirectorySource) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        source.fragments(&mut |f| fragments.push(f)).unwrap();
        fragments
    }

    #[test]
    fn test_walk_yields_one_fragment_per_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "beta").unwrap();

        let source = DirectorySource::new(dir.path().to_path_buf(), false, false);
        let mut fragments = collect(&source);
        fragments.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].path, PathBuf::from("a.txt"));
        assert_eq!(fragments[0].raw, "alpha");
        assert_eq!(fragments[0].line_base, 1);
        assert_eq!(fragments[1].path, PathBuf::from("sub/b.txt"));
    }

    #[test]
    fn test_gitignore_is_honored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "ignored.txt\n").unwrap();
        fs::write(dir.path().join("ignored.txt"), "hidden").unwrap();
        fs::write(dir.path().join("kept.txt"), "visible").unwrap();

        let source = DirectorySource::new(dir.path().to_path_buf(), false, false);
        let fragments = collect(&source);
        assert!(fragments.iter().all(|f| f.path != PathBuf::from("ignored.txt")));
        assert!(fragments.iter().any(|f| f.path == PathBuf::from("kept.txt")));
    }

    #[test]
    fn test_binary_files_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blob.bin"), b"abc\x00def").unwrap();
        fs::write(dir.path().join("text.txt"), "plain").unwrap();

        let source = DirectorySource::new(dir.path().to_path_buf(), false, false);
        let fragments = collect(&source);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].path, PathBuf::from("text.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/real.txt"), "content").unwrap();
        std::os::unix::fs::symlink(dir.path().join("a/real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let skipping = DirectorySource::new(dir.path().to_path_buf(), false, false);
        assert_eq!(collect(&skipping).len(), 1);

        let following = DirectorySource::new(dir.path().to_path_buf(), true, false);
        let fragments = collect(&following);
        assert_eq!(fragments.len(), 2);
        let linked = fragments
            .iter()
            .find(|f| f.symlink_path.is_some())
            .expect("followed symlink fragment");
        assert_eq!(linked.path, PathBuf::from("a/real.txt"));
        assert_eq!(linked.symlink_path, Some(PathBuf::from("link.txt")));
    }
}
