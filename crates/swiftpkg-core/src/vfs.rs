//! File-system access layer
//!
//! The core never touches `std::fs` directly; everything goes through the
//! [`FileSystem`] capability trait so callers can substitute an in-memory
//! implementation. The registry manifest-fetch path relies on that: fetched
//! manifests are staged in an [`InMemoryFileSystem`] and never hit disk.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;

/// Capability set the core needs from a file system
pub trait FileSystem: Send + Sync {
    /// Read the contents of a file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write a file, replacing any previous contents
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Check whether anything exists at a path
    fn exists(&self, path: &Path) -> bool;

    /// Check whether a path refers to a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check whether a path refers to a directory
    fn is_directory(&self, path: &Path) -> bool;

    /// List the names of a directory's immediate children
    fn read_directory(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Create a directory and any missing parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a file or directory tree; removing a missing path is not an
    /// error
    fn remove_tree(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by the host file system
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_directory(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_tree(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else if path.exists() {
            std::fs::remove_file(path)
        } else {
            Ok(())
        }
    }
}

/// [`FileSystem`] held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Drop `.` components so equivalent spellings address the same entry
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn record_parents(directories: &mut HashSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        directories.insert(ancestor.to_path_buf());
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no entry at {}", path.display()))
}

impl FileSystem for InMemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let state = self.state.lock();
        state
            .files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state.lock();
        record_parents(&mut state.directories, &path);
        state.files.insert(path, contents.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        let state = self.state.lock();
        state.files.contains_key(&path) || state.directories.contains(&path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state.lock().files.contains_key(&normalize(path))
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.state.lock().directories.contains(&normalize(path))
    }

    fn read_directory(&self, path: &Path) -> io::Result<Vec<String>> {
        let path = normalize(path);
        let state = self.state.lock();
        if !state.directories.contains(&path) {
            return Err(not_found(&path));
        }
        let mut names = BTreeSet::new();
        for entry in state.files.keys().chain(state.directories.iter()) {
            if entry.parent() == Some(path.as_path()) {
                if let Some(name) = entry.file_name() {
                    names.insert(name.to_string_lossy().into_owned());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state.lock();
        record_parents(&mut state.directories, &path);
        state.directories.insert(path);
        Ok(())
    }

    fn remove_tree(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state.lock();
        state
            .files
            .retain(|entry, _| entry != &path && !entry.starts_with(&path));
        state
            .directories
            .retain(|entry| entry != &path && !entry.starts_with(&path));
        Ok(())
    }
}
