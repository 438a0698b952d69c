//! Read-only access to the tree of files a summary refers to.

use std::{
  collections::HashMap,
  io,
  path::{Path, PathBuf},
};

use crate::error::FsError;

/// Reads files addressed by slash paths relative to some root.
pub trait FileReader {
  /// Returns the contents of `path`.
  ///
  /// # Errors
  ///
  /// Returns [`FsError::NotFound`] if there is no such file, and other
  /// variants for invalid paths or I/O failures.
  fn read_file(&self, path: &str) -> Result<String, FsError>;
}

impl<R: FileReader + ?Sized> FileReader for &R {
  fn read_file(&self, path: &str) -> Result<String, FsError> {
    (**self).read_file(path)
  }
}

/// Reports whether `path` names a file inside the root: not empty, not
/// rooted, and free of `.`, `..` and empty elements. `.` alone names the root.
#[must_use]
pub fn is_valid_path(path: &str) -> bool {
  if path == "." {
    return true;
  }
  !path.is_empty()
    && path
      .split('/')
      .all(|elem| !elem.is_empty() && elem != "." && elem != "..")
}

/// [`FileReader`] over a directory on disk.
#[derive(Debug, Clone)]
pub struct DirReader {
  root:          PathBuf,
  allow_outside: bool,
}

impl DirReader {
  #[must_use]
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root:          root.into(),
      allow_outside: false,
    }
  }

  /// Permits paths that escape the root through `..` or are absolute.
  #[must_use]
  pub const fn allow_outside(mut self, allow: bool) -> Self {
    self.allow_outside = allow;
    self
  }

  #[must_use]
  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl FileReader for DirReader {
  fn read_file(&self, path: &str) -> Result<String, FsError> {
    if !self.allow_outside && !is_valid_path(path) {
      return Err(FsError::InvalidPath(path.to_owned()));
    }

    let full = self.root.join(path);
    log::debug!("Reading {}", full.display());
    std::fs::read_to_string(&full).map_err(|source| {
      if source.kind() == io::ErrorKind::NotFound {
        FsError::NotFound(path.to_owned())
      } else {
        FsError::Io {
          path: path.to_owned(),
          source,
        }
      }
    })
  }
}

/// In-memory [`FileReader`], handy for tests and for callers that already
/// hold every file.
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
  files: HashMap<String, String>,
}

impl MemoryReader {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a file, replacing any previous contents.
  #[must_use]
  pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
    self.insert(path, contents);
    self
  }

  pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
    self.files.insert(path.into(), contents.into());
  }
}

impl FileReader for MemoryReader {
  fn read_file(&self, path: &str) -> Result<String, FsError> {
    if !is_valid_path(path) {
      return Err(FsError::InvalidPath(path.to_owned()));
    }
    self
      .files
      .get(path)
      .cloned()
      .ok_or_else(|| FsError::NotFound(path.to_owned()))
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryReader {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      files: iter
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect(),
    }
  }
}
