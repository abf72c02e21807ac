use std::io;
use std::path::{Path, PathBuf};

/// Loads text resources (script files) named in a layout.
pub trait ResourceResolver: Send + Sync {
    /// Read the resource at `path` as UTF-8 text.
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// Reads from the filesystem, resolving relative paths against `base`.
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    base: Option<PathBuf>,
}

impl FsResolver {
    /// Resolve relative paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ResourceResolver for FsResolver {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("id.rhai"), "fn matches_line(ctx, line) { true }").unwrap();

        let resolver = FsResolver::with_base(dir.path());
        let body = resolver.read_to_string("id.rhai").unwrap();
        assert!(body.contains("matches_line"));

        let absolute = dir.path().join("id.rhai");
        let body = FsResolver::new()
            .read_to_string(absolute.to_str().unwrap())
            .unwrap();
        assert!(body.contains("matches_line"));
    }

    #[test]
    fn missing_resource_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsResolver::with_base(dir.path())
            .read_to_string("absent.rhai")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
