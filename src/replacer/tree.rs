use crate::error::ScaffoldError;
use std::path::{Component, Path, PathBuf};

/// What happens to files outside the selected scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfScope {
    /// Leave them out of the rendered tree
    #[default]
    Omit,
    /// Copy them into the rendered tree untouched
    PassThrough,
}

/// Restricts which files of a template tree a run processes
///
/// `sub_dirs` are relative to the template root; an empty list selects the
/// whole tree. Inside the selection, `ignore_dirs` (relative paths or bare
/// directory names) and `ignore_files` (file names or relative paths) are
/// excluded again.
#[derive(Debug, Clone, Default)]
pub struct ScopeSelector {
    pub sub_dirs: Vec<PathBuf>,
    pub ignore_dirs: Vec<PathBuf>,
    pub ignore_files: Vec<String>,
    pub out_of_scope: OutOfScope,
}

impl ScopeSelector {
    /// Everything in scope
    pub fn all() -> Self {
        Self::default()
    }

    pub fn sub_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sub_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ignore_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn out_of_scope(mut self, policy: OutOfScope) -> Self {
        self.out_of_scope = policy;
        self
    }

    /// Whether the file at `rel` (relative to the template root) is processed
    pub fn includes(&self, rel: &Path) -> bool {
        let selected =
            self.sub_dirs.is_empty() || self.sub_dirs.iter().any(|dir| rel.starts_with(dir));
        if !selected {
            return false;
        }
        let parent = rel.parent().unwrap_or(Path::new(""));
        let dir_ignored = self.ignore_dirs.iter().any(|dir| {
            parent.starts_with(dir)
                || (dir.components().count() == 1
                    && parent
                        .components()
                        .any(|c| matches!(c, Component::Normal(n) if Path::new(n) == dir.as_path())))
        });
        if dir_ignored {
            return false;
        }
        let file_name = rel.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        !self
            .ignore_files
            .iter()
            .any(|f| f == file_name || rel == Path::new(f))
    }
}

/// One file of a rendered tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Destination path relative to the output root
    pub rel_path: PathBuf,
    pub content: Vec<u8>,
}

impl RenderedFile {
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// A template file that could not be rendered
#[derive(Debug)]
pub struct RenderFailure {
    /// Path of the template file, relative to the template root
    pub path: PathBuf,
    pub error: ScaffoldError,
}

/// Output of one replacement run
#[derive(Debug, Default)]
pub struct RenderedTree {
    pub files: Vec<RenderedFile>,
    pub failures: Vec<RenderFailure>,
}

impl RenderedTree {
    pub fn file(&self, rel_path: impl AsRef<Path>) -> Option<&RenderedFile> {
        let rel_path = rel_path.as_ref();
        self.files.iter().find(|f| f.rel_path == rel_path)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
