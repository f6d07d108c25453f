//! # Replacer Module
//!
//! Stamps project identifiers and generated fragments into a pre-authored
//! template tree.
//!
//! For every in-scope file of the tree:
//!
//! 1. marker regions are resolved first ([`RuleKind::DeleteSlot`] and
//!    [`RuleKind::InjectSlot`]), through [`SlotTemplate`];
//! 2. content substitutions run in caller order, one pass each;
//! 3. file-name and directory-name substitutions produce the destination path.
//!
//! Rules are never re-applied until nothing changes: a replacement value that
//! contains a token stays as written.
//!
//! A file that fails (unpaired marker, unreadable, not UTF-8) is recorded in
//! [`RenderedTree::failures`] and the rest of the tree still renders.

mod registry;
mod rule;
pub mod slots;
mod tree;

pub use registry::{TemplateRegistry, TemplateSet};
pub use rule::{token_variants, ReplacementRule, RuleKind, RuleScope};
pub use slots::{MarkerStyle, SlotFill, SlotTemplate};
pub use tree::{OutOfScope, RenderFailure, RenderedFile, RenderedTree, ScopeSelector};

use crate::error::{Result, ScaffoldError};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Applies replacement rules to template trees and standalone text
#[derive(Debug, Clone, Default)]
pub struct Replacer {
    markers: MarkerStyle,
}

impl Replacer {
    pub fn new(markers: MarkerStyle) -> Self {
        Replacer { markers }
    }

    pub fn markers(&self) -> &MarkerStyle {
        &self.markers
    }

    /// Content phase on a standalone text: slots, then substitutions
    ///
    /// `origin` labels marker errors.
    pub fn render_text(
        &self,
        text: &str,
        rules: &[ReplacementRule],
        origin: &Path,
    ) -> Result<String> {
        let template = SlotTemplate::parse(text, &self.markers, origin)?;
        let mut fills = BTreeMap::new();
        for rule in rules.iter().filter(|r| r.scope.content) {
            match &rule.kind {
                RuleKind::DeleteSlot { slot } => {
                    fills.insert(slot.clone(), SlotFill::Delete);
                }
                RuleKind::InjectSlot { slot, text } => {
                    fills.insert(slot.clone(), SlotFill::Inject(text.clone()));
                }
                RuleKind::Substitute { .. } => {}
            }
        }
        let mut out = template.render(&fills);
        for rule in rules.iter().filter(|r| r.scope.content && !r.is_slot_rule()) {
            out = rule.substitute_in(&out);
        }
        Ok(out)
    }

    /// Destination path of a template file
    pub fn render_path(&self, rel: &Path, rules: &[ReplacementRule]) -> PathBuf {
        let components: Vec<&OsStr> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        let last = components.len().saturating_sub(1);
        let mut out = PathBuf::new();
        for (index, part) in components.into_iter().enumerate() {
            let is_file = index == last;
            let mut name = part.to_string_lossy().into_owned();
            for rule in rules.iter().filter(|r| {
                !r.is_slot_rule() && if is_file { r.scope.file_name } else { r.scope.dir_name }
            }) {
                name = rule.substitute_in(&name);
            }
            out.push(name);
        }
        out
    }

    /// Render every file of the tree under `root`
    ///
    /// Fails only when `root` itself cannot be walked; per-file problems end
    /// up in the returned tree's failures.
    pub fn apply(
        &self,
        root: &Path,
        rules: &[ReplacementRule],
        scope: &ScopeSelector,
    ) -> Result<RenderedTree> {
        if !root.is_dir() {
            return Err(ScaffoldError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "template root is not a directory"),
            ));
        }

        let mut tree = RenderedTree::default();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %e, "skipping unreadable template entry");
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    tree.failures.push(RenderFailure {
                        error: ScaffoldError::io(&path, source),
                        path,
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };

            let in_scope = scope.includes(&rel);
            if !in_scope && scope.out_of_scope == OutOfScope::Omit {
                continue;
            }

            let bytes = match std::fs::read(entry.path()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tree.failures.push(RenderFailure {
                        error: ScaffoldError::io(entry.path(), e),
                        path: rel,
                    });
                    continue;
                }
            };

            if !in_scope {
                tree.files.push(RenderedFile {
                    rel_path: rel,
                    content: bytes,
                });
                continue;
            }

            match self.render_file(&rel, bytes, rules) {
                Ok(file) => {
                    debug!(template = %rel.display(), dest = %file.rel_path.display(), "rendered");
                    tree.files.push(file);
                }
                Err(error) => {
                    warn!(template = %rel.display(), %error, "template failed to render");
                    tree.failures.push(RenderFailure { path: rel, error });
                }
            }
        }
        Ok(tree)
    }

    fn render_file(
        &self,
        rel: &Path,
        bytes: Vec<u8>,
        rules: &[ReplacementRule],
    ) -> Result<RenderedFile> {
        let text = String::from_utf8(bytes).map_err(|e| {
            ScaffoldError::io(
                rel,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.utf8_error()),
            )
        })?;
        let content = self.render_text(&text, rules, rel)?;
        Ok(RenderedFile {
            rel_path: self.render_path(rel, rules),
            content: content.into_bytes(),
        })
    }
}

/// A placeholder token that survived rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leftover {
    pub rel_path: PathBuf,
    /// The variant found (`UserExample`, `user_example`, ...)
    pub token: String,
    /// Found in the path rather than the content
    pub in_path: bool,
}

/// Report every naming variant of `tokens` still present in `tree`
pub fn leftover_tokens(tree: &RenderedTree, tokens: &[&str]) -> Vec<Leftover> {
    let variants: Vec<String> = tokens.iter().flat_map(|t| token_variants(t)).collect();
    let mut found = Vec::new();
    for file in &tree.files {
        let path = file.rel_path.to_string_lossy();
        let text = file.text().unwrap_or_default();
        for variant in &variants {
            if path.contains(variant.as_str()) {
                found.push(Leftover {
                    rel_path: file.rel_path.clone(),
                    token: variant.clone(),
                    in_path: true,
                });
            }
            if text.contains(variant.as_str()) {
                found.push(Leftover {
                    rel_path: file.rel_path.clone(),
                    token: variant.clone(),
                    in_path: false,
                });
            }
        }
    }
    found
}
