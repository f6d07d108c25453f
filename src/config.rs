//! Run configuration.
//!
//! Read once at startup from `scaffold.toml` (or `--config`) and shared as an
//! immutable `Arc<ScaffoldConfig>`. Every key is optional:
//!
//! ```toml
//! template_root = "scaffold"
//! default_template_set = "service"
//! table_prefix = "t_"
//!
//! [template_sets]
//! minimal = "/opt/templates/minimal"
//!
//! [layout]
//! dao = "src/repository"
//!
//! [markers]
//! begin = "// scaffold:begin"
//! end = "// scaffold:end"
//! ```
//!
//! `SCAFFOLD_TEMPLATE_ROOT` overrides `template_root`.

use crate::error::{Result, ScaffoldError};
use crate::replacer::{MarkerStyle, TemplateRegistry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "scaffold.toml";

/// Environment variable overriding the template root
pub const TEMPLATE_ROOT_ENV: &str = "SCAFFOLD_TEMPLATE_ROOT";

/// Name of the template set shipped with the crate
pub const BUILTIN_TEMPLATE_SET: &str = "service";

/// Template trees shipped with the crate
pub const BUILTIN_TEMPLATE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/scaffold");

/// Directories generated files are placed in, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    pub model: PathBuf,
    pub dao: PathBuf,
    pub routers: PathBuf,
    pub handler: PathBuf,
    pub service: PathBuf,
    pub ecode: PathBuf,
    pub tests: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            model: "src/model".into(),
            dao: "src/dao".into(),
            routers: "src/routers".into(),
            handler: "src/handler".into(),
            service: "src/service".into(),
            ecode: "src/ecode".into(),
            tests: "tests".into(),
        }
    }
}

impl Layout {
    /// Move a template-relative path into the configured layout
    ///
    /// Template trees are authored against [`Layout::default`]; a file under
    /// one of the default directories is moved under the configured one.
    /// Anything else keeps its path.
    pub fn relocate(&self, rel: &Path) -> PathBuf {
        let defaults = Layout::default();
        let pairs = [
            (&defaults.model, &self.model),
            (&defaults.dao, &self.dao),
            (&defaults.routers, &self.routers),
            (&defaults.handler, &self.handler),
            (&defaults.service, &self.service),
            (&defaults.ecode, &self.ecode),
            (&defaults.tests, &self.tests),
        ];
        for (from, to) in pairs {
            if let Ok(rest) = rel.strip_prefix(from) {
                return to.join(rest);
            }
        }
        rel.to_path_buf()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaffoldConfig {
    /// Directory holding the built-in template sets
    pub template_root: PathBuf,
    /// Template set used when a command names none
    pub default_template_set: Option<String>,
    /// Extra template sets, name to directory
    pub template_sets: BTreeMap<String, PathBuf>,
    pub layout: Layout,
    pub markers: MarkerStyle,
    /// Prefix stripped from table names (`t_order` becomes `order`)
    pub table_prefix: Option<String>,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        ScaffoldConfig {
            template_root: PathBuf::from(BUILTIN_TEMPLATE_ROOT),
            default_template_set: None,
            template_sets: BTreeMap::new(),
            layout: Layout::default(),
            markers: MarkerStyle::default(),
            table_prefix: None,
        }
    }
}

impl ScaffoldConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ScaffoldError::InvalidConfig(e.to_string()))
    }

    /// Load the run configuration
    ///
    /// An explicit path must exist. Without one, `scaffold.toml` in the
    /// working directory is used when present, built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Arc<Self>> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ScaffoldError::InvalidConfig(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let mut config = match &path {
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|e| ScaffoldError::io(path, e))?;
                let config = Self::from_toml(&text).map_err(|e| match e {
                    ScaffoldError::InvalidConfig(message) => {
                        ScaffoldError::InvalidConfig(format!("{}: {message}", path.display()))
                    }
                    other => other,
                })?;
                debug!(config = %path.display(), "loaded configuration");
                config
            }
            None => Self::default(),
        };

        if let Ok(root) = std::env::var(TEMPLATE_ROOT_ENV) {
            if !root.is_empty() {
                config.template_root = PathBuf::from(root);
            }
        }
        Ok(Arc::new(config))
    }

    /// Registry of every template set this configuration knows about
    ///
    /// The built-in `service` set lives under `template_root`; relative
    /// `[template_sets]` entries resolve against `template_root` as well.
    pub fn template_registry(&self) -> Result<TemplateRegistry> {
        let mut registry = TemplateRegistry::new();
        registry.register(
            BUILTIN_TEMPLATE_SET,
            self.template_root.join(BUILTIN_TEMPLATE_SET),
        );
        for (name, dir) in &self.template_sets {
            registry.register(name.clone(), self.template_root.join(dir));
        }
        if let Some(name) = &self.default_template_set {
            registry.set_default(name)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = ScaffoldConfig::from_toml(
            r##"
table_prefix = "t_"

[layout]
dao = "src/repository"

[markers]
begin = "# >>>"
"##,
        )
        .unwrap();
        assert_eq!(config.table_prefix.as_deref(), Some("t_"));
        assert_eq!(config.layout.dao, PathBuf::from("src/repository"));
        assert_eq!(config.layout.model, PathBuf::from("src/model"));
        assert_eq!(config.markers.begin, "# >>>");
        assert_eq!(config.markers.end, "// scaffold:end");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ScaffoldConfig::from_toml("templates = \"x\"").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_relocate() {
        let layout = Layout {
            dao: "src/repository".into(),
            ..Layout::default()
        };
        assert_eq!(
            layout.relocate(Path::new("src/dao/order_dao.rs")),
            PathBuf::from("src/repository/order_dao.rs")
        );
        assert_eq!(
            layout.relocate(Path::new("Cargo.toml")),
            PathBuf::from("Cargo.toml")
        );
    }

    #[test]
    fn test_registry_default_set() {
        let mut config = ScaffoldConfig::default();
        config
            .template_sets
            .insert("minimal".into(), PathBuf::from("/tmp/minimal"));
        config.default_template_set = Some("minimal".into());
        let registry = config.template_registry().unwrap();
        assert_eq!(registry.resolve(None).unwrap().name, "minimal");
        assert!(registry.get(BUILTIN_TEMPLATE_SET).is_ok());

        config.default_template_set = Some("web".into());
        assert!(config.template_registry().is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ScaffoldConfig::load(Some(Path::new("/no/such/scaffold.toml"))).unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidConfig(_)));
    }
}
