use crate::error::{Result, ScaffoldError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A named template tree on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub name: String,
    pub root: PathBuf,
}

impl TemplateSet {
    /// The root directory, checked to exist
    pub fn root(&self) -> Result<&Path> {
        if self.root.is_dir() {
            Ok(&self.root)
        } else {
            Err(ScaffoldError::InvalidConfig(format!(
                "template set '{}' points to missing directory {}",
                self.name,
                self.root.display()
            )))
        }
    }
}

/// Template sets available to a run, keyed by name
///
/// Built once at startup from the configuration and handed to the commands
/// that need it.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    sets: BTreeMap<String, TemplateSet>,
    default: Option<String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, root: impl Into<PathBuf>) {
        let name = name.into();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.sets.insert(
            name.clone(),
            TemplateSet {
                name,
                root: root.into(),
            },
        );
    }

    /// Make `name` the set used when a command names none
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.sets.contains_key(name) {
            return Err(ScaffoldError::UnknownTemplateSet(name.to_string()));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&TemplateSet> {
        self.sets
            .get(name)
            .ok_or_else(|| ScaffoldError::UnknownTemplateSet(name.to_string()))
    }

    /// The named set, or the default one
    pub fn resolve(&self, name: Option<&str>) -> Result<&TemplateSet> {
        match name.or(self.default.as_deref()) {
            Some(name) => self.get(name),
            None => Err(ScaffoldError::UnknownTemplateSet("<default>".to_string())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registered_is_default() {
        let mut registry = TemplateRegistry::new();
        registry.register("service", "scaffold/service");
        registry.register("minimal", "scaffold/minimal");
        assert_eq!(registry.resolve(None).unwrap().name, "service");
        assert_eq!(registry.resolve(Some("minimal")).unwrap().name, "minimal");
    }

    #[test]
    fn test_unknown_set() {
        let registry = TemplateRegistry::new();
        assert!(matches!(
            registry.resolve(Some("web")),
            Err(ScaffoldError::UnknownTemplateSet(ref n)) if n == "web"
        ));
        let mut registry = TemplateRegistry::new();
        registry.register("service", "x");
        assert!(registry.set_default("web").is_err());
    }

    #[test]
    fn test_missing_root_is_config_defect() {
        let mut registry = TemplateRegistry::new();
        registry.register("service", "/no/such/template/root");
        let err = registry.get("service").unwrap().root().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
