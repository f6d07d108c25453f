//! # Pipeline Module
//!
//! Wires the stages together for the two entry points:
//!
//! - [`proto`] - descriptor batch → routes → fragments → identifiers stamped →
//!   logic, router and error-code files written, route tables returned to
//!   the caller (plugin response or CLI write)
//! - [`sql`] - table names → schema → fragments → template tree rendered →
//!   files written under the output root
//!
//! Both run their items strictly one after another. An item-local failure
//! (see [`ScaffoldError::is_item_local`]) is recorded in the [`BatchReport`]
//! and the batch moves on; any other failure ends the run.

pub mod proto;
pub mod sql;

use crate::error::{ErrorKind, ScaffoldError};
use crate::replacer::{ReplacementRule, RuleScope};
use crate::writer::WriteOutcome;
use serde::Serialize;
use tracing::warn;

/// Placeholder for the project's API crate name
pub const MODULE_NAME_TOKEN: &str = "module_name_example";
/// Placeholder for the server name
pub const SERVER_NAME_TOKEN: &str = "server_name_example";
/// Placeholder for the example entity in template trees
pub const ENTITY_TOKEN: &str = "UserExample";

/// Project identifiers stamped over the placeholder tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiers {
    pub module_name: String,
    pub server_name: String,
}

impl Identifiers {
    pub fn new(module_name: impl Into<String>, server_name: impl Into<String>) -> Self {
        Identifiers {
            module_name: module_name.into().trim().to_string(),
            server_name: server_name.into().trim().to_string(),
        }
    }

    /// Fail with the first missing identifier
    pub fn require(&self, what: &str, server_name: bool) -> Result<(), ScaffoldError> {
        if self.module_name.is_empty() {
            return Err(ScaffoldError::MissingIdentifier {
                name: "moduleName",
                what: what.to_string(),
            });
        }
        if server_name && self.server_name.is_empty() {
            return Err(ScaffoldError::MissingIdentifier {
                name: "serverName",
                what: what.to_string(),
            });
        }
        Ok(())
    }

    /// Case-aware substitutions for every identifier that is set
    pub fn rules(&self, scope: RuleScope) -> Vec<ReplacementRule> {
        let mut rules = Vec::new();
        if !self.module_name.is_empty() {
            rules.push(
                ReplacementRule::case_aware(MODULE_NAME_TOKEN, &self.module_name).with_scope(scope),
            );
        }
        if !self.server_name.is_empty() {
            rules.push(
                ReplacementRule::case_aware(SERVER_NAME_TOKEN, &self.server_name).with_scope(scope),
            );
        }
        rules
    }
}

/// One item of a batch that did not produce output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Proto file or table name
    pub item: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-item results of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failures: Vec<ItemFailure>,
    pub outcomes: Vec<WriteOutcome>,
}

impl BatchReport {
    pub fn record_success(&mut self, item: impl Into<String>, outcomes: Vec<WriteOutcome>) {
        self.succeeded.push(item.into());
        self.outcomes.extend(outcomes);
    }

    pub fn record_failure(&mut self, item: impl Into<String>, error: &ScaffoldError) {
        let item = item.into();
        warn!(item = %item, kind = ?error.kind(), %error, "item failed, continuing with the batch");
        self.failures.push(ItemFailure {
            item,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of writes that went to a `.gen<timestamp>` sibling
    pub fn diverted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_diverted()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_names_missing_identifier() {
        let ids = Identifiers::new("shop_api", " ");
        assert!(ids.require("DAO code", false).is_ok());
        let err = ids.require("handler code", true).unwrap_err();
        assert!(matches!(err, ScaffoldError::MissingIdentifier { name: "serverName", .. }));
        assert_eq!(
            err.to_string(),
            "'serverName' cannot be empty when generating handler code"
        );
    }

    #[test]
    fn test_rules_skip_unset_identifiers() {
        let rules = Identifiers::new("shop_api", "").rules(RuleScope::CONTENT);
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].substitute_in("use module_name_example::api;"),
            "use shop_api::api;"
        );
    }

    #[test]
    fn test_report_serializes() {
        let mut report = BatchReport::default();
        report.record_success("a.proto", vec![]);
        report.record_failure("b.proto", &ScaffoldError::descriptor("b.proto", "bad"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["succeeded"][0], "a.proto");
        assert_eq!(json["failures"][0]["kind"], "input");
        assert!(!report.is_clean());
    }
}
