use super::{BatchReport, Identifiers, ENTITY_TOKEN, MODULE_NAME_TOKEN};
use crate::config::Layout;
use crate::emitter::{emit_table, FragmentKind};
use crate::error::{Result, ScaffoldError};
use crate::replacer::{
    leftover_tokens, OutOfScope, RenderedTree, ReplacementRule, Replacer, RuleScope,
    ScopeSelector,
};
use crate::schema::{SchemaOptions, SchemaSource, Table};
use crate::writer::{OutputWriter, OverwritePolicy, WriteOutcome};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Template directories a DAO run renders
pub const DAO_SUB_DIRS: [&str; 3] = ["src/model", "src/dao", "tests"];
/// Shared audit base, rendered once per run when embedding
pub const AUDIT_TEMPLATE: &str = "src/model/audit.rs";
/// Pool initialization, rendered once per run on request
pub const INIT_DB_TEMPLATE: &str = "src/model/init_db.rs";

/// Everything one DAO generation run needs
#[derive(Debug, Clone)]
pub struct DaoJob {
    pub module_name: String,
    pub tables: Vec<String>,
    pub options: SchemaOptions,
    pub include_init_db: bool,
    /// Output root
    pub out: PathBuf,
    pub policy: OverwritePolicy,
}

impl DaoJob {
    /// Table names from a comma-separated list, blanks dropped
    pub fn split_tables(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check the module name and table list; called before anything touches disk
    pub fn validate(&self) -> Result<()> {
        Identifiers::new(&self.module_name, "").require("DAO code", false)?;
        if self.tables.is_empty() {
            return Err(ScaffoldError::InvalidConfig(
                "no table names given".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default output root: `dao_<timestamp>` in the working directory
pub fn default_out_dir(writer: &OutputWriter) -> PathBuf {
    PathBuf::from(format!("dao_{}", writer.timestamp()))
}

/// Generate model, DAO and DAO test for every table of `job`
///
/// Tables are handled in the order given. A table that is missing, has an
/// unmapped column type or a broken template is reported and skipped; an
/// unreachable source or a configuration defect ends the run.
pub fn run_dao(
    source: &dyn SchemaSource,
    job: &DaoJob,
    template_root: &Path,
    layout: &Layout,
    replacer: &Replacer,
    writer: &OutputWriter,
) -> Result<BatchReport> {
    job.validate()?;
    if !template_root.is_dir() {
        return Err(ScaffoldError::InvalidConfig(format!(
            "template root {} is not a directory",
            template_root.display()
        )));
    }

    info!(source = %source.describe(), tables = job.tables.len(), out = %job.out.display(), "generating DAO code");
    let mut report = BatchReport::default();
    // audit base and pool init go out with the first table that succeeds
    let mut shared_done = false;
    for name in &job.tables {
        match generate_table(source, job, !shared_done, name, template_root, layout, replacer, writer) {
            Ok(outcomes) => {
                shared_done = true;
                report.record_success(name, outcomes);
            }
            Err(e) if e.is_item_local() => report.record_failure(name, &e),
            Err(e) => return Err(e),
        }
    }
    info!(
        succeeded = report.succeeded.len(),
        failed = report.failures.len(),
        diverted = report.diverted(),
        "DAO generation finished"
    );
    Ok(report)
}

/// Rules for one table: fragments into their slots, then identifiers
pub fn table_rules(table: &Table, module_name: &str) -> Result<Vec<ReplacementRule>> {
    let mut fragments = emit_table(table)?;
    let mut rules = Vec::new();
    for kind in [FragmentKind::Model, FragmentKind::Dao, FragmentKind::DaoTest] {
        if let Some(text) = fragments.take(kind) {
            rules.push(ReplacementRule::inject_slot(kind.slot(), text));
        }
    }
    rules.push(
        ReplacementRule::case_aware(MODULE_NAME_TOKEN, module_name)
            .with_scope(RuleScope::EVERYWHERE),
    );
    rules.push(
        ReplacementRule::case_aware(ENTITY_TOKEN, &table.resource)
            .with_scope(RuleScope::EVERYWHERE),
    );
    Ok(rules)
}

/// Files of the template tree rendered for one table
///
/// `with_shared` adds the once-per-run files enabled by the options.
pub fn table_scope(with_shared: bool, embed_audit: bool, include_init_db: bool) -> ScopeSelector {
    let mut ignored = Vec::new();
    if !with_shared || !embed_audit {
        ignored.push(AUDIT_TEMPLATE);
    }
    if !with_shared || !include_init_db {
        ignored.push(INIT_DB_TEMPLATE);
    }
    ScopeSelector::all()
        .sub_dirs(DAO_SUB_DIRS)
        .ignore_files(ignored)
        .out_of_scope(OutOfScope::Omit)
}

#[allow(clippy::too_many_arguments)]
fn generate_table(
    source: &dyn SchemaSource,
    job: &DaoJob,
    with_shared: bool,
    name: &str,
    template_root: &Path,
    layout: &Layout,
    replacer: &Replacer,
    writer: &OutputWriter,
) -> Result<Vec<WriteOutcome>> {
    let table = source.load_table(name, &job.options)?;
    let rules = table_rules(&table, &job.module_name)?;
    let scope = table_scope(with_shared, job.options.embed_audit, job.include_init_db);
    let mut tree = replacer.apply(template_root, &rules, &scope)?;

    if let Some(failure) = tree.failures.pop() {
        for other in &tree.failures {
            warn!(table = name, template = %other.path.display(), error = %other.error, "template failed");
        }
        return Err(failure.error);
    }
    for leftover in leftover_tokens(&tree, &[MODULE_NAME_TOKEN, ENTITY_TOKEN]) {
        warn!(
            table = name,
            file = %leftover.rel_path.display(),
            token = %leftover.token,
            in_path = leftover.in_path,
            "placeholder survived rendering"
        );
    }

    relocate(&mut tree, layout);
    writer.write_tree(&job.out, &tree, job.policy)
}

fn relocate(tree: &mut RenderedTree, layout: &Layout) {
    for file in tree.files.iter_mut() {
        file.rel_path = layout.relocate(&file.rel_path);
    }
}
