mod common;

use common::fs_util::{files, read, write};
use common::schemas::ORDER_DDL;
use scaffolder::config::{Layout, BUILTIN_TEMPLATE_ROOT, BUILTIN_TEMPLATE_SET};
use scaffolder::pipeline::sql::{run_dao, DaoJob};
use scaffolder::replacer::Replacer;
use scaffolder::schema::{source_from_dsn, DdlSource, SchemaOptions, TagNaming};
use scaffolder::writer::{OutputWriter, OverwritePolicy};
use scaffolder::{ErrorKind, ScaffoldError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn template_root() -> PathBuf {
    Path::new(BUILTIN_TEMPLATE_ROOT).join(BUILTIN_TEMPLATE_SET)
}

fn job(out: &Path, tables: &[&str]) -> DaoJob {
    DaoJob {
        module_name: "shop".to_string(),
        tables: tables.iter().map(|t| t.to_string()).collect(),
        options: SchemaOptions {
            naming: TagNaming::Camel,
            embed_audit: false,
            table_prefix: Some("t_".to_string()),
        },
        include_init_db: false,
        out: out.to_path_buf(),
        policy: OverwritePolicy::Preserve,
    }
}

fn run(job: &DaoJob, writer: &OutputWriter) -> Result<scaffolder::pipeline::BatchReport, ScaffoldError> {
    run_dao(
        &DdlSource::new("schema.sql", ORDER_DDL),
        job,
        &template_root(),
        &Layout::default(),
        &Replacer::default(),
        writer,
    )
}

/// Backquoted identifiers inside the SQL literals of a DAO file
fn sql_identifiers(dao: &str) -> Vec<String> {
    let mut idents = Vec::new();
    for line in dao.lines().filter(|l| l.contains("sqlx::query")) {
        let mut parts = line.split('`');
        parts.next();
        while let Some(ident) = parts.next() {
            idents.push(ident.to_string());
            parts.next();
        }
    }
    idents
}

#[test]
fn test_three_column_table_yields_model_dao_and_test() {
    let dir = TempDir::new().unwrap();
    let report = run(&job(dir.path(), &["t_order"]), &OutputWriter::new()).unwrap();
    assert!(report.is_clean());

    assert_eq!(
        files(dir.path()),
        vec![
            PathBuf::from("src/dao/order_dao.rs"),
            PathBuf::from("src/model/order.rs"),
            PathBuf::from("tests/order_dao_test.rs"),
        ]
    );

    let model = read(dir.path().join("src/model/order.rs"));
    assert!(model.contains("pub struct Order {"));
    let fields = model
        .lines()
        .filter(|l| l.starts_with("    pub ") && l.ends_with(','))
        .count();
    assert_eq!(fields, 3);
    assert!(model.contains("pub id: i64,"));
    assert!(model.contains("pub amount: rust_decimal::Decimal,"));
    assert!(model.contains("pub note: Option<String>,"));
    assert!(!model.contains("scaffold:begin"));

    let dao = read(dir.path().join("src/dao/order_dao.rs"));
    for name in [
        "pub async fn create(",
        "pub async fn delete_by_id(",
        "pub async fn update_by_id(",
        "pub async fn get_by_id(",
        "pub async fn list(",
    ] {
        assert!(dao.contains(name), "missing {name}");
    }
    let idents = sql_identifiers(&dao);
    assert!(!idents.is_empty());
    for ident in &idents {
        assert!(
            ["t_order", "id", "amount", "note"].contains(&ident.as_str()),
            "unexpected column {ident}"
        );
    }
    assert!(dao.contains("use crate::model::order::Order;"));

    let test = read(dir.path().join("tests/order_dao_test.rs"));
    assert!(test.contains("use shop::dao::order_dao::OrderDao;"));
    assert!(test.contains("async fn test_order_crud("));
}

#[test]
fn test_no_placeholder_survives() {
    let dir = TempDir::new().unwrap();
    let mut job = job(dir.path(), &["t_order", "t_user_profile"]);
    job.options.embed_audit = true;
    job.include_init_db = true;
    run(&job, &OutputWriter::new()).unwrap();

    for rel in files(dir.path()) {
        let text = read(dir.path().join(&rel));
        let path = rel.to_string_lossy().to_string();
        for token in [
            "module_name_example",
            "ModuleNameExample",
            "MODULE_NAME_EXAMPLE",
            "UserExample",
            "user_example",
            "userExample",
            "USER_EXAMPLE",
        ] {
            assert!(!text.contains(token), "{token} left in {path}");
            assert!(!path.contains(token), "{token} left in path {path}");
        }
    }
}

#[test]
fn test_existing_dao_is_diverted_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let dao_path = dir.path().join("src/dao/order_dao.rs");
    write(&dao_path, "// my hand edits\n");

    let writer = OutputWriter::with_timestamp("20240101T120000");
    let report = run(&job(dir.path(), &["t_order"]), &writer).unwrap();

    assert_eq!(read(&dao_path), "// my hand edits\n");
    let diverted = dir.path().join("src/dao/order_dao.rs.gen20240101T120000");
    assert!(read(&diverted).contains("pub struct OrderDao"));
    assert_eq!(report.diverted(), 1);
    assert!(dir.path().join("src/model/order.rs").exists());
}

#[test]
fn test_embed_renders_audit_once() {
    let dir = TempDir::new().unwrap();
    let mut job = job(dir.path(), &["t_user_profile", "t_order"]);
    job.options.embed_audit = true;
    job.options.naming = TagNaming::Snake;
    let report = run(&job, &OutputWriter::new()).unwrap();
    assert_eq!(report.succeeded, vec!["t_user_profile", "t_order"]);

    let all = files(dir.path());
    assert_eq!(
        all.iter().filter(|p| p.ends_with("audit.rs")).count(),
        1
    );
    assert!(!all.iter().any(|p| p.ends_with("init_db.rs")));

    let profile = read(dir.path().join("src/model/user_profile.rs"));
    assert!(profile.contains("use super::audit::AuditFields;"));
    assert!(profile.contains("pub base: AuditFields,"));
    assert!(profile.contains("pub nick_name: String,"));

    let dao = read(dir.path().join("src/dao/user_profile_dao.rs"));
    assert!(dao.contains("SET `deleted_at` = NOW()"));
    assert!(dao.contains("Soft delete"));
}

#[test]
fn test_missing_table_reported_others_generated() {
    let dir = TempDir::new().unwrap();
    let report = run(&job(dir.path(), &["t_nope", "t_order"]), &OutputWriter::new()).unwrap();
    assert_eq!(report.succeeded, vec!["t_order"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, "t_nope");
    assert_eq!(report.failures[0].kind, ErrorKind::Input);
}

#[test]
fn test_shared_files_follow_first_successful_table() {
    let dir = TempDir::new().unwrap();
    let mut job = job(dir.path(), &["t_nope", "t_user_profile", "t_order"]);
    job.options.embed_audit = true;
    job.include_init_db = true;
    let report = run(&job, &OutputWriter::new()).unwrap();
    assert_eq!(report.succeeded, vec!["t_user_profile", "t_order"]);

    let profile = read(dir.path().join("src/model/user_profile.rs"));
    assert!(profile.contains("use super::audit::AuditFields;"));
    assert!(dir.path().join("src/model/audit.rs").exists());
    assert!(dir.path().join("src/model/init_db.rs").exists());
    let all = files(dir.path());
    assert_eq!(all.iter().filter(|p| p.ends_with("audit.rs")).count(), 1);
    assert_eq!(all.iter().filter(|p| p.ends_with("init_db.rs")).count(), 1);
}

#[test]
fn test_layout_relocates_output() {
    let dir = TempDir::new().unwrap();
    let layout = Layout {
        dao: "src/repository".into(),
        tests: "it".into(),
        ..Layout::default()
    };
    run_dao(
        &DdlSource::new("schema.sql", ORDER_DDL),
        &job(dir.path(), &["t_order"]),
        &template_root(),
        &layout,
        &Replacer::default(),
        &OutputWriter::new(),
    )
    .unwrap();
    assert!(dir.path().join("src/repository/order_dao.rs").exists());
    assert!(dir.path().join("it/order_dao_test.rs").exists());
}

#[test]
fn test_run_level_defects() {
    let dir = TempDir::new().unwrap();
    let mut no_module = job(dir.path(), &["t_order"]);
    no_module.module_name = String::new();
    let err = run(&no_module, &OutputWriter::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = source_from_dsn("mysql://root:pw@127.0.0.1:3306/shop").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::External);
    assert!(files(dir.path()).is_empty());
}

#[test]
fn test_dao_output_is_deterministic() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    run(&job(first.path(), &["t_order", "t_user_profile"]), &OutputWriter::new()).unwrap();
    run(&job(second.path(), &["t_order", "t_user_profile"]), &OutputWriter::new()).unwrap();
    let names = files(first.path());
    assert_eq!(names, files(second.path()));
    for rel in names {
        assert_eq!(read(first.path().join(&rel)), read(second.path().join(&rel)));
    }
}
