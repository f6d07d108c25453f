mod common;

use clap::Parser;
use common::descriptors::{descriptor_set, encode, order_file};
use common::fs_util::{files, read, write};
use common::schemas::ORDER_DDL;
use scaffolder::cli::{run, Cli};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("scaffolder").chain(args.iter().copied())).unwrap()
}

fn path(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

#[test]
fn test_dao_command_end_to_end() {
    let dir = TempDir::new().unwrap();
    let ddl = dir.path().join("schema.sql");
    write(&ddl, ORDER_DDL);
    let out = dir.path().join("project");

    run(cli(&[
        "dao",
        "--db-dsn",
        &format!("ddl:{}", path(&ddl)),
        "--db-table",
        "t_order,t_user_profile",
        "--module-name",
        "shop",
        "--table-prefix",
        "t_",
        "--embed",
        "--out",
        &path(&out),
    ]))
    .unwrap();

    let generated = files(&out);
    assert!(generated.contains(&PathBuf::from("src/model/order.rs")));
    assert!(generated.contains(&PathBuf::from("src/model/audit.rs")));
    assert!(generated.contains(&PathBuf::from("src/dao/user_profile_dao.rs")));
    assert!(generated.contains(&PathBuf::from("tests/user_profile_dao_test.rs")));
    assert!(!generated.contains(&PathBuf::from(".scaffold.lock")));
}

#[test]
fn test_dao_command_fails_on_missing_table_but_writes_the_rest() {
    let dir = TempDir::new().unwrap();
    let ddl = dir.path().join("schema.sql");
    write(&ddl, ORDER_DDL);
    let out = dir.path().join("project");

    let err = run(cli(&[
        "dao",
        "--db-dsn",
        &path(&ddl),
        "--db-table",
        "t_missing,t_order",
        "--module-name",
        "shop",
        "--out",
        &path(&out),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("1 of 2 items failed"));
    assert!(out.join("src/model/t_order.rs").exists());
}

#[test]
fn test_dao_command_rejects_unknown_template_set() {
    let dir = TempDir::new().unwrap();
    let ddl = dir.path().join("schema.sql");
    write(&ddl, ORDER_DDL);
    let out = dir.path().join("project");

    let result = run(cli(&[
        "dao",
        "--db-dsn",
        &path(&ddl),
        "--db-table",
        "t_order",
        "--module-name",
        "shop",
        "--template-set",
        "nope",
        "--out",
        &path(&out),
    ]));
    assert!(result.is_err());
    assert!(!out.exists());
}

#[test]
fn test_proto_command_writes_route_tables_and_stubs() {
    let dir = TempDir::new().unwrap();
    let set = dir.path().join("api.pb");
    std::fs::write(&set, descriptor_set(&[encode(&order_file())])).unwrap();
    let out = dir.path().join("project");

    run(cli(&[
        "proto",
        "-d",
        &path(&set),
        "--plugin",
        "handler",
        "--module-name",
        "shop_api",
        "--server-name",
        "shop",
        "-o",
        &path(&out),
    ]))
    .unwrap();

    assert_eq!(
        files(&out),
        vec![
            PathBuf::from("api/v1/order_router.pb.rs"),
            PathBuf::from("src/ecode/order_http.rs"),
            PathBuf::from("src/handler/order.rs"),
            PathBuf::from("src/routers/order_router.rs"),
        ]
    );
    assert!(read(out.join("api/v1/order_router.pb.rs")).contains("/v1/orders/{id}"));
}

#[test]
fn test_proto_command_requires_module_name_for_handlers() {
    let dir = TempDir::new().unwrap();
    let set = dir.path().join("api.pb");
    std::fs::write(&set, descriptor_set(&[encode(&order_file())])).unwrap();
    let out = dir.path().join("project");

    let err = run(cli(&[
        "proto",
        "-d",
        &path(&set),
        "--plugin",
        "handler",
        "--server-name",
        "shop",
        "-o",
        &path(&out),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("moduleName"));
    assert!(!out.exists());
}

#[test]
fn test_dao_command_with_empty_module_name_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let ddl = dir.path().join("schema.sql");
    write(&ddl, ORDER_DDL);
    let out = dir.path().join("project");

    let err = run(cli(&[
        "dao",
        "--db-dsn",
        &path(&ddl),
        "--db-table",
        "t_order",
        "--module-name",
        "",
        "--out",
        &path(&out),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("moduleName"));
    assert!(!out.exists());
}

#[test]
fn test_explicit_missing_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let set = dir.path().join("api.pb");
    std::fs::write(&set, descriptor_set(&[encode(&order_file())])).unwrap();

    let result = run(cli(&[
        "--config",
        &path(&missing),
        "proto",
        "-d",
        &path(&set),
        "-o",
        &path(dir.path()),
    ]));
    assert!(result.is_err());
}
