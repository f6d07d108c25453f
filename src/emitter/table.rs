use super::fragment::{finish, FragmentKind, Fragments};
use super::templates::{DaoTemplate, DaoTestTemplate, FieldView, ModelTemplate, SampleView};
use crate::error::{Result, ScaffoldError};
use crate::schema::{Column, Table, TargetType};
use askama::Template;
use heck::ToUpperCamelCase;

fn quote_ident(name: &str) -> String {
    format!("`{name}`")
}

fn sql_literal(sql: &str) -> String {
    format!("{sql:?}")
}

fn field_view(column: &Column) -> FieldView {
    let name = column.field_name();
    let mut attrs = Vec::new();
    if let Some(json) = column.tag("json").filter(|j| *j != name) {
        attrs.push(format!("#[serde(rename = {json:?})]"));
    }
    if let Some(db) = column.tag("db").filter(|d| *d != name) {
        attrs.push(format!("#[sqlx(rename = {db:?})]"));
    }
    FieldView {
        docs: column
            .comment
            .as_deref()
            .map(|c| c.lines().map(str::to_string).collect())
            .unwrap_or_default(),
        ty: column.field_type(),
        attrs,
        name,
    }
}

/// Field access path of a column on a row value
fn access(table: &Table, column: &Column) -> String {
    if table.absorbed.iter().any(|c| c.name == column.name) {
        format!("base.{}", column.field_name())
    } else {
        column.field_name()
    }
}

fn sample_value(column: &Column) -> String {
    let literal = column.target.sample_literal();
    if column.nullable {
        format!("Some({literal})")
    } else {
        literal.to_string()
    }
}

/// Render model, DAO and DAO test fragments for one table
///
/// Every statement names its columns explicitly, so the DAO only ever touches
/// the columns the table declares (own columns plus the absorbed audit ones).
pub fn emit_table(table: &Table) -> Result<Fragments> {
    let key = table
        .primary_column()
        .ok_or_else(|| ScaffoldError::MalformedDdl {
            table: table.name.clone(),
            message: "table declares no primary key".to_string(),
        })?;
    let struct_name = table.resource.to_upper_camel_case();
    let quoted_table = quote_ident(&table.name);
    let key_field = key.field_name();
    let key_type = key.target.rust_type();
    let key_access = access(table, key);
    let soft_delete = table.selected_columns().any(|c| c.name == "deleted_at");

    let int_key = key.target == TargetType::I64;
    let writable: Vec<&Column> = table.writable_columns().collect();
    // integer keys are generated by the database, any other key is supplied
    let inserted: Vec<&Column> = if int_key {
        writable.clone()
    } else {
        std::iter::once(key).chain(writable.iter().copied()).collect()
    };
    let selected = table
        .selected_columns()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let key_clause = format!("{} = ?", quote_ident(&key.name));
    let live = if soft_delete {
        " AND `deleted_at` IS NULL"
    } else {
        ""
    };

    let insert_sql = format!(
        "INSERT INTO {quoted_table} ({}) VALUES ({})",
        inserted
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", "),
        vec!["?"; inserted.len()].join(", ")
    );
    let update_sql = format!(
        "UPDATE {quoted_table} SET {} WHERE {key_clause}",
        writable
            .iter()
            .map(|c| format!("{} = ?", quote_ident(&c.name)))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let delete_sql = if soft_delete {
        format!("UPDATE {quoted_table} SET `deleted_at` = NOW() WHERE {key_clause}{live}")
    } else {
        format!("DELETE FROM {quoted_table} WHERE {key_clause}")
    };
    let get_sql = format!("SELECT {selected} FROM {quoted_table} WHERE {key_clause}{live}");
    let list_where = if soft_delete {
        " WHERE `deleted_at` IS NULL"
    } else {
        ""
    };
    let list_sql = format!(
        "SELECT {selected} FROM {quoted_table}{list_where} ORDER BY {} DESC LIMIT ? OFFSET ?",
        quote_ident(&key.name)
    );
    let update_binds: Vec<String> = writable.iter().map(|c| access(table, c)).collect();

    let mut fragments = Fragments::new();

    let model = ModelTemplate {
        table: &table.name,
        struct_name: &struct_name,
        embed: table.embed_audit,
        fields: table.columns.iter().map(field_view).collect(),
    }
    .render()?;
    fragments.insert(FragmentKind::Model, finish(model));

    let dao = DaoTemplate {
        table: &table.name,
        resource: &table.resource,
        struct_name: &struct_name,
        key: &key_field,
        key_type,
        key_access: &key_access,
        soft_delete,
        insert_sql: sql_literal(&insert_sql),
        insert_binds: inserted.iter().map(|c| access(table, c)).collect(),
        update_sql: sql_literal(&update_sql),
        update_binds,
        delete_sql: sql_literal(&delete_sql),
        get_sql: sql_literal(&get_sql),
        list_sql: sql_literal(&list_sql),
    }
    .render()?;
    fragments.insert(FragmentKind::Dao, finish(dao));

    let mut samples: Vec<SampleView> = Vec::new();
    if !int_key && !table.absorbed.iter().any(|c| c.name == key.name) {
        samples.push(SampleView {
            name: key_field.clone(),
            value: sample_value(key),
        });
    }
    samples.extend(writable.iter().map(|c| SampleView {
        name: c.field_name(),
        value: sample_value(c),
    }));
    let dao_test = DaoTestTemplate {
        resource: &table.resource,
        struct_name: &struct_name,
        key_type,
        key_access: &key_access,
        int_key,
        samples,
    }
    .render()?;
    fragments.insert(FragmentKind::DaoTest, finish(dao_test));

    Ok(fragments)
}
