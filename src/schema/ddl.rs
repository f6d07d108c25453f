//! Static DDL parsing.
//!
//! Understands the `CREATE TABLE` subset shared by MySQL and Postgres dumps:
//! quoted identifiers, inline or table-level `PRIMARY KEY`, `NOT NULL`,
//! `COMMENT '...'`. Index and constraint lines are skipped.

use super::types::{Column, SchemaOptions, Table, TargetType, AUDIT_COLUMNS};
use crate::error::{Result, ScaffoldError};
use heck::ToSnakeCase;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)create\s+(?:temporary\s+)?table\s+(?:if\s+not\s+exists\s+)?([`"\[\]\w.]+)\s*\("#)
        .expect("static regex")
});

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bcomment\s+'((?:[^'\\]|\\.|'')*)'").expect("static regex"));

/// Statement keywords that open a non-column definition line
const SKIPPED_DEFINITIONS: [&str; 8] = [
    "KEY", "INDEX", "UNIQUE", "FOREIGN", "FULLTEXT", "SPATIAL", "CHECK", "EXCLUDE",
];

/// Two-word type names that must not be split at the space
const COMPOUND_TYPES: [&str; 4] = [
    "double precision",
    "character varying",
    "timestamp without time zone",
    "timestamp with time zone",
];

fn unquote(ident: &str) -> String {
    let last = ident.rsplit('.').next().unwrap_or(ident);
    last.trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'))
        .to_string()
}

/// Tracks whether a scan is inside a quoted literal or identifier
///
/// Inside a quote a backslash escapes the next character (`'it\'s'`); a
/// doubled quote (`'it''s'`) closes and reopens, which reads the same.
#[derive(Debug, Default)]
struct QuoteState {
    quote: Option<char>,
    escaped: bool,
}

impl QuoteState {
    /// Feed one character; true while it belongs to a quoted section
    fn step(&mut self, c: char) -> bool {
        let Some(q) = self.quote else {
            if matches!(c, '\'' | '"' | '`') {
                self.quote = Some(c);
                return true;
            }
            return false;
        };
        if self.escaped {
            self.escaped = false;
        } else if c == '\\' {
            self.escaped = true;
        } else if c == q {
            self.quote = None;
        }
        true
    }
}

/// Blank out quoted sections so keyword scans only see bare SQL
fn without_literals(text: &str) -> String {
    let mut state = QuoteState::default();
    text.chars()
        .map(|c| if state.step(c) { ' ' } else { c })
        .collect()
}

/// Find the index of the parenthesis closing the one at `open`
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quotes = QuoteState::default();
    for (i, c) in text[open..].char_indices() {
        if quotes.step(c) {
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a table body on commas that are not nested in parentheses or quotes
fn split_definitions(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quotes = QuoteState::default();
    let mut start = 0;
    for (i, c) in body.char_indices() {
        if quotes.step(c) {
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn key_columns(definition: &str) -> Vec<String> {
    let Some(open) = definition.find('(') else {
        return Vec::new();
    };
    let Some(close) = matching_paren(definition, open) else {
        return Vec::new();
    };
    definition[open + 1..close]
        .split(',')
        .map(|c| unquote(c.trim().split_whitespace().next().unwrap_or("")))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Split a column definition into (name, base type, remainder)
fn column_parts(definition: &str) -> Option<(String, String, String)> {
    let definition = definition.trim();
    let (name, rest) = if let Some(q) = definition
        .chars()
        .next()
        .filter(|c| matches!(c, '`' | '"' | '['))
    {
        let closing = if q == '[' { ']' } else { q };
        let end = definition[1..].find(closing)? + 1;
        (definition[1..end].to_string(), definition[end + 1..].trim_start())
    } else {
        let end = definition.find(char::is_whitespace)?;
        (definition[..end].to_string(), definition[end..].trim_start())
    };

    let lowered = rest.to_ascii_lowercase();
    let compound = COMPOUND_TYPES
        .iter()
        .find(|t| lowered.starts_with(*t))
        .map(|t| t.to_string());
    let (base, after) = match compound {
        Some(t) => {
            let len = t.len();
            (t, &rest[len..])
        }
        None => {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(rest.len());
            (rest[..end].to_ascii_lowercase(), &rest[end..])
        }
    };
    let after = after.trim_start();
    let after = if after.starts_with('(') {
        let close = matching_paren(after, 0)?;
        &after[close + 1..]
    } else {
        after
    };
    Some((name, base, after.trim().to_string()))
}

fn parse_column(table: &str, definition: &str, options: &SchemaOptions) -> Result<Column> {
    let (name, base, rest) =
        column_parts(definition).ok_or_else(|| ScaffoldError::MalformedDdl {
            table: table.to_string(),
            message: format!("cannot read column definition '{definition}'"),
        })?;
    let target = TargetType::from_sql(&base).ok_or_else(|| ScaffoldError::UnmappedColumnType {
        table: table.to_string(),
        column: name.clone(),
        sql_type: base.clone(),
    })?;

    let upper = without_literals(&rest).to_ascii_uppercase();
    let primary_key = upper.contains("PRIMARY KEY");
    let nullable = !upper.contains("NOT NULL") && !primary_key;
    let comment = COMMENT
        .captures(&rest)
        .map(|c| c[1].replace("''", "'").replace("\\'", "'"))
        .filter(|c| !c.is_empty());

    let mut tags = BTreeMap::new();
    tags.insert("json".to_string(), options.naming.apply(&name));
    tags.insert("db".to_string(), name.clone());

    Ok(Column {
        name,
        sql_type: base,
        target,
        nullable,
        primary_key,
        comment,
        tags,
    })
}

/// Derive the resource name: prefix stripped, snake case
pub fn resource_name(table: &str, prefix: Option<&str>) -> String {
    let stripped = prefix
        .filter(|p| !p.is_empty())
        .and_then(|p| table.strip_prefix(p))
        .filter(|s| !s.is_empty())
        .unwrap_or(table);
    stripped.to_snake_case()
}

fn build_table(name: &str, body: &str, options: &SchemaOptions) -> Result<Table> {
    let mut columns = Vec::new();
    let mut primary_key: Option<String> = None;

    for definition in split_definitions(body) {
        let upper = definition.to_ascii_uppercase();
        let first_word = upper.split_whitespace().next().unwrap_or("");
        if upper.starts_with("PRIMARY KEY")
            || (first_word == "CONSTRAINT" && upper.contains("PRIMARY KEY"))
        {
            let keys = key_columns(&definition[upper.find("PRIMARY KEY").unwrap_or(0)..]);
            if keys.len() > 1 {
                debug!(table = name, ?keys, "composite primary key, using first column");
            }
            primary_key = keys.into_iter().next();
            continue;
        }
        if first_word == "CONSTRAINT" || SKIPPED_DEFINITIONS.contains(&first_word) {
            continue;
        }
        columns.push(parse_column(name, definition, options)?);
    }

    if columns.is_empty() {
        return Err(ScaffoldError::MalformedDdl {
            table: name.to_string(),
            message: "table declares no columns".to_string(),
        });
    }

    if primary_key.is_none() {
        primary_key = columns.iter().find(|c| c.primary_key).map(|c| c.name.clone());
    }
    // by-id DAO operations need a key column
    if primary_key.is_none() {
        return Err(ScaffoldError::MalformedDdl {
            table: name.to_string(),
            message: "table declares no primary key".to_string(),
        });
    }
    for column in columns.iter_mut() {
        if Some(&column.name) == primary_key.as_ref() {
            column.primary_key = true;
            column.nullable = false;
        }
    }

    let (columns, absorbed) = if options.embed_audit {
        columns
            .into_iter()
            .partition(|c| !AUDIT_COLUMNS.contains(&c.name.as_str()))
    } else {
        (columns, Vec::new())
    };

    Ok(Table {
        name: name.to_string(),
        resource: resource_name(name, options.table_prefix.as_deref()),
        columns,
        absorbed,
        primary_key,
        embed_audit: options.embed_audit,
    })
}

/// Parse the definition of `table` out of a DDL script
///
/// The script may hold several statements; only the `CREATE TABLE` whose
/// (unqualified, unquoted) name equals `table` is read.
pub fn parse_table(ddl: &str, table: &str, options: &SchemaOptions) -> Result<Table> {
    for caps in CREATE_TABLE.captures_iter(ddl) {
        let name = unquote(&caps[1]);
        if name != table {
            continue;
        }
        let whole = caps.get(0).map(|m| m.end() - 1).unwrap_or(0);
        let close = matching_paren(ddl, whole).ok_or_else(|| ScaffoldError::MalformedDdl {
            table: table.to_string(),
            message: "unbalanced parentheses".to_string(),
        })?;
        return build_table(&name, &ddl[whole + 1..close], options);
    }
    Err(ScaffoldError::TableNotFound {
        table: table.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TagNaming;

    const MYSQL: &str = r#"
CREATE TABLE `t_order` (
  `id` bigint unsigned NOT NULL AUTO_INCREMENT,
  `amount` decimal(10,2) NOT NULL DEFAULT '0.00' COMMENT 'order amount, yuan',
  `note` varchar(255) DEFAULT NULL,
  `created_at` datetime DEFAULT NULL,
  `updated_at` datetime DEFAULT NULL,
  `deleted_at` datetime DEFAULT NULL,
  PRIMARY KEY (`id`),
  KEY `idx_note` (`note`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
"#;

    #[test]
    fn test_mysql_dump() {
        let table = parse_table(MYSQL, "t_order", &SchemaOptions::default()).unwrap();
        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.primary_key.as_deref(), Some("id"));
        let amount = &table.columns[1];
        assert_eq!(amount.target, TargetType::Decimal);
        assert!(!amount.nullable);
        assert_eq!(amount.comment.as_deref(), Some("order amount, yuan"));
        assert!(table.columns[2].nullable);
    }

    #[test]
    fn test_embed_absorbs_audit_columns() {
        let options = SchemaOptions {
            embed_audit: true,
            ..Default::default()
        };
        let table = parse_table(MYSQL, "t_order", &options).unwrap();
        let own: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(own, vec!["amount", "note"]);
        assert_eq!(table.absorbed.len(), 4);
        assert_eq!(table.primary_column().map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn test_inline_primary_key_and_postgres_types() {
        let ddl = r#"create table if not exists public."user" (
            id serial primary key,
            score double precision,
            label character varying(20) not null
        );"#;
        let options = SchemaOptions {
            naming: TagNaming::Snake,
            ..Default::default()
        };
        let table = parse_table(ddl, "user", &options).unwrap();
        assert_eq!(table.primary_key.as_deref(), Some("id"));
        assert_eq!(table.columns[1].target, TargetType::F64);
        assert_eq!(table.columns[2].target, TargetType::Text);
        assert_eq!(table.columns[2].tag("json"), Some("label"));
    }

    #[test]
    fn test_unmapped_type_is_an_error() {
        let ddl = "CREATE TABLE shape (id int PRIMARY KEY, area geometry);";
        let err = parse_table(ddl, "shape", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::UnmappedColumnType { ref column, ref sql_type, .. }
                if column == "area" && sql_type == "geometry"
        ));
    }

    #[test]
    fn test_table_without_key_is_rejected() {
        let ddl = "CREATE TABLE log (line text);";
        let err = parse_table(ddl, "log", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, ScaffoldError::MalformedDdl { .. }));
    }

    #[test]
    fn test_missing_table() {
        let err = parse_table(MYSQL, "t_user", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, ScaffoldError::TableNotFound { .. }));
    }

    #[test]
    fn test_keywords_inside_literals_are_ignored() {
        let ddl = "CREATE TABLE pet (
            id bigint NOT NULL,
            owner_id bigint DEFAULT NULL COMMENT 'primary key of the owner row',
            note varchar(64) DEFAULT NULL COMMENT 'must be NOT NULL once migrated',
            tag varchar(8) DEFAULT 'NOT NULL' NOT NULL,
            PRIMARY KEY (id)
        );";
        let table = parse_table(ddl, "pet", &SchemaOptions::default()).unwrap();
        assert_eq!(table.primary_key.as_deref(), Some("id"));

        let owner = &table.columns[1];
        assert!(!owner.primary_key);
        assert!(owner.nullable);
        assert_eq!(owner.field_type(), "Option<i64>");
        assert_eq!(owner.comment.as_deref(), Some("primary key of the owner row"));

        let note = &table.columns[2];
        assert!(note.nullable);
        assert_eq!(note.field_type(), "Option<String>");

        assert!(!table.columns[3].nullable);
    }

    #[test]
    fn test_backslash_escaped_quotes() {
        let ddl = r"CREATE TABLE `t_tip` (
  `id` int NOT NULL,
  `body` text COMMENT 'it\'s fine, (really)',
  `score` int NOT NULL DEFAULT '0',
  PRIMARY KEY (`id`)
);";
        let table = parse_table(ddl, "t_tip", &SchemaOptions::default()).unwrap();
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "body", "score"]);
        assert_eq!(table.columns[1].comment.as_deref(), Some("it's fine, (really)"));
        assert!(!table.columns[2].nullable);
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(resource_name("t_order", Some("t_")), "order");
        assert_eq!(resource_name("t_order", None), "t_order");
        assert_eq!(resource_name("OrderItem", None), "order_item");
    }
}
