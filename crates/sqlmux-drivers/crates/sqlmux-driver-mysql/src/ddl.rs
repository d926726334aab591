//! MySQL DDL rendering
//!
//! An alter-table diff compiles to one `ALTER TABLE` whose clauses follow a
//! fixed category order, plus a separate `RENAME TABLE` when the table is
//! renamed. MySQL commits DDL implicitly, so statements are never wrapped
//! in a transaction.

use sqlmux_core::profile::MYSQL;
use sqlmux_core::{
    ColumnSpec, CompiledDdl, CreateTable, DdlCompiler, ForeignKeySpec, IndexKind, IndexSpec,
    SchemaDiff, TableRef, ViewSpec,
};

#[derive(Debug, Default)]
pub struct MySqlDdl;

fn qualified(schema: Option<&str>, name: &str) -> String {
    MYSQL.qualify(schema, name)
}

/// Non-empty parts joined by single spaces
fn spaced(parts: impl IntoIterator<Item = Option<String>>) -> String {
    parts
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything after the column name in ADD COLUMN / CHANGE COLUMN
pub(crate) fn column_definition(column: &ColumnSpec) -> String {
    let type_name = match column.length() {
        Some(length) => format!("{}({})", column.type_name.to_uppercase(), length),
        None => column.type_name.to_uppercase(),
    };
    let position = match column.after.as_deref().filter(|a| !a.is_empty()) {
        Some(after) => format!("AFTER {}", MYSQL.quote_ident(after)),
        None => "FIRST".to_string(),
    };

    spaced([
        Some(type_name),
        column.unsigned.then(|| "UNSIGNED".to_string()),
        column.zerofill.then(|| "ZEROFILL".to_string()),
        Some(if column.nullable { "NULL" } else { "NOT NULL" }.to_string()),
        column.auto_increment.then(|| "AUTO_INCREMENT".to_string()),
        column
            .default
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("DEFAULT {}", d)),
        column
            .comment
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| format!("COMMENT {}", MYSQL.quote_str(c))),
        column
            .collation
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| format!("COLLATE {}", c)),
        column
            .on_update
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| format!("ON UPDATE {}", u)),
        Some(position),
    ])
}

fn index_fields(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| MYSQL.quote_ident(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn add_index(index: &IndexSpec) -> String {
    let fields = index_fields(&index.fields);
    let keyword = match index.kind {
        IndexKind::Primary => return format!("ADD PRIMARY KEY ({})", fields),
        IndexKind::Unique => "UNIQUE INDEX",
        IndexKind::Fulltext => "FULLTEXT",
        IndexKind::Index => "INDEX",
    };
    format!("ADD {} {} ({})", keyword, MYSQL.quote_ident(&index.name), fields)
}

fn drop_index(name: &str, kind: IndexKind) -> String {
    match kind {
        IndexKind::Primary => "DROP PRIMARY KEY".to_string(),
        _ => format!("DROP INDEX {}", MYSQL.quote_ident(name)),
    }
}

fn add_foreign_key(key: &ForeignKeySpec) -> String {
    spaced([
        Some(format!(
            "ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            MYSQL.quote_ident(&key.constraint_name),
            MYSQL.quote_ident(&key.field),
            qualified(key.ref_schema.as_deref(), &key.ref_table),
            MYSQL.quote_ident(&key.ref_field)
        )),
        Some(key.on_update.as_str())
            .filter(|r| !r.is_empty())
            .map(|r| format!("ON UPDATE {}", r)),
        Some(key.on_delete.as_str())
            .filter(|r| !r.is_empty())
            .map(|r| format!("ON DELETE {}", r)),
    ])
}

/// Clauses of the main ALTER TABLE statement, in application order
pub(crate) fn alter_clauses(diff: &SchemaDiff) -> Vec<String> {
    let mut clauses = Vec::new();
    let options = &diff.options;

    if let Some(comment) = &options.comment {
        clauses.push(format!("COMMENT={}", MYSQL.quote_str(comment)));
    }
    if let Some(engine) = &options.engine {
        clauses.push(format!("ENGINE={}", engine));
    }
    if let Some(auto_increment) = options.auto_increment {
        clauses.push(format!("AUTO_INCREMENT={}", auto_increment));
    }
    if let Some(collation) = &options.collation {
        clauses.push(format!("COLLATE={}", MYSQL.quote_str(collation)));
    }

    for column in &diff.columns.additions {
        clauses.push(format!(
            "ADD COLUMN {} {}",
            MYSQL.quote_ident(&column.name),
            column_definition(column)
        ));
    }
    for index in &diff.indexes.additions {
        clauses.push(add_index(index));
    }
    for key in &diff.foreign_keys.additions {
        clauses.push(add_foreign_key(key));
    }

    for change in &diff.columns.changes {
        clauses.push(format!(
            "CHANGE COLUMN {} {} {}",
            MYSQL.quote_ident(&change.org_name),
            MYSQL.quote_ident(&change.column.name),
            column_definition(&change.column)
        ));
    }
    for change in &diff.indexes.changes {
        clauses.push(drop_index(&change.old_name, change.old_kind));
        clauses.push(add_index(&change.index));
    }
    for change in &diff.foreign_keys.changes {
        clauses.push(format!(
            "DROP FOREIGN KEY {}",
            MYSQL.quote_ident(&change.old_name)
        ));
        clauses.push(add_foreign_key(&change.key));
    }

    for column in &diff.columns.deletions {
        clauses.push(format!("DROP COLUMN {}", MYSQL.quote_ident(&column.name)));
    }
    for index in &diff.indexes.deletions {
        clauses.push(drop_index(&index.name, index.kind));
    }
    for key in &diff.foreign_keys.deletions {
        clauses.push(format!(
            "DROP FOREIGN KEY {}",
            MYSQL.quote_ident(&key.constraint_name)
        ));
    }

    clauses
}

fn view_tail(view: &ViewSpec) -> String {
    spaced([
        Some(format!("AS {}", view.sql.trim())),
        view.update_option
            .as_deref()
            .filter(|o| !o.is_empty())
            .map(|o| format!("WITH {} CHECK OPTION", o)),
    ])
}

fn view_header(verb: &str, view: &ViewSpec) -> String {
    spaced([
        Some(format!("{} ALGORITHM = {}", verb, view.algorithm)),
        view.definer
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("DEFINER={}", d)),
        Some(format!("SQL SECURITY {}", view.security)),
    ])
}

fn rename_table(schema: Option<&str>, from: &str, to: &str) -> String {
    format!(
        "RENAME TABLE {} TO {}",
        qualified(schema, from),
        qualified(schema, to)
    )
}

impl DdlCompiler for MySqlDdl {
    fn create_table(&self, spec: &CreateTable) -> CompiledDdl {
        let options: Vec<String> = [
            spec.comment
                .as_deref()
                .map(|c| format!("COMMENT={}", MYSQL.quote_str(c))),
            spec.collation
                .as_deref()
                .map(|c| format!("COLLATE={}", MYSQL.quote_str(c))),
            spec.engine.as_deref().map(|e| format!("ENGINE={}", e)),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut sql = format!(
            "CREATE TABLE {} ({} INT NULL)",
            qualified(spec.schema.as_deref(), &spec.name),
            MYSQL.quote_ident(&format!("{}_ID", spec.name))
        );
        if !options.is_empty() {
            sql.push(' ');
            sql.push_str(&options.join(", "));
        }
        CompiledDdl::single(sql)
    }

    fn alter_table(&self, diff: &SchemaDiff) -> CompiledDdl {
        let schema = diff.table.schema.as_deref();
        let clauses = alter_clauses(diff);
        let mut ddl = CompiledDdl::default();

        if !clauses.is_empty() {
            ddl.push(format!(
                "ALTER TABLE {} {}",
                qualified(schema, &diff.table.name),
                clauses.join(", ")
            ));
        }
        if let Some(name) = diff.options.name.as_deref().filter(|n| *n != diff.table.name) {
            ddl.push(rename_table(schema, &diff.table.name, name));
        }

        tracing::debug!(
            table = %diff.table.name,
            clauses = clauses.len(),
            statements = ddl.len(),
            "compiled alter table"
        );
        ddl
    }

    fn truncate_table(&self, table: &TableRef) -> CompiledDdl {
        CompiledDdl::single(format!(
            "TRUNCATE TABLE {}",
            qualified(table.schema.as_deref(), &table.name)
        ))
    }

    fn drop_table(&self, table: &TableRef) -> CompiledDdl {
        CompiledDdl::single(format!(
            "DROP TABLE {}",
            qualified(table.schema.as_deref(), &table.name)
        ))
    }

    fn create_view(&self, view: &ViewSpec) -> CompiledDdl {
        CompiledDdl::single(format!(
            "{} VIEW {} {}",
            view_header("CREATE", view),
            qualified(view.schema.as_deref(), &view.name),
            view_tail(view)
        ))
    }

    fn alter_view(&self, view: &ViewSpec) -> CompiledDdl {
        let schema = view.schema.as_deref();
        let current = view.current_name();
        let mut ddl = CompiledDdl::single(format!(
            "{} VIEW {} {}",
            view_header("ALTER", view),
            qualified(schema, current),
            view_tail(view)
        ));
        if current != view.name {
            ddl.push(rename_table(schema, current, &view.name));
        }
        ddl
    }

    fn drop_view(&self, view: &TableRef) -> CompiledDdl {
        CompiledDdl::single(format!(
            "DROP VIEW {}",
            qualified(view.schema.as_deref(), &view.name)
        ))
    }

    fn use_schema(&self, schema: &str) -> String {
        format!("USE {}", MYSQL.quote_ident(schema))
    }
}
