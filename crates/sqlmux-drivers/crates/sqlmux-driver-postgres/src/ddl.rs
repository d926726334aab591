//! PostgreSQL DDL rendering
//!
//! An alter-table diff compiles to a short sequence that runs inside one
//! transaction:
//!
//! 1. `DROP INDEX` for plain indexes that are changed or removed
//! 2. `RENAME COLUMN` for renamed columns; later clauses use the new names
//! 3. one `ALTER TABLE` with column and constraint clauses in category order
//! 4. `CREATE INDEX` for plain indexes that are added or changed
//! 5. `COMMENT ON COLUMN` / `COMMENT ON TABLE`
//! 6. `RENAME TO` for the table itself

use sqlmux_core::profile::POSTGRESQL;
use sqlmux_core::{
    ColumnSpec, CompiledDdl, CreateTable, DdlCompiler, ForeignKeySpec, IndexKind, IndexSpec,
    SchemaDiff, TableRef, ViewSpec,
};

#[derive(Debug, Default)]
pub struct PostgresDdl;

fn qualified(schema: Option<&str>, name: &str) -> String {
    POSTGRESQL.qualify(schema, name)
}

fn ident(name: &str) -> String {
    POSTGRESQL.quote_ident(name)
}

fn column_type(column: &ColumnSpec) -> String {
    match column.length() {
        Some(length) => format!("{}({})", column.type_name.to_uppercase(), length),
        None => column.type_name.to_uppercase(),
    }
}

/// Column definition for `ADD COLUMN`; comments are rendered separately
fn column_definition(column: &ColumnSpec) -> String {
    let mut parts = vec![ident(&column.name), column_type(column)];
    if column.auto_increment {
        parts.push("GENERATED BY DEFAULT AS IDENTITY".to_string());
    }
    if !column.nullable {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = column.default.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("DEFAULT {}", default));
    }
    if let Some(collation) = column.collation.as_deref().filter(|c| !c.is_empty()) {
        parts.push(format!("COLLATE {}", ident(collation)));
    }
    parts.join(" ")
}

/// `ALTER COLUMN` clauses bringing an already renamed column to its new definition
fn alter_column(column: &ColumnSpec) -> Vec<String> {
    let target = ident(&column.name);
    let type_name = column_type(column);
    let mut clauses = vec![format!(
        "ALTER COLUMN {target} TYPE {type_name} USING {target}::{type_name}"
    )];
    clauses.push(if column.nullable {
        format!("ALTER COLUMN {target} DROP NOT NULL")
    } else {
        format!("ALTER COLUMN {target} SET NOT NULL")
    });
    clauses.push(match column.default.as_deref().filter(|d| !d.is_empty()) {
        Some(default) => format!("ALTER COLUMN {target} SET DEFAULT {default}"),
        None => format!("ALTER COLUMN {target} DROP DEFAULT"),
    });
    clauses
}

fn index_fields(fields: &[String]) -> String {
    fields.iter().map(|f| ident(f)).collect::<Vec<_>>().join(", ")
}

/// Primary and unique keys are table constraints; the rest are plain indexes
fn is_constraint(kind: IndexKind) -> bool {
    matches!(kind, IndexKind::Primary | IndexKind::Unique)
}

fn add_constraint(index: &IndexSpec) -> String {
    let fields = index_fields(&index.fields);
    match index.kind {
        IndexKind::Primary if index.name.is_empty() || index.name == "PRIMARY" => {
            format!("ADD PRIMARY KEY ({})", fields)
        }
        IndexKind::Primary => format!(
            "ADD CONSTRAINT {} PRIMARY KEY ({})",
            ident(&index.name),
            fields
        ),
        _ => format!("ADD CONSTRAINT {} UNIQUE ({})", ident(&index.name), fields),
    }
}

fn add_foreign_key(key: &ForeignKeySpec) -> String {
    let mut clause = format!(
        "ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        ident(&key.constraint_name),
        ident(&key.field),
        qualified(key.ref_schema.as_deref(), &key.ref_table),
        ident(&key.ref_field)
    );
    if !key.on_update.is_empty() {
        clause.push_str(&format!(" ON UPDATE {}", key.on_update));
    }
    if !key.on_delete.is_empty() {
        clause.push_str(&format!(" ON DELETE {}", key.on_delete));
    }
    clause
}

fn drop_constraint(name: &str) -> String {
    format!("DROP CONSTRAINT {}", ident(name))
}

fn create_index(schema: Option<&str>, table: &str, index: &IndexSpec) -> String {
    format!(
        "CREATE INDEX {} ON {} ({})",
        ident(&index.name),
        qualified(schema, table),
        index_fields(&index.fields)
    )
}

fn drop_index(schema: Option<&str>, name: &str) -> String {
    format!("DROP INDEX {}", qualified(schema, name))
}

fn comment_literal(comment: &str) -> String {
    POSTGRESQL.quote_str(comment)
}

/// Clauses of the main ALTER TABLE statement, in application order
pub(crate) fn alter_clauses(diff: &SchemaDiff) -> Vec<String> {
    let mut clauses = Vec::new();

    for column in &diff.columns.additions {
        clauses.push(format!("ADD COLUMN {}", column_definition(column)));
    }
    for index in diff.indexes.additions.iter().filter(|i| is_constraint(i.kind)) {
        clauses.push(add_constraint(index));
    }
    for key in &diff.foreign_keys.additions {
        clauses.push(add_foreign_key(key));
    }

    for change in &diff.columns.changes {
        clauses.extend(alter_column(&change.column));
    }
    for change in &diff.indexes.changes {
        if is_constraint(change.old_kind) {
            clauses.push(drop_constraint(&change.old_name));
        }
        if is_constraint(change.index.kind) {
            clauses.push(add_constraint(&change.index));
        }
    }
    for change in &diff.foreign_keys.changes {
        clauses.push(drop_constraint(&change.old_name));
        clauses.push(add_foreign_key(&change.key));
    }

    for column in &diff.columns.deletions {
        clauses.push(format!("DROP COLUMN {}", ident(&column.name)));
    }
    for index in diff.indexes.deletions.iter().filter(|i| is_constraint(i.kind)) {
        clauses.push(drop_constraint(&index.name));
    }
    for key in &diff.foreign_keys.deletions {
        clauses.push(drop_constraint(&key.constraint_name));
    }

    clauses
}

impl DdlCompiler for PostgresDdl {
    fn create_table(&self, spec: &CreateTable) -> CompiledDdl {
        let table = qualified(spec.schema.as_deref(), &spec.name);
        let mut ddl = CompiledDdl::single(format!(
            "CREATE TABLE {} ({} INT NULL)",
            table,
            ident(&format!("{}_ID", spec.name))
        ));
        if let Some(comment) = spec.comment.as_deref().filter(|c| !c.is_empty()) {
            ddl.push(format!(
                "COMMENT ON TABLE {} IS {}",
                table,
                comment_literal(comment)
            ));
        }
        ddl
    }

    fn alter_table(&self, diff: &SchemaDiff) -> CompiledDdl {
        let schema = diff.table.schema.as_deref();
        let table = qualified(schema, &diff.table.name);
        let mut ddl = CompiledDdl::default();

        let dropped_indexes = diff
            .indexes
            .changes
            .iter()
            .filter(|c| !is_constraint(c.old_kind))
            .map(|c| c.old_name.as_str())
            .chain(
                diff.indexes
                    .deletions
                    .iter()
                    .filter(|d| !is_constraint(d.kind))
                    .map(|d| d.name.as_str()),
            );
        for name in dropped_indexes {
            ddl.push(drop_index(schema, name));
        }

        for change in &diff.columns.changes {
            if change.org_name != change.column.name {
                ddl.push(format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {}",
                    table,
                    ident(&change.org_name),
                    ident(&change.column.name)
                ));
            }
        }

        let clauses = alter_clauses(diff);
        if !clauses.is_empty() {
            ddl.push(format!("ALTER TABLE {} {}", table, clauses.join(", ")));
        }

        let created_indexes = diff
            .indexes
            .additions
            .iter()
            .chain(diff.indexes.changes.iter().map(|c| &c.index))
            .filter(|i| !is_constraint(i.kind));
        for index in created_indexes {
            ddl.push(create_index(schema, &diff.table.name, index));
        }

        let commented = diff
            .columns
            .additions
            .iter()
            .chain(diff.columns.changes.iter().map(|c| &c.column));
        for column in commented {
            if let Some(comment) = &column.comment {
                ddl.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    table,
                    ident(&column.name),
                    comment_literal(comment)
                ));
            }
        }
        if let Some(comment) = &diff.options.comment {
            ddl.push(format!(
                "COMMENT ON TABLE {} IS {}",
                table,
                comment_literal(comment)
            ));
        }

        if let Some(name) = diff.options.name.as_deref().filter(|n| *n != diff.table.name) {
            ddl.push(format!("ALTER TABLE {} RENAME TO {}", table, ident(name)));
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
            "CREATE VIEW {} {}",
            qualified(view.schema.as_deref(), &view.name),
            view_body(view)
        ))
    }

    fn alter_view(&self, view: &ViewSpec) -> CompiledDdl {
        let schema = view.schema.as_deref();
        let current = qualified(schema, view.current_name());
        let mut ddl = CompiledDdl::single(format!(
            "CREATE OR REPLACE VIEW {} {}",
            current,
            view_body(view)
        ));
        if view.current_name() != view.name {
            ddl.push(format!("ALTER VIEW {} RENAME TO {}", current, ident(&view.name)));
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
        format!("SET search_path TO {}", ident(schema))
    }
}

fn view_body(view: &ViewSpec) -> String {
    match view.update_option.as_deref().filter(|o| !o.is_empty()) {
        Some(option) => format!("AS {} WITH {} CHECK OPTION", view.sql.trim(), option),
        None => format!("AS {}", view.sql.trim()),
    }
}
