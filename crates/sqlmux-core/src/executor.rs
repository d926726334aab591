//! Multi-statement execution and field enrichment
//!
//! Statements of one call run sequentially on one session: a later
//! statement may depend on what an earlier one did (a table renamed
//! mid-batch), so nothing here runs concurrently.

use crate::{
    CapabilityProfile, Catalog, ColumnMeta, ExecuteOutcome, FieldMeta, ForeignKeyMeta, Result,
    ResultEnvelope, Session, SqlmuxError,
};

/// Options for [`execute`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Name row columns `table.column`
    pub nest: bool,
    /// Attach catalog column definitions and foreign keys to fields
    pub details: bool,
}

impl ExecuteOptions {
    pub fn nested() -> Self {
        Self {
            nest: true,
            ..Self::default()
        }
    }

    pub fn detailed() -> Self {
        Self {
            details: true,
            ..Self::default()
        }
    }
}

/// Split SQL text on `;`, ignoring separators inside quotes, dollar-quoted
/// bodies and comments. Whitespace-only fragments are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = sql.chars().collect();
    let len = chars.len();
    let mut i = 0;

    let mut quote: Option<char> = None;
    let mut dollar_tag: Option<String> = None;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while i < len {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if in_line_comment {
            current.push(c);
            if c == '\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }

        if in_block_comment {
            current.push(c);
            if c == '*' && next == Some('/') {
                current.push('/');
                in_block_comment = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        if let Some(tag) = &dollar_tag {
            if sql_starts_with(&chars, i, tag) {
                current.push_str(tag);
                i += tag.chars().count();
                dollar_tag = None;
                continue;
            }
            current.push(c);
            i += 1;
            continue;
        }

        if let Some(q) = quote {
            current.push(c);
            if c == q {
                if next == Some(q) {
                    current.push(q);
                    i += 2;
                    continue;
                }
                quote = None;
            } else if c == '\\' && q != '`' {
                if let Some(escaped) = next {
                    current.push(escaped);
                    i += 2;
                    continue;
                }
            }
            i += 1;
            continue;
        }

        match c {
            '-' if next == Some('-') => {
                in_line_comment = true;
                current.push(c);
            }
            '/' if next == Some('*') => {
                in_block_comment = true;
                current.push_str("/*");
                i += 2;
                continue;
            }
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '$' => {
                if let Some(tag) = dollar_quote_tag(&chars, i) {
                    i += tag.chars().count();
                    current.push_str(&tag);
                    dollar_tag = Some(tag);
                    continue;
                }
                current.push(c);
            }
            ';' => {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    statements.push(trimmed.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
        i += 1;
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }

    statements
}

/// `$tag$` opener at `start`, if any
fn dollar_quote_tag(chars: &[char], start: usize) -> Option<String> {
    // A `$` directly after an identifier character is a positional
    // parameter or part of a name, not a quote.
    if start > 0 && (chars[start - 1].is_alphanumeric() || chars[start - 1] == '_') {
        return None;
    }
    let mut end = start + 1;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    if end < chars.len() && chars[end] == '$' {
        let tag: String = chars[start..=end].iter().collect();
        if tag[1..tag.len() - 1].chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(tag)
    } else {
        None
    }
}

fn sql_starts_with(chars: &[char], at: usize, needle: &str) -> bool {
    let mut idx = at;
    for expected in needle.chars() {
        if chars.get(idx) != Some(&expected) {
            return false;
        }
        idx += 1;
    }
    true
}

/// Execute `sql` statement by statement on one session.
#[tracing::instrument(skip_all, fields(nest = options.nest, details = options.details))]
pub async fn execute(
    session: &mut dyn Session,
    catalog: &dyn Catalog,
    profile: &CapabilityProfile,
    sql: &str,
    options: ExecuteOptions,
) -> Result<ExecuteOutcome> {
    let statements = split_statements(sql);
    let envelopes = execute_statements(session, catalog, profile, &statements, options).await?;
    Ok(ExecuteOutcome::from_envelopes(envelopes))
}

/// Execute already split statements, one envelope per statement.
pub async fn execute_statements(
    session: &mut dyn Session,
    catalog: &dyn Catalog,
    profile: &CapabilityProfile,
    statements: &[String],
    options: ExecuteOptions,
) -> Result<Vec<ResultEnvelope>> {
    tracing::debug!(statements = statements.len(), "executing batch");
    let mut envelopes = Vec::with_capacity(statements.len());

    for (index, statement) in statements.iter().enumerate() {
        tracing::debug!(
            index,
            sql_preview = %statement.chars().take(100).collect::<String>(),
            "executing statement"
        );
        let raw = session
            .run(statement, options.nest)
            .await
            .map_err(|e| e.at_statement(index, statement))?;

        let mut envelope = ResultEnvelope::from(raw);
        if options.details && !envelope.fields.is_empty() {
            let (fields, keys) = enrich_fields(session, catalog, profile, envelope.fields).await?;
            envelope.fields = fields;
            envelope.keys = keys;
        }
        envelopes.push(envelope);
    }

    Ok(envelopes)
}

/// Execute statements inside `BEGIN`/`COMMIT`, rolling back on failure.
pub async fn execute_atomic(
    session: &mut dyn Session,
    catalog: &dyn Catalog,
    profile: &CapabilityProfile,
    statements: &[String],
    options: ExecuteOptions,
) -> Result<Vec<ResultEnvelope>> {
    session.run("BEGIN", false).await?;

    match execute_statements(session, catalog, profile, statements, options).await {
        Ok(envelopes) => {
            session.run("COMMIT", false).await?;
            Ok(envelopes)
        }
        Err(err) => {
            if let Err(rollback_err) = session.run("ROLLBACK", false).await {
                tracing::error!(error = %rollback_err, "rollback after failed batch also failed");
            }
            Err(err)
        }
    }
}

/// Catalog table each field resolves to, position for position.
///
/// A field without a schema is assumed to come from the system schema.
/// A field without an origin table reuses the last table alias seen, which
/// is what information_schema queries report. Fields with no resolvable
/// table map to `None`.
pub fn resolve_field_tables(
    fields: &[FieldMeta],
    profile: &CapabilityProfile,
) -> Vec<Option<(String, String)>> {
    let mut cached_table: Option<&str> = None;

    fields
        .iter()
        .map(|field| {
            if !field.table.is_empty() {
                cached_table = Some(&field.table);
            }
            let table = if field.org_table.is_empty() {
                cached_table.unwrap_or_default()
            } else {
                field.org_table.as_str()
            };
            if table.is_empty() {
                return None;
            }
            let schema = if field.schema.is_empty() {
                profile.system_schema
            } else {
                field.schema.as_str()
            };
            Some((schema.to_string(), table.to_string()))
        })
        .collect()
}

/// Distinct `(schema, table)` pairs referenced by `fields`, in field order
pub fn lookup_targets(fields: &[FieldMeta], profile: &CapabilityProfile) -> Vec<(String, String)> {
    let mut targets: Vec<(String, String)> = Vec::new();
    for target in resolve_field_tables(fields, profile).into_iter().flatten() {
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
}

/// Cross-reference result fields with the catalog.
///
/// Each distinct table is looked up once. Every input field yields exactly
/// one output field in the same position: enriched when the catalog knows
/// the column, otherwise the raw field with its alias filled in.
pub async fn enrich_fields(
    session: &mut dyn Session,
    catalog: &dyn Catalog,
    profile: &CapabilityProfile,
    fields: Vec<FieldMeta>,
) -> Result<(Vec<FieldMeta>, Vec<ForeignKeyMeta>)> {
    let resolved = resolve_field_tables(&fields, profile);
    let targets = lookup_targets(&fields, profile);
    let mut columns: Vec<ColumnMeta> = Vec::new();
    let mut keys: Vec<ForeignKeyMeta> = Vec::new();

    for (schema, table) in &targets {
        let found = catalog
            .table_columns(session, schema, table)
            .await
            .map_err(|e| SqlmuxError::catalog(schema, table, e))?;
        columns.extend(found);

        let found = catalog
            .key_usage(session, schema, table)
            .await
            .map_err(|e| SqlmuxError::catalog(schema, table, e))?;
        keys.extend(found);
    }

    let enriched = fields
        .into_iter()
        .zip(resolved)
        .map(|(field, target)| {
            let name = field.lookup_name();
            let matched = target.as_ref().and_then(|(_, table)| {
                columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name) && c.table == *table)
                    .cloned()
            });

            if matched.is_none() {
                tracing::warn!(
                    schema = %field.schema,
                    table = %field.lookup_table(),
                    field = %name,
                    "no catalog definition for result field, using driver metadata"
                );
            }

            FieldMeta {
                alias: Some(field.name.clone()),
                table_alias: Some(field.table.clone()),
                column: matched,
                ..field
            }
        })
        .collect();

    Ok((enriched, keys))
}
