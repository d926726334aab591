//! Query builder
//!
//! `QueryBuilder` accumulates clause fragments without touching any
//! connection. Every method consumes the builder and returns the extended
//! one, so a builder can be cloned and branched but never mutated behind
//! another caller's back. [`QueryBuilder::render`] turns the accumulated
//! state into SQL text for a given [`CapabilityProfile`].
//!
//! Predicate, assignment and value fragments are inserted verbatim. The
//! caller is responsible for escaping them; this layer does not bind
//! parameters.

use crate::{CapabilityProfile, LimitSyntax};
use indexmap::IndexMap;

/// Row limit with an optional offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: Option<u64>,
    pub count: u64,
}

/// Clause fragments collected by a [`QueryBuilder`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub select: Vec<String>,
    pub from: Option<String>,
    pub schema: Option<String>,
    pub where_: Vec<(String, String)>,
    pub update: Vec<(String, String)>,
    pub insert: IndexMap<String, Option<String>>,
    pub delete: bool,
    pub group_by: Vec<String>,
    pub order_by: Vec<(String, String)>,
    pub limit: Option<Limit>,
}

/// Fluent, immutable builder for SELECT/INSERT/UPDATE/DELETE text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    state: QueryState,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the accumulated fragments
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.select.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.state.from = Some(table.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.state.schema = Some(schema.into());
        self
    }

    /// Add predicates, ANDed together: `column` followed by `fragment`,
    /// e.g. `("TABLE_NAME", "= 'users'")` or `("deleted_at", "IS NULL")`.
    pub fn where_<I, K, V>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.state
            .where_
            .extend(predicates.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add ordering entries such as `("ORDINAL_POSITION", "ASC")`
    pub fn order_by<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.state
            .order_by
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.state.limit = Some(Limit {
            offset: None,
            count,
        });
        self
    }

    pub fn limit_offset(mut self, offset: u64, count: u64) -> Self {
        self.state.limit = Some(Limit {
            offset: Some(offset),
            count,
        });
        self
    }

    /// Turn the query into an UPDATE with `column` + `fragment`
    /// assignments, e.g. `("name", "= 'Ann'")`.
    pub fn update<I, K, V>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.state
            .update
            .extend(assignments.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Turn the query into an INSERT. `None` values are left out of the
    /// column list so the column default applies.
    pub fn insert<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        for (key, value) in fields {
            self.state.insert.insert(key.into(), value);
        }
        self
    }

    pub fn delete(mut self) -> Self {
        self.state.delete = true;
        self
    }

    /// Render SQL text for `profile`.
    ///
    /// Clause order: verb, FROM/INTO target, SET, WHERE, GROUP BY,
    /// ORDER BY, LIMIT, then the VALUES list of an INSERT.
    pub fn render(&self, profile: &CapabilityProfile) -> String {
        let state = &self.state;
        let is_update = !state.update.is_empty();
        let is_insert = !state.insert.is_empty();
        let mut parts: Vec<String> = Vec::new();

        if !state.select.is_empty() {
            parts.push(format!("SELECT {}", state.select.join(", ")));
        } else if !is_update && !is_insert && !state.delete {
            parts.push("SELECT *".to_string());
        }
        if is_update {
            parts.push("UPDATE".to_string());
        }
        if is_insert {
            parts.push("INSERT".to_string());
        }
        if state.delete {
            parts.push("DELETE".to_string());
        }

        if let Some(table) = &state.from {
            let target = profile.qualify(state.schema.as_deref(), table);
            if is_insert {
                parts.push(format!("INTO {}", target));
            } else if is_update {
                parts.push(target);
            } else {
                parts.push(format!("FROM {}", target));
            }
        }

        if is_update {
            parts.push(format!("SET {}", join_pairs(profile, &state.update, ", ")));
        }
        if !state.where_.is_empty() {
            parts.push(format!("WHERE {}", join_pairs(profile, &state.where_, " AND ")));
        }
        if !state.group_by.is_empty() {
            parts.push(format!("GROUP BY {}", state.group_by.join(", ")));
        }
        if !state.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", join_pairs(profile, &state.order_by, ", ")));
        }
        if let Some(limit) = state.limit {
            parts.push(render_limit(profile, limit));
        }

        if is_insert {
            let (fields, values): (Vec<String>, Vec<&str>) = state
                .insert
                .iter()
                .filter_map(|(k, v)| v.as_deref().map(|v| (profile.quote_ident(k), v)))
                .unzip();
            parts.push(format!(
                "({}) VALUES ({})",
                fields.join(", "),
                values.join(", ")
            ));
        }

        parts.join(" ")
    }
}

fn join_pairs(profile: &CapabilityProfile, pairs: &[(String, String)], separator: &str) -> String {
    pairs
        .iter()
        .map(|(key, fragment)| format!("{} {}", profile.quote_ident(key), fragment))
        .collect::<Vec<_>>()
        .join(separator)
}

fn render_limit(profile: &CapabilityProfile, limit: Limit) -> String {
    match (limit.offset, profile.limit_syntax) {
        (None, _) => format!("LIMIT {}", limit.count),
        (Some(offset), LimitSyntax::OffsetComma) => format!("LIMIT {}, {}", offset, limit.count),
        (Some(offset), LimitSyntax::OffsetKeyword) => {
            format!("LIMIT {} OFFSET {}", limit.count, offset)
        }
    }
}
