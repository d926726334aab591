//! Capability profiles
//!
//! A profile is the declarative description of one dialect: connection
//! defaults, quoting characters, feature flags and the SQL templates used
//! for empty routine bodies. Profiles are plain `const` data composed over
//! [`BASE`] with struct-update syntax, so adding a dialect means adding one
//! record and registering it in [`PROFILE_REGISTRY`].

use crate::{Result, SqlmuxError};
use std::collections::HashMap;
use std::sync::LazyLock;

/// How a row limit with an offset is spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSyntax {
    /// `LIMIT offset, count`
    OffsetComma,
    /// `LIMIT count OFFSET offset`
    OffsetKeyword,
}

/// Feature flags a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub database: bool,
    pub tables: bool,
    pub views: bool,
    pub triggers: bool,
    pub trigger_functions: bool,
    pub routines: bool,
    pub functions: bool,
    pub schedulers: bool,
    pub processes_list: bool,
    pub indexes: bool,
    pub foreigns: bool,
    pub nullable: bool,
    pub engines: bool,
    pub collations: bool,
    pub unsigned: bool,
    pub zerofill: bool,
    /// Per-column `ON UPDATE` clause
    pub on_update: bool,
    pub auto_increment: bool,
    pub comments: bool,
    pub table_array: bool,
    pub database_edit: bool,
    pub procedure_context: bool,
    pub procedure_language: bool,
    pub function_context: bool,
    pub function_language: bool,
    pub trigger_statement_in_creation: bool,
    /// One trigger definition may fire on several events
    pub trigger_multiple_events: bool,
    /// Trigger names are scoped by their table
    pub trigger_table_in_name: bool,
    pub trigger_only_rename: bool,
}

impl Features {
    pub const NONE: Features = Features {
        database: false,
        tables: false,
        views: false,
        triggers: false,
        trigger_functions: false,
        routines: false,
        functions: false,
        schedulers: false,
        processes_list: false,
        indexes: false,
        foreigns: false,
        nullable: false,
        engines: false,
        collations: false,
        unsigned: false,
        zerofill: false,
        on_update: false,
        auto_increment: false,
        comments: false,
        table_array: false,
        database_edit: false,
        procedure_context: false,
        procedure_language: false,
        function_context: false,
        function_language: false,
        trigger_statement_in_creation: false,
        trigger_multiple_events: false,
        trigger_table_in_name: false,
        trigger_only_rename: false,
    };
}

/// Boilerplate bodies offered when creating empty routines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Templates {
    pub procedure_sql: &'static str,
    pub function_sql: &'static str,
    pub trigger_sql: &'static str,
    pub trigger_function_sql: &'static str,
}

/// Declarative description of a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityProfile {
    /// Registry key
    pub key: &'static str,
    pub display_name: &'static str,
    pub default_port: u16,
    pub default_user: &'static str,
    pub default_database: Option<&'static str>,
    pub identifier_quote: char,
    pub string_quote: char,
    /// Schema assumed for result columns the driver reports without one
    pub system_schema: &'static str,
    pub limit_syntax: LimitSyntax,
    /// DDL can be rolled back inside a transaction
    pub transactional_ddl: bool,
    pub languages: &'static [&'static str],
    pub trigger_function_languages: &'static [&'static str],
    pub templates: Templates,
    pub features: Features,
}

/// Shared defaults every profile starts from
pub const BASE: CapabilityProfile = CapabilityProfile {
    key: "",
    display_name: "",
    default_port: 0,
    default_user: "",
    default_database: None,
    identifier_quote: '"',
    string_quote: '\'',
    system_schema: "information_schema",
    limit_syntax: LimitSyntax::OffsetKeyword,
    transactional_ddl: false,
    languages: &[],
    trigger_function_languages: &[],
    templates: Templates {
        procedure_sql: "",
        function_sql: "",
        trigger_sql: "",
        trigger_function_sql: "",
    },
    features: Features {
        database: true,
        tables: true,
        views: true,
        indexes: true,
        foreigns: true,
        nullable: true,
        ..Features::NONE
    },
};

pub const MYSQL: CapabilityProfile = CapabilityProfile {
    key: "mysql",
    display_name: "MySQL",
    default_port: 3306,
    default_user: "root",
    identifier_quote: '`',
    system_schema: "INFORMATION_SCHEMA",
    limit_syntax: LimitSyntax::OffsetComma,
    languages: &["sql"],
    templates: Templates {
        procedure_sql: "BEGIN\r\n\r\nEND",
        function_sql: "BEGIN\r\n\r\nEND",
        trigger_sql: "BEGIN\r\n\r\nEND",
        trigger_function_sql: "",
    },
    features: Features {
        triggers: true,
        routines: true,
        functions: true,
        schedulers: true,
        processes_list: true,
        engines: true,
        collations: true,
        unsigned: true,
        zerofill: true,
        on_update: true,
        auto_increment: true,
        comments: true,
        ..BASE.features
    },
    ..BASE
};

pub const POSTGRESQL: CapabilityProfile = CapabilityProfile {
    key: "postgresql",
    display_name: "PostgreSQL",
    default_port: 5432,
    default_user: "postgres",
    default_database: Some("postgres"),
    identifier_quote: '"',
    string_quote: '\'',
    transactional_ddl: true,
    languages: &["sql", "plpgsql", "c", "internal"],
    trigger_function_languages: &["plpgsql"],
    templates: Templates {
        procedure_sql: "$procedure$\r\n\r\n$procedure$",
        function_sql: "$function$\r\n\r\n$function$",
        trigger_sql: "EXECUTE PROCEDURE ",
        trigger_function_sql: "$function$\r\nBEGIN\r\n\r\nEND\r\n$function$",
    },
    features: Features {
        processes_list: true,
        triggers: true,
        trigger_functions: true,
        routines: true,
        functions: true,
        comments: true,
        table_array: true,
        procedure_context: true,
        procedure_language: true,
        function_context: true,
        function_language: true,
        trigger_statement_in_creation: true,
        trigger_multiple_events: true,
        trigger_table_in_name: true,
        ..BASE.features
    },
    ..BASE
};

impl CapabilityProfile {
    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_ident(&self, name: &str) -> String {
        let q = self.identifier_quote;
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Quote `name`, prefixed by the quoted schema when one is given.
    pub fn qualify(&self, schema: Option<&str>, name: &str) -> String {
        match schema.filter(|s| !s.is_empty()) {
            Some(schema) => format!("{}.{}", self.quote_ident(schema), self.quote_ident(name)),
            None => self.quote_ident(name),
        }
    }

    /// Quote a string literal, doubling any embedded quote character.
    pub fn quote_str(&self, value: &str) -> String {
        let q = self.string_quote;
        let escaped = value.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Inverse of [`quote_ident`](Self::quote_ident).
    pub fn strip_ident_quotes(&self, quoted: &str) -> String {
        let q = self.identifier_quote;
        let inner = quoted
            .strip_prefix(q)
            .and_then(|s| s.strip_suffix(q))
            .unwrap_or(quoted);
        inner.replace(&format!("{q}{q}"), &q.to_string())
    }
}

/// Registry of capability profiles keyed by dialect identifier
pub struct ProfileRegistry {
    profiles: HashMap<&'static str, &'static CapabilityProfile>,
}

impl ProfileRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Register a profile under its own key
    pub fn register(&mut self, profile: &'static CapabilityProfile) {
        self.profiles.insert(profile.key, profile);
    }

    /// Register an additional key for an existing profile
    pub fn alias(&mut self, alias: &'static str, profile: &'static CapabilityProfile) {
        self.profiles.insert(alias, profile);
    }

    /// Look up a profile; keys are matched case-insensitively
    pub fn get(&self, key: &str) -> Option<&'static CapabilityProfile> {
        self.profiles.get(key.to_ascii_lowercase().as_str()).copied()
    }

    /// All registered keys, aliases included
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.profiles.keys().copied()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global profile registry
pub static PROFILE_REGISTRY: LazyLock<ProfileRegistry> = LazyLock::new(|| {
    let mut registry = ProfileRegistry::new();

    registry.register(&MYSQL);
    registry.alias("mariadb", &MYSQL);

    registry.register(&POSTGRESQL);
    registry.alias("postgres", &POSTGRESQL);

    registry
});

/// Resolve the profile for a dialect key
pub fn resolve(key: &str) -> Result<&'static CapabilityProfile> {
    PROFILE_REGISTRY
        .get(key)
        .ok_or_else(|| SqlmuxError::UnknownDialect(key.to_string()))
}
