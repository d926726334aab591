//! Tests for PostgreSQL catalog mapping

use crate::catalog::*;
use async_trait::async_trait;
use sqlmux_core::decode::from_row;
use sqlmux_core::{Catalog, IndexKind, Payload, RawOutcome, Result, Row, Session, TableKind, Value};

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

/// Session answering statements that contain a marker with canned rows
#[derive(Default)]
struct ScriptedSession {
    answers: Vec<(String, Vec<Row>)>,
    seen: Vec<String>,
}

impl ScriptedSession {
    fn answer(mut self, marker: &str, rows: Vec<Row>) -> Self {
        self.answers.push((marker.to_string(), rows));
        self
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn run(&mut self, sql: &str, _nest: bool) -> Result<RawOutcome> {
        self.seen.push(sql.to_string());
        let rows = self
            .answers
            .iter()
            .find(|(marker, _)| sql.contains(marker.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Ok(RawOutcome {
            payload: Payload::Rows(rows),
            fields: Vec::new(),
        })
    }
}

mod trigger_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_before_row_insert_or_update() {
        // ROW | BEFORE | INSERT | UPDATE
        let (timing, event) = decode_tgtype(1 | 2 | 4 | 16);
        assert_eq!(timing, "BEFORE");
        assert_eq!(event, "INSERT OR UPDATE");
    }

    #[test]
    fn test_instead_of_and_after() {
        assert_eq!(
            decode_tgtype(1 | 64 | 8),
            ("INSTEAD OF".to_string(), "DELETE".to_string())
        );
        assert_eq!(
            decode_tgtype(32),
            ("AFTER".to_string(), "TRUNCATE".to_string())
        );
    }

    #[test]
    fn test_trigger_row_maps_definition_and_state() {
        let row = Row::from_pairs([
            ("schema_name", text("public")),
            ("trigger_name", text("audit_users")),
            ("table_name", text("users")),
            ("tgtype", Value::Int32(1 | 4 | 8)),
            (
                "definition",
                text("CREATE TRIGGER audit_users AFTER INSERT OR DELETE ON public.users FOR EACH ROW EXECUTE FUNCTION audit()"),
            ),
            ("definer", text("app")),
            ("enabled", Value::Bool(false)),
        ]);
        let trigger = map_trigger(from_row(&row).unwrap());

        assert_eq!(trigger.name, "audit_users");
        assert_eq!(trigger.table, "users");
        assert_eq!(trigger.timing, "AFTER");
        assert_eq!(trigger.event, "INSERT OR DELETE");
        assert!(!trigger.enabled);
        assert!(trigger.statement.unwrap().starts_with("CREATE TRIGGER"));
    }
}

mod column_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_column(default: Value, identity: &str) -> RawColumn {
        let row = Row::from_pairs([
            ("table_schema", text("public")),
            ("table_name", text("users")),
            ("column_name", text("id")),
            ("ordinal_position", Value::Int32(1)),
            ("column_default", default),
            ("is_nullable", text("NO")),
            ("udt_name", text("int4")),
            ("character_maximum_length", Value::Null),
            ("numeric_precision", Value::Int32(32)),
            ("numeric_scale", Value::Int32(0)),
            ("datetime_precision", Value::Null),
            ("character_set_name", Value::Null),
            ("collation_name", Value::Null),
            ("is_identity", text(identity)),
            ("column_key", text("pri")),
            ("column_comment", text("")),
        ]);
        from_row(&row).unwrap()
    }

    #[test]
    fn test_serial_column_is_auto_increment() {
        let column = map_column(raw_column(
            text("nextval('users_id_seq'::regclass)"),
            "NO",
        ));

        assert_eq!(column.type_name, "INT4");
        assert_eq!(column.key, "pri");
        assert_eq!(column.order, 1);
        assert_eq!(column.num_precision, Some(32));
        assert!(column.auto_increment);
        assert!(!column.nullable);
        assert!(!column.unsigned);
        assert_eq!(column.on_update, "");
    }

    #[test]
    fn test_identity_column_is_auto_increment() {
        let column = map_column(raw_column(Value::Null, "YES"));
        assert!(column.auto_increment);
        assert_eq!(column.default, None);
    }

    #[test]
    fn test_plain_default_is_not_auto_increment() {
        let column = map_column(raw_column(text("0"), "NO"));
        assert!(!column.auto_increment);
        assert_eq!(column.default.as_deref(), Some("0"));
    }

    #[test]
    fn test_columns_query_quotes_literals() {
        let sql = columns_query("public", "o'brien");
        assert!(sql.contains("c.table_name = 'o''brien'"));
        assert!(sql.contains("ORDER BY c.ordinal_position"));
    }
}

mod index_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_index(name: &str, unique: bool, primary: bool) -> RawIndex {
        let row = Row::from_pairs([
            ("index_name", text(name)),
            ("column_name", text("email")),
            ("is_unique", Value::Bool(unique)),
            ("is_primary", Value::Bool(primary)),
            ("index_type", text("btree")),
            ("index_comment", Value::Null),
        ]);
        from_row(&row).unwrap()
    }

    #[test]
    fn test_index_kinds() {
        assert_eq!(map_index(raw_index("users_pkey", true, true)).kind, IndexKind::Primary);
        assert_eq!(map_index(raw_index("users_email_key", true, false)).kind, IndexKind::Unique);

        let plain = map_index(raw_index("idx_users_email", false, false));
        assert_eq!(plain.kind, IndexKind::Index);
        assert_eq!(plain.index_type, "BTREE");
        assert!(!plain.unique);
    }
}

mod routine_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_routine(name: &str, prokind: &str, return_type: &str) -> RawRoutine {
        let row = Row::from_pairs([
            ("schema_name", text("public")),
            ("routine_name", text(name)),
            ("prokind", text(prokind)),
            ("language", text("plpgsql")),
            ("return_type", text(return_type)),
            ("arguments", text("")),
            ("definer", text("app")),
            ("security", text("INVOKER")),
            ("comment", Value::Null),
        ]);
        from_row(&row).unwrap()
    }

    #[tokio::test]
    async fn test_structure_groups_by_schema() {
        let mut session = ScriptedSession::default()
            .answer(
                "information_schema.schemata",
                vec![
                    Row::from_pairs([("schema_name", text("public"))]),
                    Row::from_pairs([("schema_name", text("billing"))]),
                ],
            )
            .answer(
                "information_schema.tables",
                vec![
                    Row::from_pairs([
                        ("table_schema", text("public")),
                        ("table_name", text("users")),
                        ("table_type", text("BASE TABLE")),
                        ("size", Value::Int64(16384)),
                        ("rows", Value::Int64(3)),
                        ("comment", Value::Null),
                    ]),
                    Row::from_pairs([
                        ("table_schema", text("billing")),
                        ("table_name", text("open_invoices")),
                        ("table_type", text("VIEW")),
                        ("size", Value::Int64(0)),
                        ("rows", Value::Int64(-1)),
                        ("comment", Value::Null),
                    ]),
                ],
            )
            .answer("FROM pg_trigger", Vec::new())
            .answer(
                "FROM pg_proc",
                vec![
                    Row::from_pairs([
                        ("schema_name", text("public")),
                        ("routine_name", text("touch")),
                        ("prokind", text("f")),
                        ("return_type", text("trigger")),
                    ]),
                    Row::from_pairs([
                        ("schema_name", text("public")),
                        ("routine_name", text("archive")),
                        ("prokind", text("p")),
                        ("return_type", Value::Null),
                    ]),
                ],
            );

        let snapshots = PostgresCatalog.structure(&mut session).await.unwrap();

        assert_eq!(session.seen.len(), 4);
        let names: Vec<_> = snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["billing", "public"]);

        let billing = &snapshots[0];
        assert_eq!(billing.views().count(), 1);
        assert_eq!(billing.tables[0].rows, None);

        let public = &snapshots[1];
        assert_eq!(public.tables[0].kind, TableKind::Table);
        assert_eq!(public.tables[0].size, Some(16384));
        assert_eq!(public.trigger_functions.len(), 1);
        assert_eq!(public.procedures[0].name, "archive");
        assert!(public.functions.is_empty());
        assert!(public.schedulers.is_empty());
    }

    #[test]
    fn test_routine_slots() {
        let (slot, entry) = map_routine(raw_routine("total", "f", "numeric"));
        assert_eq!(slot, RoutineSlot::Function);
        assert_eq!(entry.kind, "FUNCTION");
        assert_eq!(entry.return_type.as_deref(), Some("numeric"));
        assert_eq!(entry.language.as_deref(), Some("plpgsql"));

        let (slot, entry) = map_routine(raw_routine("archive", "p", ""));
        assert_eq!(slot, RoutineSlot::Procedure);
        assert_eq!(entry.kind, "PROCEDURE");
        assert_eq!(entry.return_type, None);

        let (slot, _) = map_routine(raw_routine("touch", "f", "trigger"));
        assert_eq!(slot, RoutineSlot::TriggerFunction);
    }
}

mod server_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_engines_are_empty_without_a_query() {
        let mut session = ScriptedSession::default();
        let engines = PostgresCatalog.engines(&mut session).await.unwrap();
        assert!(engines.is_empty());
        assert!(session.seen.is_empty());
    }

    #[tokio::test]
    async fn test_variables_and_users() {
        let mut session = ScriptedSession::default()
            .answer(
                "pg_settings",
                vec![Row::from_pairs([
                    ("name", text("max_connections")),
                    ("setting", text("100")),
                ])],
            )
            .answer(
                "pg_roles",
                vec![Row::from_pairs([("rolname", text("postgres"))])],
            );

        let variables = PostgresCatalog.variables(&mut session).await.unwrap();
        assert_eq!(variables[0].name, "max_connections");
        assert_eq!(variables[0].value, "100");
        assert_eq!(
            session.seen[0],
            r#"SELECT name, setting FROM "pg_catalog"."pg_settings" ORDER BY "name" ASC"#
        );

        let users = PostgresCatalog.users(&mut session).await.unwrap();
        assert_eq!(users[0].name, "postgres");
        assert_eq!(users[0].host, None);
    }

    #[tokio::test]
    async fn test_key_usage_maps_rules() {
        let mut session = ScriptedSession::default().answer(
            "FOREIGN KEY",
            vec![Row::from_pairs([
                ("table_schema", text("public")),
                ("table_name", text("orders")),
                ("column_name", text("user_id")),
                ("ordinal_position", Value::Int32(1)),
                ("position_in_unique_constraint", Value::Int32(1)),
                ("constraint_name", text("orders_user_id_fkey")),
                ("referenced_table_schema", text("public")),
                ("referenced_table_name", text("users")),
                ("referenced_column_name", text("id")),
                ("update_rule", text("NO ACTION")),
                ("delete_rule", text("CASCADE")),
            ])],
        );

        let keys = PostgresCatalog
            .key_usage(&mut session, "public", "orders")
            .await
            .unwrap();

        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].ref_table, "users");
        assert_eq!(keys[0].on_delete.as_deref(), Some("CASCADE"));
        assert!(session.seen[0].contains("tc.table_name = 'orders'"));
    }

    #[tokio::test]
    async fn test_composite_key_pairs_columns_by_position() {
        let row = |column: &str, position: i32, referenced: &str| {
            Row::from_pairs([
                ("table_schema", text("public")),
                ("table_name", text("shipments")),
                ("column_name", text(column)),
                ("ordinal_position", Value::Int32(position)),
                ("position_in_unique_constraint", Value::Int32(position)),
                ("constraint_name", text("shipments_order_fkey")),
                ("referenced_table_schema", text("public")),
                ("referenced_table_name", text("order_lines")),
                ("referenced_column_name", text(referenced)),
                ("update_rule", text("NO ACTION")),
                ("delete_rule", text("RESTRICT")),
            ])
        };
        let mut session = ScriptedSession::default().answer(
            "FOREIGN KEY",
            vec![row("order_id", 1, "id"), row("line_no", 2, "line")],
        );

        let keys = PostgresCatalog
            .key_usage(&mut session, "public", "shipments")
            .await
            .unwrap();

        let pairs: Vec<_> = keys
            .iter()
            .map(|k| (k.field.as_str(), k.ref_field.as_str(), k.position))
            .collect();
        assert_eq!(pairs, vec![("order_id", "id", Some(1)), ("line_no", "line", Some(2))]);
        assert!(
            session.seen[0]
                .contains("rku.ordinal_position = kcu.position_in_unique_constraint")
        );
        assert!(!session.seen[0].contains("constraint_column_usage"));
    }

    #[tokio::test]
    async fn test_view_information_strips_trailing_semicolon() {
        let mut session = ScriptedSession::default().answer(
            "pg_views",
            vec![Row::from_pairs([
                ("viewname", text("active_users")),
                ("viewowner", text("app")),
                ("definition", text(" SELECT users.id\n   FROM users\n  WHERE users.active;")),
            ])],
        );

        let view = PostgresCatalog
            .view_information(&mut session, "public", "active_users")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.sql, "SELECT users.id\n   FROM users\n  WHERE users.active");
        assert_eq!(view.definer, "app");
        assert_eq!(view.algorithm, "");
    }

    #[tokio::test]
    async fn test_missing_view_is_none() {
        let mut session = ScriptedSession::default();
        let view = PostgresCatalog
            .view_information(&mut session, "public", "nope")
            .await
            .unwrap();
        assert!(view.is_none());
    }
}
