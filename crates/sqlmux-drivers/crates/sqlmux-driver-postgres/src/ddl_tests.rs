//! Tests for PostgreSQL DDL rendering

use crate::PostgresDdl;
use indoc::indoc;
use sqlmux_core::{
    ColumnChange, ColumnDrop, ColumnSpec, CreateTable, DdlCompiler, ForeignKeyDrop,
    ForeignKeySpec, IndexChange, IndexDrop, IndexKind, IndexSpec, SchemaDiff, TableRef, ViewSpec,
};

fn users_diff() -> SchemaDiff {
    SchemaDiff::new(TableRef::in_schema("public", "users"))
}

mod create_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table_ignores_engine_and_collation() {
        let spec = CreateTable {
            schema: Some("public".into()),
            name: "users".into(),
            collation: Some("utf8_general_ci".into()),
            comment: Some("people".into()),
            engine: Some("InnoDB".into()),
        };

        assert_eq!(
            PostgresDdl.create_table(&spec).statements,
            vec![
                r#"CREATE TABLE "public"."users" ("users_ID" INT NULL)"#,
                r#"COMMENT ON TABLE "public"."users" IS 'people'"#,
            ]
        );
    }

    #[test]
    fn test_truncate_drop_and_use_schema() {
        let table = TableRef::in_schema("public", "users");
        assert_eq!(
            PostgresDdl.truncate_table(&table).statements,
            vec![r#"TRUNCATE TABLE "public"."users""#]
        );
        assert_eq!(
            PostgresDdl.drop_table(&table).statements,
            vec![r#"DROP TABLE "public"."users""#]
        );
        assert_eq!(PostgresDdl.use_schema("app"), r#"SET search_path TO "app""#);
    }
}

mod alter_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_comment_only_diff_is_one_statement() {
        let mut diff = users_diff();
        diff.options.comment = Some("registered people".into());

        assert_eq!(
            PostgresDdl.alter_table(&diff).statements,
            vec![r#"COMMENT ON TABLE "public"."users" IS 'registered people'"#]
        );
    }

    #[test]
    fn test_additions_share_one_alter() {
        let mut diff = users_diff();
        let mut email = ColumnSpec::new("email", "varchar");
        email.char_length = Some(255);
        diff.columns.additions.push(email);
        diff.indexes.additions.push(IndexSpec {
            name: "users_email_key".into(),
            kind: IndexKind::Unique,
            fields: vec!["email".into()],
        });
        diff.foreign_keys.additions.push(ForeignKeySpec {
            constraint_name: "users_team_fkey".into(),
            field: "team_id".into(),
            ref_schema: Some("public".into()),
            ref_table: "teams".into(),
            ref_field: "id".into(),
            on_update: "NO ACTION".into(),
            on_delete: "CASCADE".into(),
        });

        assert_eq!(
            PostgresDdl.alter_table(&diff).statements,
            vec![concat!(
                r#"ALTER TABLE "public"."users" "#,
                r#"ADD COLUMN "email" VARCHAR(255) NOT NULL, "#,
                r#"ADD CONSTRAINT "users_email_key" UNIQUE ("email"), "#,
                r#"ADD CONSTRAINT "users_team_fkey" FOREIGN KEY ("team_id") REFERENCES "public"."teams" ("id") ON UPDATE NO ACTION ON DELETE CASCADE"#
            )]
        );
    }

    #[test]
    fn test_column_change_with_rename_and_comment() {
        let mut diff = users_diff();
        diff.columns.changes.push(ColumnChange {
            org_name: "total".into(),
            column: ColumnSpec {
                name: "amount".into(),
                type_name: "numeric".into(),
                num_length: Some(12),
                nullable: true,
                default: Some("0".into()),
                comment: Some("in cents".into()),
                ..Default::default()
            },
        });

        assert_eq!(
            PostgresDdl.alter_table(&diff).statements,
            vec![
                r#"ALTER TABLE "public"."users" RENAME COLUMN "total" TO "amount""#,
                concat!(
                    r#"ALTER TABLE "public"."users" "#,
                    r#"ALTER COLUMN "amount" TYPE NUMERIC(12) USING "amount"::NUMERIC(12), "#,
                    r#"ALTER COLUMN "amount" DROP NOT NULL, "#,
                    r#"ALTER COLUMN "amount" SET DEFAULT 0"#
                ),
                r#"COMMENT ON COLUMN "public"."users"."amount" IS 'in cents'"#,
            ]
        );
    }

    #[test]
    fn test_constraint_on_renamed_column_follows_rename() {
        let mut diff = users_diff();
        diff.columns.changes.push(ColumnChange {
            org_name: "email".into(),
            column: ColumnSpec::new("email_address", "varchar"),
        });
        diff.indexes.additions.push(IndexSpec {
            name: "users_email_address_key".into(),
            kind: IndexKind::Unique,
            fields: vec!["email_address".into()],
        });
        diff.indexes.additions.push(IndexSpec {
            name: "idx_users_email_address".into(),
            kind: IndexKind::Index,
            fields: vec!["email_address".into()],
        });

        let sql = PostgresDdl.alter_table(&diff).statements.join(";\n");

        assert_eq!(
            sql,
            indoc! {r#"
                ALTER TABLE "public"."users" RENAME COLUMN "email" TO "email_address";
                ALTER TABLE "public"."users" ADD CONSTRAINT "users_email_address_key" UNIQUE ("email_address"), ALTER COLUMN "email_address" TYPE VARCHAR USING "email_address"::VARCHAR, ALTER COLUMN "email_address" SET NOT NULL, ALTER COLUMN "email_address" DROP DEFAULT;
                CREATE INDEX "idx_users_email_address" ON "public"."users" ("email_address")"#}
        );
    }

    #[test]
    fn test_plain_indexes_are_separate_statements() {
        let mut diff = users_diff();
        diff.indexes.additions.push(IndexSpec {
            name: "idx_users_name".into(),
            kind: IndexKind::Index,
            fields: vec!["last".into(), "first".into()],
        });
        diff.indexes.deletions.push(IndexDrop {
            name: "idx_old".into(),
            kind: IndexKind::Index,
        });

        assert_eq!(
            PostgresDdl.alter_table(&diff).statements,
            vec![
                r#"DROP INDEX "public"."idx_old""#,
                r#"CREATE INDEX "idx_users_name" ON "public"."users" ("last", "first")"#,
            ]
        );
    }

    #[test]
    fn test_primary_to_unique_change_drops_constraint_first() {
        let mut diff = users_diff();
        diff.indexes.changes.push(IndexChange {
            old_name: "users_pkey".into(),
            old_kind: IndexKind::Primary,
            index: IndexSpec {
                name: "uq_email".into(),
                kind: IndexKind::Unique,
                fields: vec!["email".into()],
            },
        });

        assert_eq!(
            PostgresDdl.alter_table(&diff).statements,
            vec![
                r#"ALTER TABLE "public"."users" DROP CONSTRAINT "users_pkey", ADD CONSTRAINT "uq_email" UNIQUE ("email")"#
            ]
        );
    }

    #[test]
    fn test_deletions_and_rename_order() {
        let mut diff = users_diff();
        diff.columns.deletions.push(ColumnDrop {
            name: "legacy".into(),
        });
        diff.foreign_keys.deletions.push(ForeignKeyDrop {
            constraint_name: "users_team_fkey".into(),
        });
        diff.options.comment = Some("x".into());
        diff.options.name = Some("members".into());

        assert_eq!(
            PostgresDdl.alter_table(&diff).statements,
            vec![
                r#"ALTER TABLE "public"."users" DROP COLUMN "legacy", DROP CONSTRAINT "users_team_fkey""#,
                r#"COMMENT ON TABLE "public"."users" IS 'x'"#,
                r#"ALTER TABLE "public"."users" RENAME TO "members""#,
            ]
        );
    }

    #[test]
    fn test_identity_column_addition() {
        let mut diff = SchemaDiff::new(TableRef::new("events"));
        let mut id = ColumnSpec::new("id", "int8");
        id.auto_increment = true;
        diff.columns.additions.push(id);

        assert_eq!(
            PostgresDdl.alter_table(&diff).statements,
            vec![r#"ALTER TABLE "events" ADD COLUMN "id" INT8 GENERATED BY DEFAULT AS IDENTITY NOT NULL"#]
        );
    }

    #[test]
    fn test_empty_diff_renders_nothing() {
        assert!(PostgresDdl.alter_table(&users_diff()).is_empty());
    }
}

mod view_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn view() -> ViewSpec {
        ViewSpec {
            schema: Some("public".into()),
            name: "active_users".into(),
            algorithm: "UNDEFINED".into(),
            definer: Some("`root`@`%`".into()),
            security: "DEFINER".into(),
            sql: "SELECT * FROM users WHERE active".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_view_ignores_mysql_attributes() {
        assert_eq!(
            PostgresDdl.create_view(&view()).statements,
            vec![r#"CREATE VIEW "public"."active_users" AS SELECT * FROM users WHERE active"#]
        );
    }

    #[test]
    fn test_alter_view_replaces_then_renames() {
        let mut spec = view();
        spec.old_name = Some("live_users".into());
        spec.update_option = Some("LOCAL".into());

        assert_eq!(
            PostgresDdl.alter_view(&spec).statements,
            vec![
                r#"CREATE OR REPLACE VIEW "public"."live_users" AS SELECT * FROM users WHERE active WITH LOCAL CHECK OPTION"#,
                r#"ALTER VIEW "public"."live_users" RENAME TO "active_users""#,
            ]
        );
    }

    #[test]
    fn test_drop_view() {
        assert_eq!(
            PostgresDdl
                .drop_view(&TableRef::in_schema("public", "v"))
                .statements,
            vec![r#"DROP VIEW "public"."v""#]
        );
    }
}
