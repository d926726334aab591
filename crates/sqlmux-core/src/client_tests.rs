//! Tests for the client lifecycle and DDL application

use super::*;
use crate::mock::{MockDriver, Script};
use crate::profile::{MYSQL, POSTGRESQL};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn client(profile: &'static CapabilityProfile, script: Script) -> (Client, Arc<MockDriver>) {
    let driver = Arc::new(MockDriver::new(profile, script));
    let client = Client::new(driver.clone(), ConnectionParams::new("db.local"));
    (client, driver)
}

mod lifecycle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_filled_from_profile() {
        let (client, _driver) = client(&POSTGRESQL, Script::default());
        let params = client.params();
        assert_eq!(params.port, Some(5432));
        assert_eq!(params.user.as_deref(), Some("postgres"));
        assert_eq!(params.database.as_deref(), Some("postgres"));
    }

    #[tokio::test]
    async fn test_operations_fail_before_connect() {
        let (client, _driver) = client(&MYSQL, Script::default());
        let err = client
            .execute("SELECT 1", ExecuteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlmuxError::NotConnected));
    }

    #[tokio::test]
    async fn test_destroy_twice_is_a_no_op() {
        let (client, driver) = client(&MYSQL, Script::default());
        client.connect().await.unwrap();
        assert!(client.is_connected().await);

        client.destroy().await.unwrap();
        client.destroy().await.unwrap();

        assert!(!client.is_connected().await);
        assert_eq!(driver.log.destroyed.load(Ordering::SeqCst), 1);

        let err = client.get_users().await.unwrap_err();
        assert!(matches!(err, SqlmuxError::NotConnected));
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        let driver = Arc::new(MockDriver::new(&MYSQL, Script::default()));
        let client = Client::new(driver, ConnectionParams::new("unreachable"));

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, SqlmuxError::Connection(_)));
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_schema_reapplied_on_every_session() {
        let (client, driver) = client(&MYSQL, Script::default());
        client.connect().await.unwrap();
        client.use_schema("shop").await.unwrap();

        client.execute("SELECT 1", ExecuteOptions::default()).await.unwrap();
        client.execute("SELECT 2", ExecuteOptions::default()).await.unwrap();

        assert_eq!(client.current_schema().await.as_deref(), Some("shop"));
        assert_eq!(
            driver.log.statements(),
            vec!["USE shop", "USE shop", "SELECT 1", "USE shop", "SELECT 2"]
        );
    }

    #[tokio::test]
    async fn test_schema_from_params_applied_on_connect() {
        let driver = Arc::new(MockDriver::new(&MYSQL, Script::default()));
        let mut params = ConnectionParams::new("db.local");
        params.schema = Some("app".into());
        let client = Client::new(driver.clone(), params);

        client.connect().await.unwrap();

        assert_eq!(driver.log.statements(), vec!["USE app"]);
    }

    #[tokio::test]
    async fn test_unknown_schema_releases_adapter() {
        let script = Script {
            fail_on: Some("nosuch".into()),
            ..Default::default()
        };
        let driver = Arc::new(MockDriver::new(&MYSQL, script));
        let mut params = ConnectionParams::new("db.local");
        params.schema = Some("nosuch".into());
        let client = Client::new(driver.clone(), params);

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, SqlmuxError::Query(_)));
        assert!(!client.is_connected().await);
        assert_eq!(driver.log.destroyed.load(Ordering::SeqCst), 1);

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, SqlmuxError::Query(_)));
        assert_eq!(driver.log.destroyed.load(Ordering::SeqCst), 2);
        assert_eq!(driver.log.statements(), vec!["USE nosuch", "USE nosuch"]);
    }
}

mod run_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_run_renders_with_client_dialect() {
        let (client, driver) = client(&MYSQL, Script::default());
        client.connect().await.unwrap();

        let query = client.query().from("users").limit_offset(5, 10);
        client.run(&query).await.unwrap();

        assert_eq!(
            driver.log.statements(),
            vec!["SELECT * FROM `users` LIMIT 5, 10"]
        );
    }

    #[tokio::test]
    async fn test_catalog_errors_are_wrapped() {
        let (client, _driver) = client(&MYSQL, Script::default());
        client.connect().await.unwrap();

        let err = client.get_table_columns("shop", "missing").await.unwrap_err();
        assert!(matches!(err, SqlmuxError::CatalogLookup { .. }));
        assert!(err.to_string().contains("shop.missing"));
    }
}

mod ddl_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commented_table() -> CreateTable {
        CreateTable {
            name: "users".into(),
            comment: Some("people".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_transactional_dialect_wraps_ddl() {
        let (client, driver) = client(&POSTGRESQL, Script::default());
        client.connect().await.unwrap();

        let outcome = client.create_table(&commented_table()).await.unwrap();

        assert_eq!(outcome.len(), 2);
        assert_eq!(
            driver.log.statements(),
            vec![
                "BEGIN",
                "CREATE TABLE users (id INT)",
                "COMMENT ON TABLE users IS 'people'",
                "COMMIT",
            ]
        );
    }

    #[tokio::test]
    async fn test_non_transactional_dialect_runs_plainly() {
        let (client, driver) = client(&MYSQL, Script::default());
        client.connect().await.unwrap();

        client.create_table(&commented_table()).await.unwrap();

        assert_eq!(
            driver.log.statements(),
            vec!["CREATE TABLE users (id INT)", "COMMENT ON TABLE users IS 'people'"]
        );
    }

    #[tokio::test]
    async fn test_single_statement_ddl_is_not_wrapped() {
        let (client, driver) = client(&POSTGRESQL, Script::default());
        client.connect().await.unwrap();

        let outcome = client.drop_table(&TableRef::new("users")).await.unwrap();

        assert!(outcome.as_single().is_some());
        assert_eq!(driver.log.statements(), vec!["DROP TABLE users"]);
    }
}
