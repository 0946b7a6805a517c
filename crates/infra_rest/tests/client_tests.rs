//! REST query client tests
//!
//! Each test stands up a local HTTP server that plays the PostgREST role and
//! checks both the request the client sends and how it reads the response.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use core_kernel::{AdapterHealth, Filter, HealthCheckable, PortError, QueryClient, SelectQuery};
use domain_measurement::{BodyPart, MeasurementStore, Operation, SaveStrategy, TABLE};
use infra_rest::{RestConfig, RestQueryClient};
use test_utils::{MeasurementFixtures, RowFixtures};

const PATH: &str = "/rest/v1/body_measurements";

fn client_for(server: &ServerGuard) -> RestQueryClient {
    RestQueryClient::new(RestConfig::new(server.url(), "anon-key")).unwrap()
}

fn stored_row(id: &str, date: &str, created_at: &str) -> Value {
    Value::Object(RowFixtures::measurement_row(
        id,
        MeasurementFixtures::user_id(),
        date,
        created_at,
    ))
}

fn encoded(key: &str, value: &str) -> Matcher {
    Matcher::UrlEncoded(key.to_string(), value.to_string())
}

mod requests {
    use super::*;

    #[tokio::test]
    async fn select_encodes_filters_order_and_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                encoded("select", "*"),
                encoded("client_id", "eq.u1"),
                encoded("order", "date.desc,created_at.desc"),
                encoded("limit", "1"),
            ]))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([stored_row("m1", "2024-01-02", "2024-01-02T08:00:00Z")]).to_string())
            .create_async()
            .await;

        let query = SelectQuery::new()
            .eq("client_id", "u1")
            .order_desc("date")
            .order_desc("created_at")
            .limit(1);
        let rows = client_for(&server).select(TABLE, query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "m1");
    }

    #[tokio::test]
    async fn insert_posts_row_and_returns_representation() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .match_header("prefer", "return=representation")
            .match_body(Matcher::PartialJson(json!({"client_id": "u1", "date": "2024-01-01"})))
            .with_status(201)
            .with_body(json!([stored_row("m1", "2024-01-01", "2024-01-01T08:00:00Z")]).to_string())
            .create_async()
            .await;

        let row = RowFixtures::object(json!({"client_id": "u1", "date": "2024-01-01"}));
        let stored = client_for(&server).insert(TABLE, row).await.unwrap();

        mock.assert_async().await;
        assert_eq!(stored["id"], "m1");
    }

    #[tokio::test]
    async fn update_patches_matching_rows() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", PATH)
            .match_query(Matcher::AllOf(vec![
                encoded("client_id", "eq.u1"),
                encoded("date", "eq.2024-01-01"),
            ]))
            .match_header("prefer", "return=representation")
            .match_body(Matcher::PartialJson(json!({"waist": 80.0})))
            .with_status(200)
            .with_body(json!([stored_row("m1", "2024-01-01", "2024-01-01T08:00:00Z")]).to_string())
            .create_async()
            .await;

        let row = RowFixtures::object(json!({"waist": 80.0}));
        let filters = [Filter::eq("client_id", "u1"), Filter::eq("date", "2024-01-01")];
        let stored = client_for(&server).update(TABLE, row, &filters).await.unwrap();

        mock.assert_async().await;
        assert_eq!(stored["id"], "m1");
    }

    #[tokio::test]
    async fn update_matching_nothing_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let row = RowFixtures::object(json!({"waist": 80.0}));
        let error = client_for(&server)
            .update(TABLE, row, &[Filter::eq("id", "missing")])
            .await
            .unwrap_err();

        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn upsert_names_conflict_columns() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_query(encoded("on_conflict", "client_id,date"))
            .match_header("prefer", "resolution=merge-duplicates,return=representation")
            .with_status(201)
            .with_body(json!([stored_row("m1", "2024-01-01", "2024-01-01T08:00:00Z")]).to_string())
            .create_async()
            .await;

        let row = RowFixtures::object(json!({"client_id": "u1", "date": "2024-01-01"}));
        let stored = client_for(&server)
            .upsert(TABLE, row, &["client_id", "date"])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(stored["date"], "2024-01-01");
    }

    #[tokio::test]
    async fn delete_filters_by_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", PATH)
            .match_query(encoded("id", "eq.m1"))
            .match_header("prefer", "return=minimal")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server)
            .delete(TABLE, &[Filter::eq("id", "m1")])
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn schema_is_sent_as_profile_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .match_header("accept-profile", "fitness")
            .match_header("content-profile", "fitness")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client =
            RestQueryClient::new(RestConfig::new(server.url(), "anon-key").schema("fitness")).unwrap();
        let rows = client.select(TABLE, SelectQuery::new()).await.unwrap();

        mock.assert_async().await;
        assert!(rows.is_empty());
    }
}

mod failures {
    use super::*;

    async fn select_with_status(status: usize, body: &str) -> PortError {
        let mut server = Server::new_async().await;
        server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("retry-after", "7")
            .with_body(body)
            .create_async()
            .await;

        client_for(&server)
            .select(TABLE, SelectQuery::new())
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn rejected_key_is_unauthorized() {
        let error = select_with_status(401, r#"{"message":"Invalid API key"}"#).await;
        assert!(matches!(error, PortError::Unauthorized { .. }));
        assert!(error.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn duplicate_key_is_conflict() {
        let error = select_with_status(409, r#"{"code":"23505"}"#).await;
        assert!(matches!(error, PortError::Conflict { .. }));
    }

    #[tokio::test]
    async fn throttling_carries_retry_after() {
        let error = select_with_status(429, "").await;
        assert!(matches!(error, PortError::RateLimited { retry_after_secs: Some(7) }));
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn server_error_is_service_unavailable() {
        let error = select_with_status(503, "").await;
        assert!(matches!(error, PortError::ServiceUnavailable { .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_transformation_error() {
        let error = select_with_status(200, "not json").await;
        assert!(matches!(error, PortError::Transformation { .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_connection_error() {
        let client = RestQueryClient::new(
            RestConfig::new("http://127.0.0.1:1", "anon-key").timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let error = client.select(TABLE, SelectQuery::new()).await.unwrap_err();
        assert!(matches!(
            error,
            PortError::Connection { .. } | PortError::Timeout { .. }
        ));
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reachable_backend_is_healthy() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let result = client_for(&server).health_check().await;

        assert_eq!(result.status, AdapterHealth::Healthy);
        assert_eq!(result.adapter_id, "postgrest-query-client");
        assert!(result.message.is_none());
    }

    #[tokio::test]
    async fn rejected_key_is_unhealthy() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let result = client_for(&server).health_check().await;

        assert_eq!(result.status, AdapterHealth::Unhealthy);
        assert!(result.message.is_some());
    }

    #[tokio::test]
    async fn overloaded_backend_is_degraded() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let result = client_for(&server).health_check().await;
        assert_eq!(result.status, AdapterHealth::Degraded);
    }
}

mod store_over_rest {
    use super::*;

    fn store_for(server: &ServerGuard) -> MeasurementStore {
        MeasurementStore::new(Arc::new(client_for(server)))
    }

    #[tokio::test]
    async fn latest_measurement_reads_first_row() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                encoded("client_id", "eq.u1"),
                encoded("limit", "1"),
            ]))
            .with_status(200)
            .with_body(json!([stored_row("m2", "2024-01-02", "2024-01-02T08:00:00Z")]).to_string())
            .create_async()
            .await;

        let latest = store_for(&server)
            .get_latest_measurement("u1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(latest.id, "m2");
        assert_eq!(latest.date, "2024-01-02");
        assert_eq!(latest.part(BodyPart::Waist), Some(82.5));
        assert_eq!(latest.part(BodyPart::Neck), None);
    }

    #[tokio::test]
    async fn history_keeps_server_order() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                encoded("client_id", "eq.u1"),
                encoded("order", "date.desc,created_at.desc"),
            ]))
            .with_status(200)
            .with_body(
                json!([
                    stored_row("m3", "2024-01-03", "2024-01-03T08:00:00Z"),
                    stored_row("m2", "2024-01-02", "2024-01-02T08:00:00Z"),
                    stored_row("m1", "2024-01-01", "2024-01-01T08:00:00Z"),
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let history = store_for(&server).get_all_measurements("u1").await.unwrap();
        let ids: Vec<_> = history.iter().map(|m| m.id.as_str()).collect();

        assert_eq!(ids, vec!["m3", "m2", "m1"]);
    }

    #[tokio::test]
    async fn save_checks_then_inserts() {
        let mut server = Server::new_async().await;
        let lookup = server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                encoded("client_id", "eq.u1"),
                encoded("date", "eq.2024-01-01"),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let insert = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({"client_id": "u1", "chest": 102.5})))
            .with_status(201)
            .with_body(json!([stored_row("server-id", "2024-01-01", "2024-01-01T08:00:00Z")]).to_string())
            .create_async()
            .await;

        let saved = store_for(&server)
            .save_measurement(&MeasurementFixtures::new_year())
            .await
            .unwrap();

        lookup.assert_async().await;
        insert.assert_async().await;
        assert_eq!(saved.id, "server-id");
    }

    #[tokio::test]
    async fn atomic_save_upserts_once() {
        let mut server = Server::new_async().await;
        let upsert = server
            .mock("POST", PATH)
            .match_query(encoded("on_conflict", "client_id,date"))
            .with_status(201)
            .with_body(json!([stored_row("m1", "2024-01-01", "2024-01-01T08:00:00Z")]).to_string())
            .expect(1)
            .create_async()
            .await;

        let store = store_for(&server).with_strategy(SaveStrategy::AtomicUpsert);
        store
            .save_measurement(&MeasurementFixtures::new_year())
            .await
            .unwrap();

        upsert.assert_async().await;
    }

    #[tokio::test]
    async fn rest_failure_names_the_operation() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let error = store_for(&server).delete_measurement("m1").await.unwrap_err();

        assert_eq!(error.operation(), Operation::Delete);
        assert!(matches!(error.cause(), PortError::Unauthorized { .. }));
    }
}
