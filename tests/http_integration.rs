//! Integration tests for the GCP transport and resource definitions using wiremock
//!
//! These tests run real resource kinds from the embedded registry against
//! mocked Google API endpoints, covering pagination, lookup policies and
//! error responses.

use gcp_inventory::describe::{describe_all, DescribeContext, DescribeError};
use gcp_inventory::gcp::{format_gcp_error, projects, ApiError, GcpClient};
use gcp_inventory::resource::DefinedKind;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{bearer_token, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(service: &str, server: &MockServer) -> GcpClient {
    GcpClient::with_token("test-token")
        .unwrap()
        .with_endpoints([(service, server.uri())])
}

/// Test module for paginated listings
mod listing_tests {
    use super::*;

    /// Buckets follow nextPageToken and tolerate a forbidden IAM lookup
    #[tokio::test]
    async fn test_buckets_paginate_and_degrade_iam() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/storage/v1/b"))
            .and(bearer_token("test-token"))
            .and(query_param("project", "test-project"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "id": "b1", "name": "b1", "selfLink": "https://storage/b/b1" },
                    { "id": "b2", "name": "b2", "selfLink": "https://storage/b/b2" }
                ],
                "nextPageToken": "t2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/storage/v1/b"))
            .and(query_param("pageToken", "t2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "b3", "name": "b3", "selfLink": "https://storage/b/b3" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        for bucket in ["b1", "b3"] {
            Mock::given(method("GET"))
                .and(path(format!("/storage/v1/b/{}/iam", bucket)))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "bindings": [{ "role": "roles/storage.admin", "members": ["user:a@example.com"] }]
                })))
                .mount(&server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/storage/v1/b/b2/iam"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "Permission denied" }
            })))
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("storage-buckets", client_for("storage", &server)).unwrap();
        let ctx = DescribeContext::new("test-project", "us-central1");

        let resources = describe_all(&kind, &ctx).await.expect("describe should succeed");

        let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b1", "b2", "b3"]);
        assert!(resources[0].description["iam_policy"]["bindings"].is_array());
        assert!(resources[1].description["iam_policy"].is_null());
        assert_eq!(resources[2].arn, "https://storage/b/b3");
        assert!(resources.iter().all(|r| r.region.is_empty()));
    }

    /// Unpaginated listings are fetched once, whatever the response carries
    #[tokio::test]
    async fn test_unpaginated_kind_fetches_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/test-project/locations/europe-west1/clusters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "clusters": [{ "id": "c-1", "name": "prod", "selfLink": "https://container/c/prod" }],
                "nextPageToken": "ignored"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("gke-clusters", client_for("container", &server)).unwrap();
        let ctx = DescribeContext::new("test-project", "europe-west1");

        let resources = describe_all(&kind, &ctx).await.unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].region, "europe-west1");
        assert_eq!(resources[0].name, "prod");
    }

    /// Zonal listings expand the zone into the path
    #[tokio::test]
    async fn test_zonal_kind_uses_context_zone() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "id": "101", "name": "instance-1", "status": "RUNNING" },
                    { "id": "102", "name": "instance-2", "status": "STOPPED" }
                ]
            })))
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("compute-instances", client_for("compute", &server)).unwrap();
        let ctx = DescribeContext::new("test-project", "us-central1").with_zone("us-central1-a");

        let resources = describe_all(&kind, &ctx).await.unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1].description["status"], "STOPPED");
    }

    /// An empty 200 body is an empty listing
    #[tokio::test]
    async fn test_empty_body_is_empty_listing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/global/networks"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("compute-networks", client_for("compute", &server)).unwrap();
        let resources = describe_all(&kind, &DescribeContext::global("test-project"))
            .await
            .unwrap();

        assert!(resources.is_empty());
    }

    /// Pub/Sub IAM lookups keep the resource name's slashes
    #[tokio::test]
    async fn test_reserved_expansion_in_lookup_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/test-project/topics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topics": [{ "name": "projects/test-project/topics/orders" }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/test-project/topics/orders:getIamPolicy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "etag": "BwXyz" })))
            .expect(1)
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("pubsub-topics", client_for("pubsub", &server)).unwrap();
        let resources = describe_all(&kind, &DescribeContext::global("test-project"))
            .await
            .unwrap();

        assert_eq!(resources[0].description["iam_policy"]["etag"], "BwXyz");
    }
}

/// Test module for error responses
mod error_tests {
    use super::*;

    /// A failing required lookup fails the whole describe
    #[tokio::test]
    async fn test_required_lookup_500_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bigquery/v2/projects/test-project/datasets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "datasets": [
                    { "id": "test-project:sales", "datasetReference": { "datasetId": "sales" } }
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/bigquery/v2/projects/test-project/datasets/sales"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("bigquery-datasets", client_for("bigquery", &server)).unwrap();
        let err = describe_all(&kind, &DescribeContext::global("test-project"))
            .await
            .unwrap_err();

        let api = err.downcast_ref::<ApiError>().expect("should be an API error");
        assert_eq!(api.status, 500);
        assert!(api.message.is_none());
        assert_eq!(
            format_gcp_error(&err),
            "GCP service temporarily unavailable. Please try again."
        );
    }

    /// 401 on the listing call is returned with its message
    #[tokio::test]
    async fn test_401_on_listing_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/storage/v1/b"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "code": 401, "message": "Invalid credentials" }
            })))
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("storage-buckets", client_for("storage", &server)).unwrap();
        let err = describe_all(&kind, &DescribeContext::global("test-project"))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ApiError>(),
            Some(&ApiError {
                status: 401,
                message: Some("Invalid credentials".to_string()),
            })
        );
        assert!(format_gcp_error(&err).starts_with("Authentication failed"));
    }

    /// Cancelling while a request is in flight ends the describe promptly
    #[tokio::test]
    async fn test_cancel_during_slow_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/storage/v1/b"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "items": [] }))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let kind = DefinedKind::resolve("storage-buckets", client_for("storage", &server)).unwrap();
        let ctx = DescribeContext::global("test-project");
        let token = ctx.cancellation().clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let started = std::time::Instant::now();
        let err = describe_all(&kind, &ctx).await.unwrap_err();

        assert_eq!(err.downcast_ref::<DescribeError>(), Some(&DescribeError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(format_gcp_error(&err), "Interrupted.");
    }
}

/// Test module for project discovery
mod project_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_project_ids_pages_and_filters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [
                    { "projectId": "alpha-project", "projectNumber": "1", "lifecycleState": "ACTIVE" },
                    { "projectId": "old-project", "projectNumber": "2", "lifecycleState": "DELETE_REQUESTED" }
                ],
                "nextPageToken": "next"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/projects"))
            .and(query_param("pageToken", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [
                    { "projectId": "beta-project", "projectNumber": "3", "lifecycleState": "ACTIVE" }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for("cloudresourcemanager", &server);
        let ids = projects::list_project_ids(&client, &DescribeContext::global(""))
            .await
            .unwrap();

        assert_eq!(ids, vec!["alpha-project", "beta-project"]);
    }

    /// The projects kind reads billing from a second service
    #[tokio::test]
    async fn test_projects_kind_uses_lookup_service() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects"))
            .and(query_param("filter", "id:alpha-project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [
                    { "projectId": "alpha-project", "projectNumber": "1", "lifecycleState": "ACTIVE" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/alpha-project/billingInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "billingEnabled": true })))
            .mount(&server)
            .await;

        let client = GcpClient::with_token("test-token")
            .unwrap()
            .with_endpoints([("cloudresourcemanager", server.uri()), ("cloudbilling", server.uri())]);
        let kind = DefinedKind::resolve("resourcemanager-projects", client).unwrap();

        let resources = describe_all(&kind, &DescribeContext::global("alpha-project"))
            .await
            .unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].id, "1");
        assert_eq!(resources[0].name, "alpha-project");
        assert_eq!(resources[0].description["billing_info"]["billingEnabled"], true);
    }

    /// Each project's describe lists only that project, stamped with its own id
    #[tokio::test]
    async fn test_projects_kind_is_scoped_to_context_project() {
        let server = MockServer::start().await;

        for (id, number) in [("project-aaa", "11"), ("project-bbb", "22")] {
            Mock::given(method("GET"))
                .and(path("/v1/projects"))
                .and(query_param("filter", format!("id:{}", id)))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "projects": [{ "projectId": id, "projectNumber": number, "lifecycleState": "ACTIVE" }]
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = GcpClient::with_token("test-token")
            .unwrap()
            .with_endpoints([("cloudresourcemanager", server.uri()), ("cloudbilling", server.uri())]);
        let kind = DefinedKind::resolve("resourcemanager-projects", client).unwrap();

        let mut records = Vec::new();
        for project in ["project-aaa", "project-bbb"] {
            records.extend(describe_all(&kind, &DescribeContext::global(project)).await.unwrap());
        }

        let stamped: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.account_id.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(stamped, vec![("project-aaa", "project-aaa"), ("project-bbb", "project-bbb")]);
    }
}
