#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
        Router,
    };
    use blob_store::{BlobError, BlobResult, GetResult};
    use bytes::Bytes;
    use tower::ServiceExt;

    use crate::{
        http_objects::BlobFile,
        routes::{create_routes, RouteState, API_BASE},
        storage_service::StorageService,
        testing::{TestService, TEST_BUCKET},
    };

    const BOUNDARY: &str = "objectstore-test-boundary";

    fn test_router() -> Router {
        let test_service = TestService::new().expect("Failed to create test service");
        create_routes(test_service.service.route_state())
    }

    fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (field, file_name, content_type, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field, file_name
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n",
                    field
                )),
            }
            if let Some(content_type) = content_type {
                body.push_str(&format!("Content-Type: {}\r\n", content_type));
            }
            body.push_str("\r\n");
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body
    }

    fn upload_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("{}/storage", API_BASE))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(format!("{}{}", API_BASE, path))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn upload(router: &Router, name: &str, content_type: &str, content: &str) {
        let response = router
            .clone()
            .oneshot(upload_request(multipart_body(&[(
                "file",
                Some(name),
                Some(content_type),
                content,
            )])))
            .await
            .unwrap();
        assert_eq!(StatusCode::ACCEPTED, response.status());
    }

    async fn list(router: &Router) -> Vec<BlobFile> {
        let response = router
            .clone()
            .oneshot(request("GET", "/storage"))
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_list_empty_bucket() {
        let router = test_router();
        assert!(list(&router).await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_and_list() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(upload_request(multipart_body(&[(
                "file",
                Some("hello.txt"),
                Some("text/plain"),
                "hello world",
            )])))
            .await
            .unwrap();
        assert_eq!(StatusCode::ACCEPTED, response.status());
        assert_eq!(
            "hello.txt is successfully uploaded.",
            body_text(response).await
        );

        let files = list(&router).await;
        assert_eq!(1, files.len());
        let file = &files[0];
        assert_eq!("hello.txt", file.name);
        assert_eq!(TEST_BUCKET, file.bucket);
        assert_eq!("memory://test-bucket/hello.txt", file.url);
        assert_eq!("11 B", file.size);
        assert_eq!(Some("text/plain"), file.content_type.as_deref());
        assert_eq!(
            Some("sample content"),
            file.user_metadata.get("description").map(String::as_str)
        );
        assert!(chrono::DateTime::parse_from_rfc3339(&file.last_modified).is_ok());
    }

    #[tokio::test]
    async fn test_upload_returns_message_of_last_file() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(upload_request(multipart_body(&[
                ("file", Some("a.txt"), Some("text/plain"), "a"),
                ("file", Some("b.txt"), Some("text/plain"), "bb"),
            ])))
            .await
            .unwrap();
        assert_eq!(StatusCode::ACCEPTED, response.status());
        assert_eq!("b.txt is successfully uploaded.", body_text(response).await);

        let mut names: Vec<String> = list(&router).await.into_iter().map(|f| f.name).collect();
        names.sort();
        assert_eq!(vec!["a.txt", "b.txt"], names);
    }

    #[tokio::test]
    async fn test_upload_ignores_plain_form_fields() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(upload_request(multipart_body(&[(
                "comment",
                None,
                None,
                "not a file",
            )])))
            .await
            .unwrap();
        assert_eq!(StatusCode::ACCEPTED, response.status());
        assert_eq!("", body_text(response).await);
        assert!(list(&router).await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_multipart_is_rejected() {
        let router = test_router();

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("{}/storage", API_BASE))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let test_service = TestService::with_max_upload_bytes(64).unwrap();
        let router = create_routes(test_service.service.route_state());

        let content = "x".repeat(1024);
        let response = router
            .clone()
            .oneshot(upload_request(multipart_body(&[(
                "file",
                Some("big.bin"),
                Some("application/octet-stream"),
                &content,
            )])))
            .await
            .unwrap();
        assert_eq!(StatusCode::PAYLOAD_TOO_LARGE, response.status());
        assert!(list(&router).await.is_empty());
    }

    #[tokio::test]
    async fn test_download_file() {
        let router = test_router();
        upload(&router, "report.csv", "text/csv", "col1,col2\n1,2\n").await;

        let response = router
            .clone()
            .oneshot(request("GET", "/storage/report.csv"))
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());
        let headers = response.headers();
        assert_eq!("text/csv", headers[header::CONTENT_TYPE]);
        assert_eq!("14", headers[header::CONTENT_LENGTH]);
        assert_eq!(
            "form-data; name=\"attachment\"; filename=\"report.csv\"",
            headers[header::CONTENT_DISPOSITION]
        );
        assert_eq!("col1,col2\n1,2\n", body_text(response).await);
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let router = test_router();

        let response = router
            .oneshot(request("GET", "/storage/missing.txt"))
            .await
            .unwrap();
        assert_eq!(StatusCode::NOT_FOUND, response.status());
        assert_eq!(
            "missing.txt does not exist in the container",
            body_text(response).await
        );
    }

    #[tokio::test]
    async fn test_download_invalid_name() {
        let router = test_router();

        let response = router
            .oneshot(request("GET", "/storage/a%2F%2Fb"))
            .await
            .unwrap();
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let router = test_router();
        upload(&router, "old.log", "text/plain", "stale").await;

        let response = router
            .clone()
            .oneshot(request("DELETE", "/storage/old.log"))
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!("old.log is successfully deleted.", body_text(response).await);
        assert!(list(&router).await.is_empty());

        let response = router
            .clone()
            .oneshot(request("DELETE", "/storage/old.log"))
            .await
            .unwrap();
        assert_eq!(StatusCode::NOT_FOUND, response.status());
        assert_eq!(
            "old.log does not exist in the container",
            body_text(response).await
        );
    }

    /// Reports every file as present. Deletes are refused, or fail together
    /// with uploads when `fail` is set.
    struct StuckStorage {
        fail: bool,
    }

    #[async_trait]
    impl StorageService for StuckStorage {
        async fn upload_file(
            &self,
            _bytes: Bytes,
            name: &str,
            _content_type: Option<&str>,
        ) -> BlobResult<String> {
            if self.fail {
                return Err(BlobError::NetworkError {
                    source: anyhow::anyhow!("connection reset"),
                });
            }
            Ok(format!("{} is successfully uploaded.", name))
        }

        async fn delete_file(&self, _name: &str) -> BlobResult<bool> {
            if self.fail {
                Err(BlobError::NetworkError {
                    source: anyhow::anyhow!("connection reset"),
                })
            } else {
                Ok(false)
            }
        }

        async fn get_file(&self, name: &str) -> BlobResult<GetResult> {
            Err(BlobError::NotFound {
                name: name.to_string(),
            })
        }

        async fn list_files(&self) -> BlobResult<Vec<BlobFile>> {
            Err(BlobError::NetworkError {
                source: anyhow::anyhow!("connection reset"),
            })
        }

        async fn file_exists(&self, _name: &str) -> BlobResult<bool> {
            Ok(true)
        }
    }

    fn stuck_router(fail: bool) -> Router {
        let test_service = TestService::new().expect("Failed to create test service");
        create_routes(RouteState {
            storage: Arc::new(StuckStorage { fail }),
            config: test_service.service.config.clone(),
        })
    }

    #[tokio::test]
    async fn test_delete_failures_are_internal_errors() {
        for fail in [false, true] {
            let response = stuck_router(fail)
                .oneshot(request("DELETE", "/storage/pinned.bin"))
                .await
                .unwrap();
            assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());
            assert_eq!(
                "Error occurred while deleting the object: pinned.bin",
                body_text(response).await
            );
        }
    }

    #[tokio::test]
    async fn test_upload_failure_is_internal_error() {
        let response = stuck_router(true)
            .oneshot(upload_request(multipart_body(&[(
                "file",
                Some("notes.txt"),
                Some("text/plain"),
                "draft",
            )])))
            .await
            .unwrap();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());

        let response = stuck_router(false)
            .oneshot(upload_request(multipart_body(&[(
                "file",
                Some("notes.txt"),
                Some("text/plain"),
                "draft",
            )])))
            .await
            .unwrap();
        assert_eq!(StatusCode::ACCEPTED, response.status());
    }

    #[tokio::test]
    async fn test_list_failure_is_internal_error() {
        let response = stuck_router(true)
            .oneshot(request("GET", "/storage"))
            .await
            .unwrap();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());
    }

    #[tokio::test]
    async fn test_index_and_openapi() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());
        let doc: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(doc["paths"]["/objectstorage.svc/api/v1/storage/{name}"].is_object());
    }
}
