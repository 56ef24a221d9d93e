use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        Method,
        StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json,
    Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::ServerConfig,
    http_objects::{ApiError, BlobFile},
    middleware::InstanceRequestSpan,
    storage_service::StorageService,
};

pub const API_BASE: &str = "/objectstorage.svc/api/v1";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Bytes escaped in an RFC 5987 `attr-char` value.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(OpenApi)]
#[openapi(
        paths(
            list_files,
            upload_file,
            download_file,
            delete_file,
        ),
        components(
            schemas(
                BlobFile,
                ApiError,
            )
        ),
        tags(
            (name = "storage", description = "Object storage API")
        )
    )]
pub struct ApiDoc;

#[derive(Clone)]
pub struct RouteState {
    pub storage: Arc<dyn StorageService>,
    pub config: Arc<ServerConfig>,
}

pub fn create_routes(route_state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(Any)
        .allow_headers(Any);
    let request_span = InstanceRequestSpan::new(
        &route_state.config.env,
        &route_state.config.instance_id(),
    );
    let max_upload_bytes = route_state.config.max_upload_bytes;

    let storage_routes = Router::new()
        .route("/storage", get(list_files).post(upload_file))
        .route("/storage/{name}", get(download_file).delete(delete_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(route_state);

    Router::new()
        .merge(SwaggerUi::new("/docs/swagger").url("/docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(index))
        .nest(API_BASE, storage_routes)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(cors)
}

async fn index() -> &'static str {
    "Object storage service"
}

#[allow(dead_code)]
#[derive(ToSchema)]
struct UploadFile {
    #[schema(format = "binary")]
    file: String,
}

/// List the files in the bucket
#[utoipa::path(
    get,
    path = "/objectstorage.svc/api/v1/storage",
    tag = "storage",
    responses(
        (status = 200, description = "Files in the bucket", body = Vec<BlobFile>),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
async fn list_files(State(state): State<RouteState>) -> Result<Json<Vec<BlobFile>>, ApiError> {
    let files = state.storage.list_files().await?;
    Ok(Json(files))
}

/// Upload files
///
/// Every part with a file name is stored under that name.
#[utoipa::path(
    post,
    path = "/objectstorage.svc/api/v1/storage",
    tag = "storage",
    request_body(content_type = "multipart/form-data", content = inline(UploadFile)),
    responses(
        (status = 202, description = "Upload message of the last stored file", body = String),
        (status = BAD_REQUEST, description = "Malformed multipart request"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
async fn upload_file(
    State(state): State<RouteState>,
    mut files: Multipart,
) -> Result<(StatusCode, String), ApiError> {
    let mut message = String::new();
    while let Some(field) = files
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), &e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!(field = ?field.name(), "skipping form field");
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), &e.body_text()))?;
        message = state
            .storage
            .upload_file(bytes, &file_name, content_type.as_deref())
            .await?;
    }
    Ok((StatusCode::ACCEPTED, message))
}

/// Download a file
#[utoipa::path(
    get,
    path = "/objectstorage.svc/api/v1/storage/{name}",
    tag = "storage",
    params(
        ("name" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = NOT_FOUND, description = "File does not exist"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
async fn download_file(
    Path(name): Path<String>,
    State(state): State<RouteState>,
) -> Result<Response<Body>, ApiError> {
    if !state.storage.file_exists(&name).await? {
        return Err(not_in_container(&name));
    }
    let file = state.storage.get_file(&name).await?;
    let content_type = file
        .metadata
        .content_type
        .clone()
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    Response::builder()
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, file.metadata.size_bytes)
        .header(CONTENT_DISPOSITION, content_disposition(&name))
        .body(Body::from_stream(file.stream))
        .map_err(|e| ApiError::internal_error_str(&e.to_string()))
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/objectstorage.svc/api/v1/storage/{name}",
    tag = "storage",
    params(
        ("name" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File deleted", body = String),
        (status = NOT_FOUND, description = "File does not exist"),
        (status = INTERNAL_SERVER_ERROR, description = "File could not be deleted")
    ),
)]
async fn delete_file(
    Path(name): Path<String>,
    State(state): State<RouteState>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.storage.file_exists(&name).await? {
        return Err(not_in_container(&name));
    }
    match state.storage.delete_file(&name).await {
        Ok(true) => Ok((StatusCode::OK, format!("{} is successfully deleted.", name))),
        Ok(false) => Err(delete_failed(&name)),
        Err(e) => {
            error!("error occurred while deleting the object {}: {}", name, e);
            Err(delete_failed(&name))
        }
    }
}

fn not_in_container(name: &str) -> ApiError {
    ApiError::not_found(&format!("{} does not exist in the container", name))
}

fn delete_failed(name: &str) -> ApiError {
    ApiError::internal_error_str(&format!(
        "Error occurred while deleting the object: {}",
        name
    ))
}

/// `form-data` disposition with the file name as `attachment`. Non ASCII
/// names go into the RFC 5987 `filename*` parameter.
fn content_disposition(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("form-data; name=\"attachment\"; filename=\"{}\"", escaped);
    }
    format!(
        "form-data; name=\"attachment\"; filename*=UTF-8''{}",
        utf8_percent_encode(name, ATTR_CHAR)
    )
}
