use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use blob_store::{BlobError, BlobMetadata};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

#[derive(Debug, ToSchema, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status_code: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
        }
    }

    pub fn internal_error_str(e: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("API Error: {} - {}", self.status_code, self.message);
        (self.status_code, self.message).into_response()
    }
}

impl From<BlobError> for ApiError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotFound { .. } => Self::not_found(&e.to_string()),
            BlobError::InvalidPath { .. } => Self::bad_request(&e.to_string()),
            _ => Self::internal_error_str(&e.to_string()),
        }
    }
}

/// A file stored in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlobFile {
    pub etag: Option<String>,
    pub bucket: String,
    pub name: String,
    pub url: String,
    /// Human readable size, e.g. `1.5 KB`.
    pub size: String,
    /// RFC 3339 timestamp.
    pub last_modified: String,
    pub content_type: Option<String>,
    pub user_metadata: HashMap<String, String>,
}

impl From<BlobMetadata> for BlobFile {
    fn from(metadata: BlobMetadata) -> Self {
        Self {
            etag: metadata.etag,
            bucket: metadata.bucket,
            name: metadata.name,
            url: metadata.url,
            size: readable_file_size(metadata.size_bytes),
            last_modified: metadata.last_modified.to_rfc3339(),
            content_type: metadata.content_type,
            user_metadata: metadata.user_metadata,
        }
    }
}

/// Size in the largest binary unit below it, with one optional decimal and
/// a thousands separator: `1,023 B`, `1.5 KB`, `1 MB`.
pub fn readable_file_size(size: u64) -> String {
    if size == 0 {
        return "0".to_string();
    }
    let mut digit_groups = 0;
    while digit_groups + 1 < SIZE_UNITS.len() && size >> (10 * (digit_groups + 1)) > 0 {
        digit_groups += 1;
    }
    let value = size as f64 / (1u64 << (10 * digit_groups)) as f64;
    format!("{} {}", format_decimal(value), SIZE_UNITS[digit_groups])
}

fn format_decimal(value: f64) -> String {
    let tenths = round_half_even(value * 10.0);
    let (whole, fraction) = (tenths / 10, tenths % 10);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if fraction == 0 {
        grouped
    } else {
        format!("{}.{}", grouped, fraction)
    }
}

/// Banker's rounding: exact halves go to the even neighbour.
fn round_half_even(value: f64) -> u64 {
    let floor = value.floor();
    let rounded = match value - floor {
        diff if diff > 0.5 => floor + 1.0,
        diff if diff < 0.5 => floor,
        _ if floor % 2.0 == 0.0 => floor,
        _ => floor + 1.0,
    };
    rounded as u64
}
