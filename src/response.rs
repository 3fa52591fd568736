//! Response helpers. Bodies are returned bare (no envelope): objects for
//! single rows, arrays for lists, `{"detail": ...}` for errors.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct DetailBody {
    pub detail: String,
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub fn detail_body(detail: impl Into<String>) -> DetailBody {
    DetailBody {
        detail: detail.into(),
    }
}
