//! API root: absolute URLs of the router-registered resources.

use axum::{
    http::{header, HeaderMap},
    Extension, Json,
};
use serde_json::{Map, Value};

/// Resource prefixes listed by the root view, in registration order.
#[derive(Clone, Debug, Default)]
pub struct RootListing(pub Vec<&'static str>);

pub async fn api_root(
    Extension(listing): Extension<RootListing>,
    headers: HeaderMap,
) -> Json<Value> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let mut out = Map::new();
    for prefix in &listing.0 {
        let url = format!("http://{}/{}/", host, prefix);
        out.insert(prefix.to_string(), Value::String(url));
    }
    Json(Value::Object(out))
}
