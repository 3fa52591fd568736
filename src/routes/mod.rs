//! Router assembly.

mod common;
pub mod resource;

pub use common::common_routes;
pub use resource::{Operation, ViewSet};

use crate::auth::Policy;
use crate::handlers::{self, RootListing};
use crate::model::{Booking, Menu, User};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Menu items: list/create and retrieve/update/partial update. Deletion is not offered.
const MENU_OPERATIONS: &[Operation] = &[
    Operation::List,
    Operation::Create,
    Operation::Retrieve,
    Operation::Update,
    Operation::PartialUpdate,
];

/// Resource routes only, without state or middleware.
pub fn api_routes() -> Router<AppState> {
    let router = Router::new();
    let router = ViewSet::<Menu>::new(Policy::ModelPermissionsOrAnonReadOnly { model: "menu" })
        .only(MENU_OPERATIONS)
        .register(router, "menu");
    let router = ViewSet::<Booking>::new(Policy::AllowAny).register(router, "tables");
    let router = ViewSet::<User>::new(Policy::ModelPermissionsOrAnonReadOnly { model: "user" })
        .register(router, "users");
    router
        .route("/message/", get(handlers::message))
        .route(
            "/",
            get(handlers::api_root).layer(Extension(RootListing(vec!["tables", "users"]))),
        )
}

/// Full application: resources, operational routes, tracing and body limit.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    api_routes()
        .merge(common_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
