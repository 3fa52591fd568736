//! Route factory for one resource: a collection path and a detail path,
//! each serving only the configured operations.

use crate::auth::Policy;
use crate::handlers::resource::{self, View};
use crate::model::Resource;
use crate::state::AppState;
use axum::{routing::MethodRouter, Extension, Router};
use std::marker::PhantomData;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Retrieve,
    Update,
    PartialUpdate,
    Destroy,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::List,
        Operation::Create,
        Operation::Retrieve,
        Operation::Update,
        Operation::PartialUpdate,
        Operation::Destroy,
    ];

    fn method(&self) -> &'static str {
        match self {
            Operation::List | Operation::Retrieve => "GET",
            Operation::Create => "POST",
            Operation::Update => "PUT",
            Operation::PartialUpdate => "PATCH",
            Operation::Destroy => "DELETE",
        }
    }

    fn on_collection(&self) -> bool {
        matches!(self, Operation::List | Operation::Create)
    }
}

pub struct ViewSet<R> {
    policy: Policy,
    operations: &'static [Operation],
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> ViewSet<R> {
    /// All six operations under `policy`.
    pub fn new(policy: Policy) -> Self {
        ViewSet {
            policy,
            operations: Operation::ALL,
            _marker: PhantomData,
        }
    }

    pub fn only(mut self, operations: &'static [Operation]) -> Self {
        self.operations = operations;
        self
    }

    fn has(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    fn view(&self, collection: bool) -> View {
        let mut methods: Vec<&str> = self
            .operations
            .iter()
            .filter(|op| op.on_collection() == collection)
            .map(Operation::method)
            .collect();
        methods.dedup();
        if methods.contains(&"GET") {
            methods.push("HEAD");
        }
        methods.push("OPTIONS");
        let suffix = if collection { "List" } else { "Instance" };
        View {
            policy: self.policy,
            allow: methods.join(", "),
            name: format!("{} {}", R::NAME, suffix),
        }
    }

    /// `GET` list and `POST` create.
    pub fn collection(&self) -> MethodRouter<AppState> {
        let mut route = MethodRouter::new().options(resource::options);
        if self.has(Operation::List) {
            route = route.get(resource::list::<R>);
        }
        if self.has(Operation::Create) {
            route = route.post(resource::create::<R>);
        }
        route
            .fallback(resource::method_not_allowed)
            .layer(Extension(self.view(true)))
    }

    /// `GET`, `PUT`, `PATCH`, `DELETE` on one row.
    pub fn detail(&self) -> MethodRouter<AppState> {
        let mut route = MethodRouter::new().options(resource::options);
        if self.has(Operation::Retrieve) {
            route = route.get(resource::retrieve::<R>);
        }
        if self.has(Operation::Update) {
            route = route.put(resource::update::<R>);
        }
        if self.has(Operation::PartialUpdate) {
            route = route.patch(resource::partial_update::<R>);
        }
        if self.has(Operation::Destroy) {
            route = route.delete(resource::destroy::<R>);
        }
        route
            .fallback(resource::method_not_allowed)
            .layer(Extension(self.view(false)))
    }

    /// Mount `/<prefix>/` and `/<prefix>/:id/`.
    pub fn register(self, router: Router<AppState>, prefix: &str) -> Router<AppState> {
        router
            .route(&format!("/{}/", prefix), self.collection())
            .route(&format!("/{}/:id/", prefix), self.detail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Menu;

    #[test]
    fn allow_header_reflects_operations() {
        let menu = ViewSet::<Menu>::new(Policy::AllowAny).only(&[
            Operation::List,
            Operation::Create,
            Operation::Retrieve,
            Operation::Update,
            Operation::PartialUpdate,
        ]);
        assert_eq!(menu.view(true).allow, "GET, POST, HEAD, OPTIONS");
        assert_eq!(menu.view(false).allow, "GET, PUT, PATCH, HEAD, OPTIONS");
        assert_eq!(menu.view(false).name, "Menu Instance");
    }
}
