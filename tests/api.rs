//! HTTP-level tests against the in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use restaurant_api::{
    build_router, ensure_superuser, grant_model_permissions, Action, AdminAccount, AppState,
    Booking, MemoryStore, Menu, Repository, Resource, Store, User,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<dyn Store>,
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Value,
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

fn obj(v: Value) -> serde_json::Map<String, Value> {
    v.as_object().cloned().unwrap()
}

impl TestApp {
    async fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let admin = AdminAccount {
            username: "admin".into(),
            password: "12345".into(),
        };
        ensure_superuser(store.as_ref(), &admin).await.unwrap();
        let router = build_router(AppState::new(store.clone()), 1024 * 1024);
        TestApp { router, store }
    }

    /// Plain user holding the given permissions on model `R`.
    async fn staff<R: Resource>(&self, username: &str, actions: &[Action]) -> String {
        let users = Repository::<User>::new(self.store.clone());
        let user = users
            .create(&obj(json!({ "username": username, "password": "pw-123" })))
            .await
            .unwrap();
        grant_model_permissions::<R>(self.store.as_ref(), user.id, actions)
            .await
            .unwrap();
        basic(username, "pw-123")
    }

    async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply { status, headers, body }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "testserver");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn get(&self, uri: &str) -> Reply {
        self.call(Method::GET, uri, None, None).await
    }
}

fn admin() -> String {
    basic("admin", "12345")
}

#[tokio::test]
async fn menu_anonymous_can_read_but_not_write() {
    let app = TestApp::new().await;
    let list = app.get("/menu/").await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body, json!([]));

    let denied = app
        .call(
            Method::POST,
            "/menu/",
            None,
            Some(json!({ "Title": "Soup", "Price": "4.50", "Inventory": 10 })),
        )
        .await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.body["detail"], "Authentication credentials were not provided.");
    assert_eq!(denied.headers[header::WWW_AUTHENTICATE], "Basic realm=\"api\"");
    assert_eq!(app.get("/menu/").await.body, json!([]));
}

#[tokio::test]
async fn menu_create_needs_add_permission() {
    let app = TestApp::new().await;
    let viewer = app.staff::<Menu>("viewer", &[]).await;
    let forbidden = app
        .call(
            Method::POST,
            "/menu/",
            Some(&viewer),
            Some(json!({ "Title": "Soup", "Price": 4.5, "Inventory": 10 })),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["detail"], "You do not have permission to perform this action.");

    let chef = app.staff::<Menu>("chef", &[Action::Add]).await;
    let created = app
        .call(
            Method::POST,
            "/menu/",
            Some(&chef),
            Some(json!({ "Title": "IceCream", "Price": 12, "Inventory": 100 })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, json!({ "Title": "IceCream", "Price": "12.00", "Inventory": 100 }));

    let list = app.get("/menu/").await;
    assert_eq!(list.body, json!([{ "Title": "IceCream", "Price": "12.00", "Inventory": 100 }]));
    assert_eq!(app.get("/menu/1/").await.body["Title"], "IceCream");
}

#[tokio::test]
async fn menu_update_and_no_delete() {
    let app = TestApp::new().await;
    app.call(
        Method::POST,
        "/menu/",
        Some(&admin()),
        Some(json!({ "Title": "Pasta", "Price": "9.99", "Inventory": 5 })),
    )
    .await;

    let anon = app
        .call(Method::PATCH, "/menu/1/", None, Some(json!({ "Inventory": 3 })))
        .await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);

    let patched = app
        .call(Method::PATCH, "/menu/1/", Some(&admin()), Some(json!({ "Inventory": 3 })))
        .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body, json!({ "Title": "Pasta", "Price": "9.99", "Inventory": 3 }));
    assert_eq!(app.get("/menu/1/").await.body["Inventory"], 3);

    let put_missing = app
        .call(Method::PUT, "/menu/1/", Some(&admin()), Some(json!({ "Title": "Pasta" })))
        .await;
    assert_eq!(put_missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(put_missing.body["Price"], json!(["This field is required."]));

    let delete = app.call(Method::DELETE, "/menu/1/", Some(&admin()), None).await;
    assert_eq!(delete.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(delete.body["detail"], "Method \"DELETE\" not allowed.");
    assert_eq!(app.get("/menu/1/").await.status, StatusCode::OK);

    assert_eq!(app.get("/menu/99/").await.status, StatusCode::NOT_FOUND);
    let missing = app
        .call(Method::PUT, "/menu/99/", Some(&admin()), Some(json!({})))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn menu_validation_errors() {
    let app = TestApp::new().await;
    let bad = app
        .call(
            Method::POST,
            "/menu/",
            Some(&admin()),
            Some(json!({ "Title": "", "Price": "abc", "Inventory": "many" })),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        bad.body,
        json!({
            "Title": ["This field may not be blank."],
            "Price": ["A valid number is required."],
            "Inventory": ["A valid integer is required."]
        })
    );
    assert_eq!(app.get("/menu/").await.body, json!([]));
}

#[tokio::test]
async fn bookings_are_open_crud() {
    let app = TestApp::new().await;
    let created = app
        .call(
            Method::POST,
            "/tables/",
            None,
            Some(json!({ "Name": "John Doe", "No_of_guests": 4 })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, json!({ "id": 1, "Name": "John Doe", "No_of_guests": 4 }));

    let list = app.get("/tables/").await;
    assert_eq!(list.body, json!([{ "id": 1, "Name": "John Doe", "No_of_guests": 4 }]));

    let put = app
        .call(
            Method::PUT,
            "/tables/1/",
            None,
            Some(json!({ "Name": "Jane Doe", "No_of_guests": 2 })),
        )
        .await;
    assert_eq!(put.status, StatusCode::OK);
    assert_eq!(put.body["Name"], "Jane Doe");

    let patch = app
        .call(Method::PATCH, "/tables/1/", None, Some(json!({ "No_of_guests": 6 })))
        .await;
    assert_eq!(patch.body, json!({ "id": 1, "Name": "Jane Doe", "No_of_guests": 6 }));

    let deleted = app.call(Method::DELETE, "/tables/1/", None, None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/tables/1/").await.status, StatusCode::NOT_FOUND);
    let again = app.call(Method::DELETE, "/tables/1/", None, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_validation_and_ignored_fields() {
    let app = TestApp::new().await;
    let missing = app
        .call(Method::POST, "/tables/", None, Some(json!({ "Name": "Solo" })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body, json!({ "No_of_guests": ["This field is required."] }));

    let created = app
        .call(
            Method::POST,
            "/tables/",
            None,
            Some(json!({ "id": 50, "Name": "Group", "No_of_guests": 8, "note": "window" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, json!({ "id": 1, "Name": "Group", "No_of_guests": 8 }));
}

#[tokio::test]
async fn form_encoded_bodies_are_accepted() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tables/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("Name=John+Doe&No_of_guests=4"))
        .unwrap();
    let reply = app.send(request).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body, json!({ "id": 1, "Name": "John Doe", "No_of_guests": 4 }));
}

#[tokio::test]
async fn malformed_and_unsupported_bodies() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tables/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"Name\": "))
        .unwrap();
    let reply = app.send(request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["detail"].as_str().unwrap().starts_with("JSON parse error"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/tables/")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let reply = app.send(request).await;
    assert_eq!(reply.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(reply.body["detail"], "Unsupported media type \"text/plain\" in request.");

    let list_body = app.call(Method::POST, "/tables/", None, Some(json!([1, 2]))).await;
    assert_eq!(list_body.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        list_body.body["non_field_errors"],
        json!(["Invalid data. Expected a dictionary, but got list."])
    );
}

#[tokio::test]
async fn users_hide_password_and_need_permissions() {
    let app = TestApp::new().await;
    let anon = app
        .call(
            Method::POST,
            "/users/",
            None,
            Some(json!({ "username": "newuser", "password": "testpass123" })),
        )
        .await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);

    let created = app
        .call(
            Method::POST,
            "/users/",
            Some(&admin()),
            Some(json!({ "username": "newuser", "password": "testpass123" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, json!({ "id": 2, "username": "newuser" }));

    let users = Repository::<User>::new(app.store.clone());
    let stored = users.get(2).await.unwrap().unwrap();
    assert_ne!(stored.password, "testpass123");
    assert!(stored.check_password("testpass123"));

    let listed = app.get("/users/").await;
    assert_eq!(listed.status, StatusCode::OK);
    for user in listed.body.as_array().unwrap() {
        assert!(user.get("password").is_none());
    }

    let duplicate = app
        .call(
            Method::POST,
            "/users/",
            Some(&admin()),
            Some(json!({ "username": "newuser", "password": "other" })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        duplicate.body["username"],
        json!(["A user with that username already exists."])
    );

    let own = basic("newuser", "testpass123");
    let denied = app.call(Method::DELETE, "/users/2/", Some(&own), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let remover = app.staff::<User>("remover", &[Action::Delete]).await;
    let deleted = app.call(Method::DELETE, "/users/2/", Some(&remover), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(users.get(2).await.unwrap().is_none());
}

#[tokio::test]
async fn user_create_follows_add_permission() {
    let app = TestApp::new().await;
    let adder = app.staff::<User>("adder", &[Action::Add]).await;
    let nobody = app.staff::<User>("nobody", &[]).await;

    let created = app
        .call(
            Method::POST,
            "/users/",
            Some(&adder),
            Some(json!({ "username": "newuser", "password": "testpass123" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, json!({ "id": 4, "username": "newuser" }));

    let denied = app
        .call(
            Method::POST,
            "/users/",
            Some(&nobody),
            Some(json!({ "username": "other", "password": "testpass123" })),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["detail"], "You do not have permission to perform this action.");
    assert_eq!(app.get("/users/").await.body.as_array().unwrap().len(), 4);

    let change = app
        .call(
            Method::PATCH,
            "/users/4/",
            Some(&adder),
            Some(json!({ "username": "renamed" })),
        )
        .await;
    assert_eq!(change.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn password_whitespace_is_trimmed() {
    let app = TestApp::new().await;
    let created = app
        .call(
            Method::POST,
            "/users/",
            Some(&admin()),
            Some(json!({ "username": "spacey", "password": " p " })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let reply = app
        .call(Method::GET, "/message/", Some(&basic("spacey", "p")), None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn body_without_content_type_is_unsupported() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tables/")
        .body(Body::from(r#"{"Name":"John Doe","No_of_guests":4}"#))
        .unwrap();
    let reply = app.send(request).await;
    assert_eq!(reply.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(reply.body["detail"], "Unsupported media type \"\" in request.");
    assert_eq!(app.get("/tables/").await.body, json!([]));
}

#[tokio::test]
async fn password_change_is_hashed() {
    let app = TestApp::new().await;
    let editor = app.staff::<User>("editor", &[Action::Change]).await;
    let reply = app
        .call(
            Method::PATCH,
            "/users/2/",
            Some(&editor),
            Some(json!({ "password": "rotated" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "id": 2, "username": "editor" }));

    let users = Repository::<User>::new(app.store.clone());
    let stored = users.get(2).await.unwrap().unwrap();
    assert!(stored.check_password("rotated"));
    let reply = app.call(Method::GET, "/message/", Some(&basic("editor", "rotated")), None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn message_requires_authentication() {
    let app = TestApp::new().await;
    let anon = app.get("/message/").await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);

    let ok = app.call(Method::GET, "/message/", Some(&admin()), None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body, json!({ "message": "This view is protected" }));
}

#[tokio::test]
async fn bad_credentials_fail_even_on_open_endpoints() {
    let app = TestApp::new().await;
    let reply = app
        .call(Method::GET, "/tables/", Some(&basic("admin", "wrong")), None)
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["detail"], "Invalid username/password.");
}

#[tokio::test]
async fn options_root_and_odd_ids() {
    let app = TestApp::new().await;
    let options = app.call(Method::OPTIONS, "/menu/", None, None).await;
    assert_eq!(options.status, StatusCode::OK);
    assert_eq!(options.headers[header::ALLOW], "GET, POST, HEAD, OPTIONS");
    assert_eq!(options.body["name"], "Menu List");

    let root = app.get("/").await;
    assert_eq!(
        root.body,
        json!({ "tables": "http://testserver/tables/", "users": "http://testserver/users/" })
    );

    assert_eq!(app.get("/tables/abc/").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/health").await.body, json!({ "status": "ok" }));
    assert_eq!(app.get("/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn typed_rows_decode() {
    let app = TestApp::new().await;
    app.call(
        Method::POST,
        "/tables/",
        None,
        Some(json!({ "Name": "John Doe", "No_of_guests": 4 })),
    )
    .await;
    let bookings = Repository::<Booking>::new(app.store.clone()).all().await.unwrap();
    assert_eq!(bookings[0].name, "John Doe");
    assert_eq!(bookings[0].no_of_guests, 4);
}
