use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use storefront_auth::{JwtClaims, Role};
use storefront_core::UserId;
use storefront_infra::InMemoryStore;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory storage, ephemeral port.
        let app = storefront_api::app::build_app(SECRET.to_string(), Arc::new(InMemoryStore::new()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let req = self.client.request(method, self.url(path));
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn create_product(&self, admin: &str, title: &str, price: i64) -> String {
        let res = self
            .request(reqwest::Method::POST, "/products", Some(admin))
            .json(&json!({ "title": title, "description": "", "price": price }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_review(&self, token: &str, product_id: &str, content: &str) -> reqwest::Response {
        self.request(reqwest::Method::POST, "/reviews", Some(token))
            .json(&json!({ "product_id": product_id, "content": content }))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt_for(user: UserId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(roles: Vec<Role>) -> String {
    mint_jwt_for(UserId::new(), roles)
}

fn admin_token() -> String {
    mint_jwt(vec![Role::ADMIN])
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn whoami_reports_anonymous_and_token_identity() {
    let srv = TestServer::spawn().await;

    let res = srv.request(reqwest::Method::GET, "/whoami", None).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
    assert!(body["user_id"].is_null());

    let user = UserId::new();
    let token = mint_jwt_for(user, vec![Role::ADMIN]);
    let res = srv
        .request(reqwest::Method::GET, "/whoami", Some(&token))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user_id"].as_str().unwrap(), user.to_string());
    assert_eq!(body["is_admin"], true);
}

#[tokio::test]
async fn bad_token_is_rejected_even_on_public_routes() {
    let srv = TestServer::spawn().await;
    let res = srv
        .request(reqwest::Method::GET, "/products", Some("not.a.jwt"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "unauthenticated");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        roles: vec![Role::ADMIN],
        issued_at: now - ChronoDuration::hours(2),
        expires_at: now - ChronoDuration::hours(1),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let res = srv
        .request(reqwest::Method::GET, "/whoami", Some(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "unauthenticated");
}

#[tokio::test]
async fn product_writes_are_admin_only() {
    let srv = TestServer::spawn().await;
    let body = json!({ "title": "Kettle", "price": 2500 });

    let res = srv
        .request(reqwest::Method::POST, "/products", None)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "unauthenticated");

    let res = srv
        .request(reqwest::Method::POST, "/products", Some(&mint_jwt(vec![])))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "forbidden");

    let res = srv
        .request(reqwest::Method::POST, "/products", Some(&admin_token()))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn anonymous_listing_filters_searches_and_orders() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    srv.create_product(&admin, "Kettle", 2500).await;
    srv.create_product(&admin, "Mug", 800).await;
    srv.create_product(&admin, "Teapot", 3000).await;

    let res = srv
        .request(
            reqwest::Method::GET,
            "/products?price_from=800&price_to=2500&ordering=-price",
            None,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let items: Vec<Value> = res.json().await.unwrap();
    let titles: Vec<&str> = items.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["Kettle", "Mug"]);
    assert!(items[0].get("description").is_none());

    let res = srv
        .request(reqwest::Method::GET, "/products?search=TEA", None)
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = res.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Teapot");

    let res = srv
        .request(reqwest::Method::GET, "/products?search=pot%20TEA", None)
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = res.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Teapot");

    let res = srv
        .request(reqwest::Method::GET, "/products?search=kettle,mug", None)
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = res.json().await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn product_validation_and_partial_update() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();

    let res = srv
        .request(reqwest::Method::POST, "/products", Some(&admin))
        .json(&json!({ "title": "   ", "price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .request(reqwest::Method::POST, "/products", Some(&admin))
        .json(&json!({ "title": "Mug", "price": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let id = srv.create_product(&admin, "Mug", 800).await;
    let res = srv
        .request(reqwest::Method::PATCH, &format!("/products/{id}"), Some(&admin))
        .json(&json!({ "price": 900 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "Mug");
    assert_eq!(body["price"], 900);

    let res = srv
        .request(reqwest::Method::GET, "/products/not-a-uuid", None)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_id");
}

#[tokio::test]
async fn malformed_ids_are_checked_after_access_policy() {
    let srv = TestServer::spawn().await;

    let res = srv
        .request(reqwest::Method::DELETE, "/products/not-a-uuid", None)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "unauthenticated");

    let res = srv
        .request(reqwest::Method::DELETE, "/products/not-a-uuid", Some(&mint_jwt(vec![])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .request(reqwest::Method::DELETE, "/products/not-a-uuid", Some(&admin_token()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_id");

    let res = srv
        .request(reqwest::Method::POST, "/reviews", None)
        .json(&json!({ "product_id": "x", "content": "nice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .request(reqwest::Method::PATCH, "/reviews/x", None)
        .json(&json!({ "content": "edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .request(reqwest::Method::POST, "/orders", None)
        .json(&json!({ "items": [{ "product_id": "x", "quantity": 1 }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .request(reqwest::Method::GET, "/orders/x", None)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejected_bodies_and_queries_use_the_json_error_shape() {
    let srv = TestServer::spawn().await;

    let res = srv
        .request(reqwest::Method::GET, "/products?price_from=abc", None)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_query");
    assert!(err["message"].is_string());

    let res = srv
        .request(reqwest::Method::POST, "/products", Some(&admin_token()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_body");

    let res = srv
        .request(reqwest::Method::POST, "/products", Some(&admin_token()))
        .json(&json!({ "title": "Kettle" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_body");
}

#[tokio::test]
async fn anonymous_caller_sees_every_review_of_a_product() {
    let srv = TestServer::spawn().await;
    let product = srv.create_product(&admin_token(), "Kettle", 2500).await;
    let other = srv.create_product(&admin_token(), "Mug", 800).await;

    for content in ["first", "second", "third"] {
        let res = srv.create_review(&mint_jwt(vec![]), &product, content).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }
    srv.create_review(&mint_jwt(vec![]), &other, "elsewhere").await;

    let res = srv
        .request(reqwest::Method::GET, &format!("/products/{product}/reviews"), None)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reviews: Vec<Value> = res.json().await.unwrap();
    let contents: Vec<&str> = reviews.iter().map(|r| r["content"].as_str().unwrap()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
    assert!(reviews.iter().all(|r| r["product_id"] == product.as_str()));

    let res = srv
        .request(reqwest::Method::GET, &format!("/products/{product}"), None)
        .send()
        .await
        .unwrap();
    let detail: Value = res.json().await.unwrap();
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn reviews_of_missing_product_is_not_found() {
    let srv = TestServer::spawn().await;
    let missing = UserId::new().to_string();

    let res = srv
        .request(reqwest::Method::GET, &format!("/products/{missing}/reviews"), None)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.create_review(&mint_jwt(vec![]), &missing, "hello").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_mutation_requires_author_or_admin() {
    let srv = TestServer::spawn().await;
    let product = srv.create_product(&admin_token(), "Kettle", 2500).await;
    let author = UserId::new();
    let author_token = mint_jwt_for(author, vec![]);

    let anon = srv
        .request(reqwest::Method::POST, "/reviews", None)
        .json(&json!({ "product_id": product, "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anon.status(), StatusCode::UNAUTHORIZED);

    let res = srv.create_review(&author_token, &product, "good").await;
    let review: Value = res.json().await.unwrap();
    assert_eq!(review["author_id"].as_str().unwrap(), author.to_string());
    let path = format!("/reviews/{}", review["id"].as_str().unwrap());

    let cases = [
        (None, StatusCode::UNAUTHORIZED),
        (Some(mint_jwt(vec![])), StatusCode::FORBIDDEN),
        (Some(author_token.clone()), StatusCode::OK),
        (Some(admin_token()), StatusCode::OK),
    ];
    for (token, expected) in cases {
        let res = srv
            .request(reqwest::Method::PUT, &path, token.as_deref())
            .json(&json!({ "content": "edited" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected, "token={token:?}");
    }

    let res = srv
        .request(reqwest::Method::DELETE, &path, Some(&mint_jwt(vec![])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .request(reqwest::Method::DELETE, &path, Some(&author_token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.request(reqwest::Method::GET, &path, None).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ordered_product_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let product = srv.create_product(&admin, "Kettle", 2500).await;

    let res = srv
        .request(reqwest::Method::POST, "/orders", Some(&mint_jwt(vec![])))
        .json(&json!({ "items": [{ "product_id": product, "quantity": 2 }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["status"], "open");

    let res = srv
        .request(reqwest::Method::DELETE, &format!("/products/{product}"), Some(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "integrity_violation");

    let res = srv
        .request(reqwest::Method::GET, &format!("/products/{product}"), None)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Once the order is gone the product can be removed.
    let order_path = format!("/orders/{}", order["id"].as_str().unwrap());
    let res = srv
        .request(reqwest::Method::DELETE, &order_path, Some(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv
        .request(reqwest::Method::DELETE, &format!("/products/{product}"), Some(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn order_status_changes_are_validated_and_admin_only() {
    let srv = TestServer::spawn().await;
    let admin = admin_token();
    let product = srv.create_product(&admin, "Kettle", 2500).await;
    let owner = mint_jwt(vec![]);

    let res = srv
        .request(reqwest::Method::POST, "/orders", Some(&owner))
        .json(&json!({ "items": [{ "product_id": product, "quantity": 1 }] }))
        .send()
        .await
        .unwrap();
    let order: Value = res.json().await.unwrap();
    let path = format!("/orders/{}", order["id"].as_str().unwrap());

    let res = srv
        .request(reqwest::Method::PATCH, &path, Some(&owner))
        .json(&json!({ "status": "finished" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .request(reqwest::Method::PATCH, &path, Some(&admin))
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .request(reqwest::Method::PATCH, &path, Some(&admin))
        .json(&json!({ "status": "in_progress" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "in_progress");

    let res = srv
        .request(reqwest::Method::GET, &path, Some(&mint_jwt(vec![])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.request(reqwest::Method::GET, "/orders", None).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn orders_reject_empty_or_unknown_items() {
    let srv = TestServer::spawn().await;
    let user = mint_jwt(vec![]);

    let res = srv
        .request(reqwest::Method::POST, "/orders", Some(&user))
        .json(&json!({ "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .request(reqwest::Method::POST, "/orders", Some(&user))
        .json(&json!({ "items": [{ "product_id": UserId::new().to_string(), "quantity": 1 }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
