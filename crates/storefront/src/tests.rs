//! Router tests against the in-memory store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use secrecy::SecretString;
use tower::ServiceExt;

use menuboard_core::{Email, Role};

use crate::config::{StoreBackend, StorefrontConfig, default_delivery_fee};
use crate::db::{AccountStore, CatalogStore, MemoryStore};
use crate::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use crate::seed::{DEMO_MENU, SeedMenu};
use crate::state::AppState;

const TEST_SECRET: &str = "k3V9q!Lx7#Rm2@Wp5$Tz8^Hc1&Nb4*Jd6(Gf0)Ys3-Ue9+Ta2=Mo5_Vg8~Ni1%Lr4";

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        store: StoreBackend::Demo {
            admin_password: None,
        },
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from(TEST_SECRET),
        delivery_fee: default_delivery_fee(),
        compensate_partial_orders: true,
        rate_limit_auth: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A router plus the session cookie a browser would hold.
struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    async fn new() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        SeedMenu::from_yaml(DEMO_MENU)
            .unwrap()
            .apply(store.as_ref())
            .await
            .unwrap();

        let config = test_config();
        let sessions = tower_sessions::MemoryStore::default();
        let session_layer = create_session_layer(sessions, &config).unwrap();
        let state = AppState::new(config, store.clone());

        (
            Self {
                app: crate::app(state, session_layer),
                cookie: None,
            },
            store,
        )
    }

    async fn send(&mut self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().to_owned();
            if pair.starts_with(SESSION_COOKIE_NAME) {
                self.cookie = Some(pair);
            }
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.to_owned())).unwrap())
            .await
    }

    async fn register(&mut self, email: &str) {
        let form = format!(
            "email={}&password=correct-horse&password_confirm=correct-horse&name=Ana&address=Rua+das+Flores%2C+12",
            email.replace('@', "%40")
        );
        let response = self.post("/auth/register", &form).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn item_id(store: &MemoryStore, name: &str) -> String {
    store
        .list_items()
        .await
        .unwrap()
        .into_iter()
        .find(|item| item.name == name)
        .unwrap()
        .id
        .to_string()
}

#[tokio::test]
async fn test_menu_lists_active_items_only() {
    let (mut browser, _) = Browser::new().await;

    let response = browser.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("content-security-policy"));

    let body = body_text(response).await;
    assert!(body.contains("Feijoada"));
    assert!(body.contains("R$ 62,00"));
    assert!(!body.contains("Caipirinha"));
}

#[tokio::test]
async fn test_anonymous_checkout_redirects_to_login() {
    let (mut browser, _) = Browser::new().await;

    let response = browser.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Fcheckout");

    let response = browser.get("/orders").await;
    assert_eq!(location(&response), "/auth/login?next=%2Forders");
}

#[tokio::test]
async fn test_nested_admin_path_is_kept_for_login() {
    let (mut browser, _) = Browser::new().await;

    let response = browser.get("/admin/items").await;
    assert_eq!(location(&response), "/auth/login?next=%2Fadmin%2Fitems");
}

#[tokio::test]
async fn test_delivery_order_end_to_end() {
    let (mut browser, store) = Browser::new().await;
    browser.register("ana@example.com").await;

    let coxinha = item_id(&store, "Coxinha").await;
    let guarana = item_id(&store, "Guaraná").await;
    browser
        .post("/cart/add", &format!("item_id={coxinha}&quantity=2"))
        .await;
    let response = browser
        .post("/cart/add", &format!("item_id={guarana}&quantity=1"))
        .await;
    assert_eq!(location(&response), "/cart");

    let response = browser.get("/checkout?mode=delivery").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("R$ 58,50"));
    assert!(body.contains("Rua das Flores, 12"));

    let response = browser
        .post("/checkout", "mode=delivery&address=Rua+das+Flores%2C+12")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/orders?placed="));

    let body = body_text(browser.get("/orders").await).await;
    assert!(body.contains("Total: R$ 58,50"));
    assert!(body.contains("Delivery fee: R$ 15,00"));

    // The cart is gone once the order is in.
    let response = browser.get("/checkout").await;
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_delivery_without_address_is_rejected() {
    let (mut browser, store) = Browser::new().await;
    browser.register("bia@example.com").await;

    let feijoada = item_id(&store, "Feijoada").await;
    browser
        .post("/cart/add", &format!("item_id={feijoada}"))
        .await;

    let response = browser.post("/checkout", "mode=delivery&address=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was placed and the cart is intact.
    let response = browser.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_customer_is_turned_away_from_admin() {
    let (mut browser, store) = Browser::new().await;
    browser.register("caio@example.com").await;

    for path in ["/admin", "/admin/items"] {
        let response = browser.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    let before = store.list_items().await.unwrap().len();
    let response = browser
        .post("/admin/items", "name=Pastel&price=9%2C00&active=on")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let items = store.list_items().await.unwrap();
    assert_eq!(items.len(), before);
    assert!(items.iter().all(|item| item.name != "Pastel"));
}

#[tokio::test]
async fn test_promoted_account_reaches_admin_without_relogin() {
    let (mut browser, store) = Browser::new().await;
    browser.register("duda@example.com").await;

    let account = store
        .find_account_by_email(&Email::parse("duda@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    store.set_role(account.id, Role::Admin).await.unwrap();

    let response = browser.get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_store_outage_does_not_log_the_customer_out() {
    let (mut browser, store) = Browser::new().await;
    browser.register("gil@example.com").await;

    store.set_unavailable(true);
    let response = browser.get("/orders").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert!(body_text(response).await.contains("try again"));

    store.set_unavailable(false);
    let response = browser.get("/orders").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let (mut browser, _) = Browser::new().await;
    browser.register("eva@example.com").await;

    let response = browser.post("/auth/logout", "").await;
    assert_eq!(location(&response), "/");

    let response = browser.get("/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let (mut browser, _) = Browser::new().await;
    browser.register("fabi@example.com").await;
    browser.post("/auth/logout", "").await;

    let response = browser
        .post(
            "/auth/login",
            "email=fabi%40example.com&password=not-the-one",
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = browser
        .post(
            "/auth/login",
            "email=fabi%40example.com&password=correct-horse&next=%2Forders",
        )
        .await;
    assert_eq!(location(&response), "/orders");
}

#[tokio::test]
async fn test_health_endpoints() {
    let (mut browser, store) = Browser::new().await;

    let response = browser.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(browser.get("/health/ready").await.status(), StatusCode::OK);
    store.set_unavailable(true);
    assert_eq!(
        browser.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
