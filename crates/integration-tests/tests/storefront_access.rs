//! Integration tests for login, logout and role gates.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront running with `MENUBOARD_RATE_LIMIT_AUTH=false`

#![allow(clippy::unwrap_used)]

use menuboard_integration_tests::{
    TEST_PASSWORD, browser, location, register, storefront_base_url, unique_email,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health_endpoints() {
    let client = browser();
    let base_url = storefront_base_url();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(format!("{base_url}/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_protected_pages_redirect_to_login() {
    let client = browser();
    let base_url = storefront_base_url();

    for (path, expected) in [
        ("/checkout", "/auth/login?next=%2Fcheckout"),
        ("/orders", "/auth/login?next=%2Forders"),
        ("/admin", "/auth/login?next=%2Fadmin"),
    ] {
        let resp = client.get(format!("{base_url}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), expected);
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_customer_cannot_manage_catalog() {
    let client = browser();
    let base_url = storefront_base_url();
    register(&client, &unique_email("customer")).await;

    let resp = client.get(format!("{base_url}/admin/items")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let resp = client
        .post(format!("{base_url}/admin/categories"))
        .form(&[("name", "Hacked"), ("description", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_login_logout_cycle() {
    let email = unique_email("cycle");
    let base_url = storefront_base_url();

    let first = browser();
    register(&first, &email).await;
    let resp = first
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");
    let resp = first.get(format!("{base_url}/orders")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let second = browser();
    let resp = second
        .post(format!("{base_url}/auth/login"))
        .form(&[("email", email.as_str()), ("password", "wrong-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = second
        .post(format!("{base_url}/auth/login"))
        .form(&[
            ("email", email.as_str()),
            ("password", TEST_PASSWORD),
            ("next", "/orders"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/orders");

    let resp = second.get(format!("{base_url}/orders")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_duplicate_registration_conflicts() {
    let email = unique_email("dupe");
    register(&browser(), &email).await;

    let resp = browser()
        .post(format!("{}/auth/register", storefront_base_url()))
        .form(&[
            ("email", email.as_str()),
            ("password", TEST_PASSWORD),
            ("password_confirm", TEST_PASSWORD),
            ("name", "Again"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
