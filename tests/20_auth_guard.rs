mod common;

use anyhow::Result;
use reqwest::StatusCode;

use liftops_api::policy::Role;

#[tokio::test]
async fn protected_route_without_token_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/customers", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "MISSING_TOKEN");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_401_invalid() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/buildings", server.base_url))
        .bearer_auth("definitely.not.a-token")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_401_missing() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/tickets", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "MISSING_TOKEN");
    Ok(())
}

#[tokio::test]
async fn customer_role_is_403_on_back_office_resources() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::token_for(Role::Customer, Some(uuid::Uuid::new_v4()));

    // the role guard runs before any database access, so these are
    // deterministic even with the store down
    for path in [
        "/api/pricing-settings",
        "/api/parts",
        "/api/alerts",
        "/api/dashboard/summary",
    ] {
        let res = client
            .get(format!("{}{}", server.base_url, path))
            .bearer_auth(&token)
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::FORBIDDEN, "expected 403 on {}", path);
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["code"], "FORBIDDEN");
    }
    Ok(())
}

#[tokio::test]
async fn technician_role_is_403_on_financials() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::token_for(Role::Technician, None);

    for path in ["/api/contracts", "/api/invoices", "/api/customers"] {
        let res = client
            .get(format!("{}{}", server.base_url, path))
            .bearer_auth(&token)
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::FORBIDDEN, "expected 403 on {}", path);
    }
    Ok(())
}

#[tokio::test]
async fn admin_passes_the_guard_and_reaches_the_store() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::token_for(Role::Admin, None);

    let res = client
        .get(format!("{}/api/customers", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;

    // guard cleared; the only failure left is the unreachable test store
    assert!(
        res.status().is_server_error(),
        "expected a store-level failure, got {}",
        res.status()
    );
    Ok(())
}

#[tokio::test]
async fn expired_token_is_401() -> Result<()> {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let now = Utc::now();
    let claims = liftops_api::auth::Claims {
        sub: uuid::Uuid::new_v4(),
        email: "old@example.com".to_string(),
        name: "Old".to_string(),
        role: Role::Admin,
        customer_id: None,
        iat: (now - Duration::hours(10)).timestamp(),
        exp: (now - Duration::hours(2)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(common::JWT_SECRET.as_bytes()),
    )?;

    let res = client
        .get(format!("{}/api/customers", server.base_url))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "INVALID_TOKEN");
    Ok(())
}
