//! Sign-in, sign-up and token refresh calls

use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::error;

use super::{LoginRequest, RegisterRequest};
use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{AuthResponse, RefreshResponse};

pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<AuthResponse> {
    let body = json!({
        "email": request.email,
        "password": request.password.expose_secret(),
    });

    let http = client
        .request(Method::POST, &client.config().login_path)
        .json(&body);

    client.send_json(http, "login").await.map_err(|e| {
        error!("Login failed for {}: {}", request.email, e);
        e
    })
}

pub async fn register(client: &ApiClient, request: &RegisterRequest) -> Result<AuthResponse> {
    let body = json!({
        "email": request.email,
        "nickname": request.nickname,
        "password": request.password.expose_secret(),
        "passwordConfirmation": request.password_confirmation.expose_secret(),
    });

    let http = client
        .request(Method::POST, &client.config().register_path)
        .json(&body);

    client.send_json(http, "register").await.map_err(|e| {
        error!("Registration failed for {}: {}", request.email, e);
        e
    })
}

pub async fn refresh_token(client: &ApiClient, refresh_token: &str) -> Result<RefreshResponse> {
    let http = client
        .request(Method::POST, &client.config().refresh_path)
        .json(&json!({ "refreshToken": refresh_token }));

    client.send_json(http, "refresh token").await.map_err(|e| {
        error!("Token refresh failed: {}", e);
        e
    })
}
