//! Auth endpoints and session token lifecycle.

use gloo_net::http::Request;
use serde::Deserialize;

use dandori_types::course::{Credentials, UserProfile};
use dandori_types::Result;

use crate::http::{self, DandoriApi};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl DandoriApi {
    /// Log in and persist the session token on success
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let response: LoginResponse =
            http::send_json_body(Request::post(&self.url("/api/auth/login")), credentials).await?;
        http::store_token(&response.token);
        Ok(response)
    }

    pub async fn signup(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let response: LoginResponse =
            http::send_json_body(Request::post(&self.url("/api/auth/signup")), credentials)
                .await?;
        http::store_token(&response.token);
        Ok(response)
    }

    pub async fn logout(&self) -> Result<()> {
        let _: serde_json::Value =
            http::send_json_body(Request::post(&self.url("/api/auth/logout")), &()).await?;
        http::clear_token();
        Ok(())
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        http::send_json(Request::get(&self.url("/api/auth/profile"))).await
    }

    pub async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        http::send_json_body(Request::put(&self.url("/api/auth/profile")), profile).await
    }

    pub fn is_authenticated(&self) -> bool {
        http::stored_token().is_some()
    }
}
