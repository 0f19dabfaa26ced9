//! Device push-token registration.
//!
//! Strictly best-effort: the caller runs this off the critical path and only
//! logs a failure. A refused registration never affects the session.

use client_core::error::ClientError;

pub async fn register_device_token(
    http: &reqwest::Client,
    base_url: &str,
    access_token: &str,
    device_token: &str,
) -> Result<(), ClientError> {
    let url = format!("{}/save-token/", base_url);

    let response = http
        .post(&url)
        .bearer_auth(access_token)
        .json(&serde_json::json!({ "token": device_token }))
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "Push token registration refused");
    }

    Ok(())
}
