use super::{ActivityPoint, AlertDocument, HiveIdentity, HiveUpdate, RemoteConfig, RemoteStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize)]
struct CreatedDocument {
    id: String,
}

/// REST document store.
///
/// - `PATCH {base}/users/{user}/hives/{hive}` upserts hive fields
/// - `POST  {base}/users/{user}/hives/{hive}/activity_over_time` appends a point
/// - `POST  {base}/users/{user}/alerts` creates an alert, answering `{"id": ..}`
pub struct HttpRemoteStore {
    base_url: String,
    api_token: Option<String>,
    hive: HiveIdentity,
    http_client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig, hive: HiveIdentity) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .context("Remote store requires a base_url")?
            .trim_end_matches('/')
            .to_string();

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            api_token: config.api_token.clone(),
            hive,
            http_client,
        })
    }

    fn hive_url(&self) -> String {
        format!(
            "{}/users/{}/hives/{}",
            self.base_url, self.hive.user_id, self.hive.hive_id
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            anyhow::bail!("Remote store returned {} for {}: {}", status, what, body);
        }

        Ok(response)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn update_hive(&self, update: &HiveUpdate, activity: &ActivityPoint) -> Result<()> {
        let url = self.hive_url();
        debug!(url = %url, "Updating hive document");
        self.send(self.http_client.patch(&url).json(update), "hive update")
            .await?;

        let series_url = format!("{}/activity_over_time", url);
        self.send(self.http_client.post(&series_url).json(activity), "activity append")
            .await?;

        Ok(())
    }

    async fn create_alert(&self, alert: &AlertDocument) -> Result<String> {
        let url = format!("{}/users/{}/alerts", self.base_url, self.hive.user_id);
        let response = self
            .send(self.http_client.post(&url).json(alert), "alert create")
            .await?;

        let created: CreatedDocument = response
            .json()
            .await
            .context("Failed to parse alert create response")?;

        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::{AlertKind, AlertRecord, Severity};
    use crate::remote::{push_alert, push_hive_update};
    use chrono::Utc;

    fn store(url: String) -> HttpRemoteStore {
        let config = RemoteConfig {
            base_url: Some(url),
            api_token: Some("secret".to_string()),
            timeout_seconds: 5,
        };
        let hive = HiveIdentity {
            user_id: "user1".to_string(),
            hive_id: "hiveA".to_string(),
        };
        HttpRemoteStore::new(&config, hive).unwrap()
    }

    fn update() -> (HiveUpdate, ActivityPoint) {
        let now = Utc::now();
        (
            HiveUpdate {
                temperature: 34,
                activity: 60,
                health: 80,
                swarm_likelihood: 40,
                brood_state: 2,
                battery: 90,
                wasp_detected: None,
                wasp_verified: None,
                last_updated: now,
            },
            ActivityPoint {
                day: now,
                activity: 60,
            },
        )
    }

    #[tokio::test]
    async fn test_update_hive_patches_then_appends() {
        let mut server = mockito::Server::new_async().await;
        let patch = server
            .mock("PATCH", "/users/user1/hives/hiveA")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .create_async()
            .await;
        let append = server
            .mock("POST", "/users/user1/hives/hiveA/activity_over_time")
            .with_status(200)
            .create_async()
            .await;

        let store = store(server.url());
        let (hive_update, point) = update();

        assert!(push_hive_update(&store, &hive_update, &point).await);

        patch.assert_async().await;
        append.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_hive_server_error_is_false() {
        let mut server = mockito::Server::new_async().await;
        let patch = server
            .mock("PATCH", "/users/user1/hives/hiveA")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let store = store(server.url());
        let (hive_update, point) = update();

        assert!(!push_hive_update(&store, &hive_update, &point).await);
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_alert_returns_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users/user1/alerts")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"severity":"high","read":false,"hiveId":"hiveA"}"#.to_string(),
            ))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"alert-123"}"#)
            .create_async()
            .await;

        let store = store(server.url());
        let record = AlertRecord::new(
            AlertKind::Temperature,
            Severity::High,
            "High Temperature Alert",
            "too hot",
        );

        let id = push_alert(&store, &record, "hiveA").await;
        assert_eq!(id.as_deref(), Some("alert-123"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_store_is_none() {
        let store = store("http://127.0.0.1:9".to_string());
        let record = AlertRecord::new(AlertKind::Health, Severity::High, "Health Alert", "low");

        assert!(push_alert(&store, &record, "hiveA").await.is_none());
    }
}
