#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use psyform_api::config::AppConfig;
use psyform_api::database::MemoryRepository;
use psyform_api::{app, AppState};

/// An in-process server over a fresh in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let state = AppState::new(AppConfig::development(), Arc::new(MemoryRepository::new()));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self { port, base_url, client: reqwest::Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers an account and returns `(token, user)`
    pub async fn register(&self, username: &str, role: &str) -> Result<(String, Value)> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "password": "senha123",
                "name": format!("{} name", username),
                "email": format!("{}@example.com", username),
                "role": role
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register {} failed: {}", username, res.status());

        let body: Value = res.json().await?;
        let token = body["data"]["access_token"]
            .as_str()
            .context("missing access_token")?
            .to_string();
        Ok((token, body["data"]["user"].clone()))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        read(res).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.post(self.url(path)).bearer_auth(token).json(&body).send().await?;
        read(res).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.put(self.url(path)).bearer_auth(token).json(&body).send().await?;
        read(res).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await?;
        read(res).await
    }

    /// Creates a form with the given question texts and returns its id
    pub async fn create_form(&self, token: &str, title: &str, questions: &[&str], assigned: &[&str]) -> Result<String> {
        let questions: Vec<Value> = questions.iter().map(|q| json!({ "text": q })).collect();
        let (status, body) = self
            .post(
                "/forms",
                token,
                json!({ "title": title, "questions": questions, "assignedPatientIds": assigned }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create form failed: {} {}", status, body);
        Ok(body["data"]["id"].as_str().context("missing form id")?.to_string())
    }
}

/// Status plus JSON body; 204 yields `Value::Null`
async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let text = res.text().await?;
    let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
    Ok((status, body))
}
