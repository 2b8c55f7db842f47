use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::JobClient;
use crate::error::{Error, Result};
use crate::models::{JobResult, JobStatus, ResultPayload, StartAck, StartParams};

const START_PATH: &str = "/simulacion/start";
const STATUS_PATH: &str = "/simulacion/status";
const RESULT_PATH: &str = "/simulacion/result";

/// Control endpoints that only acknowledge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    Stop,
    Restore,
}

impl Control {
    fn path(self) -> &'static str {
        match self {
            Control::Pause => "/simulacion/pause",
            Control::Resume => "/simulacion/resume",
            Control::Stop => "/simulacion/stop",
            Control::Restore => "/simulacion/restore",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Control::Pause => "pause",
            Control::Resume => "resume",
            Control::Stop => "stop",
            Control::Restore => "restore",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct StartResponse {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    corrida_id: Option<Value>,
}

/// JSON-over-HTTP client for the simulation service.
#[derive(Clone, Debug)]
pub struct HttpJobClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpJobClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let host = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"));
        if host.map_or(true, str::is_empty) {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::transport(trimmed, err))?;
        Ok(Self {
            base_url: trimmed.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn control(&self, control: Control) -> Result<()> {
        let url = self.url(control.path());
        debug!(%url, "sending control request");
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|err| Error::transport(&url, err))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Http {
            url,
            status: status.as_u16(),
            body,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, url: &str) -> Result<(StatusCode, String)> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| Error::transport(url, err))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| Error::transport(url, err))?;
        Ok((status, body))
    }
}

#[async_trait]
impl JobClient for HttpJobClient {
    async fn start(&self, params: &StartParams) -> Result<StartAck> {
        let url = self.url(START_PATH);
        debug!(%url, "requesting simulation start");
        let resp = self
            .http
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|err| Error::transport(&url, err))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| Error::transport(&url, err))?;
        let parsed: StartResponse = serde_json::from_str(&body).unwrap_or_default();

        // Any 2xx acknowledges the start; the body may or may not carry a run id.
        if status.is_success() {
            let run_id = parsed.corrida_id.and_then(|id| match id {
                Value::String(text) => Some(text),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            });
            return Ok(StartAck::Started { run_id });
        }
        if status == StatusCode::CONFLICT && parsed.reason.as_deref() == Some("already_running") {
            return Ok(StartAck::AlreadyRunning);
        }
        Ok(StartAck::Rejected(format!(
            "HTTP {} - {}",
            status.as_u16(),
            body.trim()
        )))
    }

    async fn status(&self) -> Result<JobStatus> {
        let url = self.url(STATUS_PATH);
        let (status, body) = self.get_text(&url).await?;
        if !status.is_success() {
            return Err(Error::Http {
                url,
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|err| Error::decode(&url, err))
    }

    async fn result(&self) -> Result<JobResult> {
        let url = self.url(RESULT_PATH);
        let (status, body) = self.get_text(&url).await?;
        if status == StatusCode::ACCEPTED {
            return Ok(JobResult::Pending);
        }
        if !status.is_success() {
            return Ok(JobResult::Error(format!(
                "HTTP {} - {}",
                status.as_u16(),
                body.trim()
            )));
        }
        let payload: ResultPayload =
            serde_json::from_str(&body).map_err(|err| Error::decode(&url, err))?;
        Ok(JobResult::Ready(payload))
    }
}
