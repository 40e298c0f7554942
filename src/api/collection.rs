//! The request gateway: single authenticated call path to the collection
//! server.

use super::*;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const PING_URL: &str = "api/ping";
const REGISTER_URL: &str = "api/agents/register";
const HEARTBEAT_URL: &str = "api/agents/heartbeat";
const SCREENSHOT_URL: &str = "api/screenshots";
const TIMER_START_URL: &str = "api/timer/start";
const TIMER_STOP_URL: &str = "api/timer/stop";
const TIMER_STATUS_URL: &str = "api/timer/status";
const TIMER_IDLE_URL: &str = "api/timer/idle";
const APP_USAGE_URL: &str = "api/app-usage";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Gateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Gateway {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// On-demand reachability check. Any HTTP response counts as reachable;
    /// only a transport-level failure does not.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/{}", self.base_url, PING_URL);
        self.client.get(url).send().await.is_ok()
    }

    /// Registers this device and returns the issued session. Unauthenticated.
    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<RegisterResponse> {
        self.post(REGISTER_URL, req).await
    }

    pub async fn heartbeat(&self, req: &HeartbeatRequest) -> ApiResult<HeartbeatResponse> {
        self.post(HEARTBEAT_URL, req).await
    }

    pub async fn upload_screenshot(&self, req: &ScreenshotRequest) -> ApiResult<()> {
        self.post_ack(SCREENSHOT_URL, req).await
    }

    pub async fn timer_start(&self, req: &TimerStartRequest) -> ApiResult<TimerStartResponse> {
        self.post(TIMER_START_URL, req).await
    }

    pub async fn timer_stop(&self) -> ApiResult<TimerStopResponse> {
        self.post(TIMER_STOP_URL, &serde_json::json!({})).await
    }

    pub async fn timer_status(&self) -> ApiResult<TimerStatusResponse> {
        let url = format!("{}/{}", self.base_url, TIMER_STATUS_URL);
        let res = self
            .client
            .get(url)
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(transport)?;
        Self::decode(res).await
    }

    pub async fn report_idle(&self, req: &IdleReportRequest) -> ApiResult<()> {
        self.post_ack(TIMER_IDLE_URL, req).await
    }

    pub async fn report_app_usage(&self, req: &AppUsageRequest) -> ApiResult<AppUsageResponse> {
        self.post(APP_USAGE_URL, req).await
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    async fn post<B: serde::Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<R> {
        let url = format!("{}/{}", self.base_url, path);
        let res = self
            .client
            .post(url)
            .headers(self.auth_headers())
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(res).await
    }

    /// POST where the server replies with a bare acknowledgment.
    async fn post_ack<B: serde::Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let url = format!("{}/{}", self.base_url, path);
        let res = self
            .client
            .post(url)
            .headers(self.auth_headers())
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        Self::check_status(&res)?;
        Ok(())
    }

    fn check_status(res: &reqwest::Response) -> ApiResult<()> {
        match res.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(ApiError::Auth),
            s => Err(ApiError::Validation {
                status: s.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn decode<R: DeserializeOwned>(res: reqwest::Response) -> ApiResult<R> {
        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth);
        }
        let body = res.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ApiError::Validation {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Validation {
            status: status.as_u16(),
            body: e.to_string(),
        })
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Connectivity(e.to_string())
}
