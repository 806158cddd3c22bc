use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use sitegen_core::api::{BackendConfig, TaskReport, TaskReporter, TaskSource};

const BODY_PREVIEW_LIMIT: usize = 512;
const WORKER_NAME_HEADER: &str = "x-worker-name";

/// Failure talking to the task backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendHttpError {
    /// No complete response came back, e.g. a timeout or a refused connection.
    #[error("backend request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("backend sent a task payload that is not JSON ({url}): {source} | body={body}")]
    Payload {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BackendHttpError {
    fn transport(url: &str) -> impl FnOnce(reqwest::Error) -> Self + '_ {
        move |source| Self::Transport {
            url: url.to_string(),
            source,
        }
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().nth(BODY_PREVIEW_LIMIT).is_some() {
        out.push_str("...");
    }
    out
}

/// Wire shape of a status report: the report itself plus the worker identity.
#[derive(Serialize)]
struct ReportBody<'a> {
    #[serde(flatten)]
    report: &'a TaskReport,
    hostname: &'a str,
}

/// Task source and reporter backed by the task backend's HTTP API.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    secret: String,
    hostname: String,
    url_task: String,
    url_report: String,
}

impl HttpBackend {
    pub fn new(cfg: &BackendConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()?;
        let base = cfg.url.trim().trim_end_matches('/');
        let route = cfg.task_path.trim().trim_matches('/');
        let url_task = format!("{base}/{route}");
        Ok(Self {
            http,
            secret: cfg.secret.clone(),
            hostname: cfg.hostname.clone(),
            url_report: format!("{url_task}/report"),
            url_task,
        })
    }

    fn identify(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header(WORKER_NAME_HEADER, &self.hostname);
        if self.secret.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.secret)
        }
    }
}

#[async_trait]
impl TaskSource for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> anyhow::Result<Option<Value>> {
        let url = &self.url_task;
        tracing::debug!(target: "sitegen.backend", stage = "task.fetch.in", url = %url);
        let resp = self
            .identify(self.http.get(url))
            .send()
            .await
            .map_err(BackendHttpError::transport(url))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(BackendHttpError::transport(url))?;
        if !status.is_success() {
            return Err(BackendHttpError::Status {
                url: url.clone(),
                status: status.as_u16(),
                body: preview_body(&body),
            }
            .into());
        }
        tracing::debug!(target: "sitegen.backend", stage = "task.fetch.out", status = %status);

        if status == reqwest::StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }
        let payload =
            serde_json::from_str::<Value>(&body).map_err(|source| BackendHttpError::Payload {
                url: url.clone(),
                body: preview_body(&body),
                source,
            })?;
        Ok((!payload.is_null()).then_some(payload))
    }
}

#[async_trait]
impl TaskReporter for HttpBackend {
    async fn report(&self, report: &TaskReport) -> anyhow::Result<()> {
        let url = &self.url_report;
        tracing::debug!(
            target: "sitegen.backend",
            stage = "task.report.in",
            url = %url,
            reason = %report.status
        );
        let body = ReportBody {
            report,
            hostname: &self.hostname,
        };
        let resp = self
            .identify(self.http.post(url).json(&body))
            .send()
            .await
            .map_err(BackendHttpError::transport(url))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .map_err(BackendHttpError::transport(url))?;
            return Err(BackendHttpError::Status {
                url: url.clone(),
                status: status.as_u16(),
                body: preview_body(&text),
            }
            .into());
        }
        tracing::debug!(target: "sitegen.backend", stage = "task.report.out", status = %status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use sitegen_core::api::TaskStatus;

    fn backend(url: String) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            url,
            secret: "s3cret".into(),
            hostname: "worker-1".into(),
            timeout_ms: 1_000,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn preview_body_truncates() {
        assert_eq!(preview_body("  "), "<empty body>");
        let preview = preview_body(&"a".repeat(BODY_PREVIEW_LIMIT + 10));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn status_error_display_names_the_url() {
        let err = BackendHttpError::Status {
            url: "https://api.example.com/task/hexo".into(),
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(
            err.to_string(),
            "backend returned 502 for https://api.example.com/task/hexo: bad gateway"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = backend(url.clone()).fetch().await.unwrap_err();
        let http_err = err.downcast_ref::<BackendHttpError>().unwrap();
        assert!(
            matches!(http_err, BackendHttpError::Transport { url: u, .. } if *u == format!("{url}/task/hexo"))
        );
    }

    #[tokio::test]
    async fn fetch_sends_identity_and_returns_payload() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/task/hexo")
            .match_header("authorization", "Bearer s3cret")
            .match_header("x-worker-name", "worker-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"task":{"taskId":1,"taskMethod":"HEXO_UPDATE_CONFIG"}}"#)
            .create_async()
            .await;

        let payload = backend(server.url()).fetch().await.unwrap().unwrap();
        assert_eq!(payload["task"]["taskMethod"], "HEXO_UPDATE_CONFIG");
    }

    #[tokio::test]
    async fn fetch_without_content_is_none() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/task/hexo")
            .with_status(204)
            .create_async()
            .await;

        assert!(backend(server.url()).fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_decode_error_is_typed() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/task/hexo")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = backend(server.url()).fetch().await.unwrap_err();
        let http_err = err.downcast_ref::<BackendHttpError>().unwrap();
        assert!(matches!(http_err, BackendHttpError::Payload { body, .. } if body == "not json"));
    }

    #[tokio::test]
    async fn report_posts_reason_and_hostname() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/task/hexo/report")
            .match_header("x-worker-name", "worker-1")
            .match_body(Matcher::PartialJson(json!({
                "reason": "FINISHED",
                "hostname": "worker-1",
                "data": { "items": 2 }
            })))
            .with_status(201)
            .create_async()
            .await;

        backend(format!("{}/", server.url()))
            .report(&TaskReport::finished(json!({ "items": 2 })))
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn report_status_error_is_typed() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/task/hexo/report")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let err = backend(server.url())
            .report(&TaskReport::new(TaskStatus::Started, None))
            .await
            .unwrap_err();
        let http_err = err.downcast_ref::<BackendHttpError>().unwrap();
        assert!(matches!(
            http_err,
            BackendHttpError::Status { status: 503, url, .. } if url.ends_with("/task/hexo/report")
        ));
    }
}
