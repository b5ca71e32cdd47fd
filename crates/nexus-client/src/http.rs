//! HTTP client for the orchestrator's REST and SSE endpoints.

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Url;
use tracing::debug;

use nexus_core::{TaskHandle, TaskId, TaskSubmission};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::orchestrator::{FrameStream, Orchestrator};

/// Orchestrator reached over HTTP.
///
/// - `POST {origin}/submit-task` queues a task.
/// - `GET {origin}/stream/{task_id}` streams its events as server-sent events.
pub struct HttpOrchestrator {
    inner: reqwest::Client,
    origin: Url,
    submit_timeout: Option<Duration>,
}

impl HttpOrchestrator {
    /// Create a new HTTP orchestrator client.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            inner: reqwest::Client::new(),
            origin: config.origin_url()?,
            submit_timeout: config.submit_timeout,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// URL of the submission endpoint.
    pub fn submit_url(&self) -> Result<Url, ClientError> {
        self.endpoint(&["submit-task"])
    }

    /// URL of a task's event stream. The id is encoded as one path segment.
    pub fn stream_url(&self, task_id: &TaskId) -> Result<Url, ClientError> {
        self.endpoint(&["stream", task_id.as_str()])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.origin.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::InvalidConfig(format!(
                    "origin '{}' cannot be used as a base URL",
                    self.origin
                ))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn submit_task(&self, submission: &TaskSubmission) -> Result<TaskHandle, ClientError> {
        let url = self.submit_url()?;
        debug!(url = %url, "POST request");

        let mut request = self.inner.post(url).json(submission);
        if let Some(timeout) = self.submit_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Submission(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Submission(format!("invalid response body: {}", e)))
    }

    async fn open_stream(&self, task_id: &TaskId) -> Result<FrameStream, ClientError> {
        let url = self.stream_url(task_id)?;
        debug!(url = %url, "Opening event stream");

        let response = self
            .inner
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "HTTP {} opening stream",
                status
            )));
        }

        let frames = response
            .bytes_stream()
            .eventsource()
            .filter_map(|item| async move {
                match item {
                    Ok(event) if event.data.is_empty() => None,
                    Ok(event) => Some(Ok(event.data)),
                    Err(e) => Some(Err(ClientError::Transport(e.to_string()))),
                }
            });

        Ok(Box::pin(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::sse::{Event, Sse};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use futures_util::stream;
    use serde_json::{json, Value};

    use nexus_core::StreamEvent;

    async fn spawn_orchestrator(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn sse(events: Vec<String>) -> Sse<impl futures_util::Stream<Item = Result<Event, Infallible>>> {
        Sse::new(stream::iter(
            events
                .into_iter()
                .map(|data| Ok::<_, Infallible>(Event::default().data(data))),
        ))
    }

    fn orchestrator(origin: &str) -> HttpOrchestrator {
        HttpOrchestrator::new(&ClientConfig::new(origin)).unwrap()
    }

    fn submission() -> TaskSubmission {
        TaskSubmission::new("Analyze AI in agriculture").unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let client = orchestrator("http://127.0.0.1:8000");
        assert_eq!(
            client.submit_url().unwrap().as_str(),
            "http://127.0.0.1:8000/submit-task"
        );
        assert_eq!(
            client.stream_url(&TaskId::new("a b/c")).unwrap().as_str(),
            "http://127.0.0.1:8000/stream/a%20b%2Fc"
        );

        let prefixed = orchestrator("https://ops.example.com/nexus/");
        assert_eq!(
            prefixed.stream_url(&TaskId::new("T1")).unwrap().as_str(),
            "https://ops.example.com/nexus/stream/T1"
        );
    }

    #[tokio::test]
    async fn test_submit_task() {
        let app = Router::new().route(
            "/submit-task",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({ "task_description": "Analyze AI in agriculture" }));
                Json(json!({ "status": "queued", "task_id": "1718000000" }))
            }),
        );
        let origin = spawn_orchestrator(app).await;

        let handle = orchestrator(&origin).submit_task(&submission()).await.unwrap();
        assert_eq!(handle.task_id, TaskId::new("1718000000"));
        assert_eq!(handle.status.as_deref(), Some("queued"));
    }

    #[tokio::test]
    async fn test_submit_rejects_error_status() {
        let app = Router::new().route(
            "/submit-task",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let origin = spawn_orchestrator(app).await;

        let err = orchestrator(&origin)
            .submit_task(&submission())
            .await
            .unwrap_err();
        assert!(
            matches!(&err, ClientError::Submission(msg) if msg.contains("500")),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_submit_rejects_undecodable_body() {
        let app = Router::new()
            .route("/submit-task", post(|| async { "<html>queued</html>" }));
        let origin = spawn_orchestrator(app).await;

        let err = orchestrator(&origin)
            .submit_task(&submission())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Submission(_)), "{err}");
    }

    #[tokio::test]
    async fn test_submit_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = orchestrator(&format!("http://{}", addr))
            .submit_task(&submission())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Http(_)), "{err}");
    }

    #[tokio::test]
    async fn test_submit_timeout() {
        let app = Router::new().route(
            "/submit-task",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "task_id": "late" }))
            }),
        );
        let origin = spawn_orchestrator(app).await;
        let config = ClientConfig::new(origin).with_submit_timeout(Duration::from_millis(100));

        let err = HttpOrchestrator::new(&config)
            .unwrap()
            .submit_task(&submission())
            .await
            .unwrap_err();
        assert!(matches!(&err, ClientError::Http(e) if e.is_timeout()), "{err}");
    }

    #[tokio::test]
    async fn test_open_stream_yields_frames_in_order() {
        let app = Router::new().route(
            "/stream/:task_id",
            get(|Path(task_id): Path<String>| async move {
                assert_eq!(task_id, "T1");
                sse(vec![
                    StreamEvent::log("Retriever: Searching for information...").to_json(),
                    StreamEvent::log("Writer: Drafting final report...").to_json(),
                    StreamEvent::result("Done. See https://x.test/r").to_json(),
                ])
            }),
        );
        let origin = spawn_orchestrator(app).await;

        let frames: Vec<String> = orchestrator(&origin)
            .open_stream(&TaskId::new("T1"))
            .await
            .unwrap()
            .map(|frame| frame.unwrap())
            .collect()
            .await;

        let events: Vec<StreamEvent> = frames
            .iter()
            .map(|raw| StreamEvent::decode(raw).unwrap().unwrap())
            .collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::log("Retriever: Searching for information..."),
                StreamEvent::log("Writer: Drafting final report..."),
                StreamEvent::result("Done. See https://x.test/r"),
            ]
        );
    }

    #[tokio::test]
    async fn test_open_stream_not_found() {
        let origin = spawn_orchestrator(Router::new()).await;

        let result = orchestrator(&origin).open_stream(&TaskId::new("T1")).await;
        assert!(
            matches!(&result, Err(ClientError::Transport(msg)) if msg.contains("404")),
            "expected transport error"
        );
    }
}
