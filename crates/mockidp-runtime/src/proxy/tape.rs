use std::future::Future;
use std::pin::Pin;

use axum::http::StatusCode;
use mockidp_core::error::{MockError, Result};
use mockidp_core::protocol::{RECORDING_DISABLED, TAPE_HEADER};
use mockidp_core::{StandardizedRequest, Tape, TapeStore};

use super::{Proxy, Recorder};
use crate::gateway::ResponseSink;

/// Headers never replayed from a tape; the server computes its own.
const SKIPPED_REPLAY_HEADERS: &[&str] = &["content-length", "transfer-encoding", "connection"];

/// Replays tapes from a directory, optionally recording missing ones.
pub struct TapeProxy {
    store: TapeStore,
    recorder: Option<Recorder>,
}

impl TapeProxy {
    /// Create a replay-only proxy.
    pub fn new(store: TapeStore) -> Self {
        Self {
            store,
            recorder: None,
        }
    }

    /// Record missing tapes with `recorder`.
    pub fn with_recorder(mut self, recorder: Option<Recorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    async fn respond(
        &self,
        request: StandardizedRequest,
        response: &mut dyn ResponseSink,
    ) -> Result<()> {
        let name = request.tape_name();

        if let Some(tape) = self.store.find(&name)? {
            tracing::debug!("Replaying tape {} for {} {}", name, request.method, request.url);
            return replay(&tape, response);
        }

        match &self.recorder {
            Some(recorder) => {
                let recorded = recorder.record(&request).await?;
                let tape = Tape::new(request, recorded);
                self.store.save(&tape)?;
                replay(&tape, response)
            }
            None => {
                tracing::debug!("No tape {} for {} {}", name, request.method, request.url);
                response.set_status(StatusCode::NOT_FOUND);
                response.end(RECORDING_DISABLED.to_string());
                Ok(())
            }
        }
    }
}

impl Proxy for TapeProxy {
    fn proxy<'a>(
        &'a self,
        request: StandardizedRequest,
        response: &'a mut dyn ResponseSink,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.respond(request, response))
    }
}

fn replay(tape: &Tape, response: &mut dyn ResponseSink) -> Result<()> {
    let status = StatusCode::from_u16(tape.response.status).map_err(|e| {
        MockError::Tape(format!("Tape {} has invalid status: {}", tape.name, e))
    })?;

    response.set_status(status);
    for (name, value) in &tape.response.headers {
        if !SKIPPED_REPLAY_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            response.set_header(name, value);
        }
    }
    response.set_header(TAPE_HEADER, &tape.name);
    response.end(tape.response.body.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use mockidp_core::protocol::TEST_DESCRIPTION_HEADER;
    use mockidp_core::TapeResponse;

    use super::*;
    use crate::gateway::BufferedResponse;

    fn request(description: &str) -> StandardizedRequest {
        StandardizedRequest {
            method: "GET".to_string(),
            url: "/api/v1/users/me".to_string(),
            headers: BTreeMap::from([(
                TEST_DESCRIPTION_HEADER.to_string(),
                description.to_string(),
            )]),
            body: String::new(),
        }
    }

    fn saved_tape(store: &TapeStore, description: &str) -> Tape {
        let tape = Tape::new(
            request(description),
            TapeResponse {
                status: 200,
                headers: BTreeMap::from([
                    ("content-type".to_string(), "application/json".to_string()),
                    ("content-length".to_string(), "999".to_string()),
                ]),
                body: r#"{"id":"00ub0oNGTSWTBKOLGLNR"}"#.to_string(),
            },
        );
        store.save(&tape).unwrap();
        tape
    }

    #[tokio::test]
    async fn test_replays_existing_tape() {
        let dir = tempfile::tempdir().unwrap();
        let store = TapeStore::new(dir.path());
        let tape = saved_tape(&store, "get current user");
        let proxy = TapeProxy::new(store);

        let mut res = BufferedResponse::new();
        proxy
            .proxy(request("get current user"), &mut res)
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.header(TAPE_HEADER), Some(tape.name.as_str()));
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert!(res.header("content-length").is_none());
        assert_eq!(res.body(), Some(tape.response.body.as_str()));
    }

    #[tokio::test]
    async fn test_missing_tape_without_recording() {
        let dir = tempfile::tempdir().unwrap();
        let store = TapeStore::new(dir.path());
        saved_tape(&store, "get current user");
        let proxy = TapeProxy::new(store);
        assert!(!proxy.is_recording());

        let mut res = BufferedResponse::new();
        proxy
            .proxy(request("another test"), &mut res)
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.header(TAPE_HEADER).is_none());
        assert_eq!(res.body(), Some(RECORDING_DISABLED));
    }

    #[tokio::test]
    async fn test_invalid_status_is_tape_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TapeStore::new(dir.path());
        let tape = Tape::new(
            request("broken"),
            TapeResponse {
                status: 42,
                headers: BTreeMap::new(),
                body: String::new(),
            },
        );
        store.save(&tape).unwrap();

        let mut res = BufferedResponse::new();
        let result = TapeProxy::new(store).proxy(request("broken"), &mut res).await;
        assert!(matches!(result, Err(MockError::Tape(_))));
    }

    #[tokio::test]
    async fn test_records_missing_tape() {
        let seen: Arc<Mutex<Vec<(Option<String>, Option<String>)>>> = Arc::default();
        let captured = seen.clone();
        let upstream = Router::new().fallback(move |headers: axum::http::HeaderMap| {
            let captured = captured.clone();
            async move {
                let get = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(String::from)
                };
                captured
                    .lock()
                    .unwrap()
                    .push((get("authorization"), get(TEST_DESCRIPTION_HEADER)));
                (
                    StatusCode::CREATED,
                    [("content-type", "application/json")],
                    r#"{"recorded":true}"#,
                )
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let store = TapeStore::new(dir.path());
        let recorder = Recorder::new(
            format!("http://{}", addr),
            BTreeMap::from([("authorization".to_string(), "SSWS secret".to_string())]),
        );
        let proxy = TapeProxy::new(store.clone()).with_recorder(Some(recorder));

        let mut res = BufferedResponse::new();
        proxy
            .proxy(request("record me"), &mut res)
            .await
            .unwrap();

        let name = request("record me").tape_name();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.header(TAPE_HEADER), Some(name.as_str()));
        assert_eq!(res.body(), Some(r#"{"recorded":true}"#));

        let tape = store.find(&name).unwrap().unwrap();
        assert_eq!(tape.response.status, 201);
        assert!(!tape.response.headers.contains_key("content-length"));
        assert!(!tape.request.headers.contains_key("authorization"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("SSWS secret"));
        assert_eq!(seen[0].1, None);
    }
}
