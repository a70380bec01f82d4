//! HTTP/JSON routes over the command manager and tmux inventory.

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use pane_relay_core::PaneTarget;
use pane_relay_executor::InjectRequest;
use pane_relay_session::{CaptureSpan, CommandManager, CommandSummary};
use pane_relay_tmux::{PaneInventory, PaneListing, TmuxPane, TmuxSession, TmuxWindow};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    error::ApiError,
    protocol::{
        CaptureQuery, CaptureResponse, CommandView, FetchQuery, HealthResponse,
        PANE_CONTENT_LINES, SubmitRequest, SubmitResponse, SweepQuery, SweepResponse,
        render_capture, render_finished, render_pane_content, render_started, render_timeout,
        render_untracked,
    },
};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<CommandManager>,
    pub inventory: Arc<dyn PaneInventory>,
    /// Age used by `DELETE /commands` when the query omits one.
    pub sweep_max_age_minutes: u64,
}

/// Build the router with CORS and request tracing.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/commands",
            get(list_commands).post(submit_command).delete(sweep_commands),
        )
        .route("/commands/{id}", get(get_command))
        .route("/panes", get(list_all_panes))
        .route("/panes/active", get(active_pane))
        .route("/panes/{pane}", get(pane_content))
        .route("/panes/{pane}/capture", get(capture_pane))
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}/windows", get(list_windows))
        .route("/windows/{id}/panes", get(list_panes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn submit_command(
    State(state): State<ApiState>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    if body.pane.trim().is_empty() {
        return Err(ApiError::BadRequest("pane must not be empty".to_string()));
    }
    let request = InjectRequest::from(&body);

    if !body.is_tracked() {
        let id = state.manager.submit(request).await?;
        let record = state.manager.refresh(id).await?;
        return Ok(Json(SubmitResponse {
            id,
            record: Some(record),
            timed_out: false,
            text: render_untracked(id, &body.pane, body.no_enter),
        }));
    }

    let timeout = body
        .timeout()
        .unwrap_or(state.manager.settings().default_timeout);
    if timeout == Duration::ZERO {
        let id = state.manager.submit(request).await?;
        return Ok(Json(SubmitResponse {
            id,
            record: Some(state.manager.fetch(id)?),
            timed_out: false,
            text: render_started(id),
        }));
    }

    let outcome = state.manager.execute(request, Some(timeout)).await?;
    let text = if outcome.timed_out {
        render_timeout(&outcome.record)
    } else {
        render_finished(&outcome.record)
    };
    Ok(Json(SubmitResponse {
        id: outcome.record.id(),
        timed_out: outcome.timed_out,
        record: Some(outcome.record),
        text,
    }))
}

async fn list_commands(
    State(state): State<ApiState>,
) -> Result<Json<Vec<CommandSummary>>, ApiError> {
    Ok(Json(state.manager.list()?))
}

async fn get_command(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<CommandView>, ApiError> {
    let record = if query.refresh.unwrap_or(true) {
        state.manager.refresh(id).await?
    } else {
        state.manager.fetch(id)?
    };
    Ok(Json(CommandView::from(record)))
}

async fn sweep_commands(
    State(state): State<ApiState>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepResponse>, ApiError> {
    let max_age = query
        .max_age_minutes
        .unwrap_or(state.sweep_max_age_minutes);
    let removed = state.manager.sweep(max_age)?;
    Ok(Json(SweepResponse { removed }))
}

async fn capture_pane(
    State(state): State<ApiState>,
    Path(pane): Path<String>,
    Query(query): Query<CaptureQuery>,
) -> Result<Json<CaptureResponse>, ApiError> {
    let span = query.span().map_err(ApiError::BadRequest)?;
    let pane = PaneTarget::new(pane);
    let capture = state.manager.capture(&pane, span, query.colors).await?;
    let text = render_capture(&capture);
    Ok(Json(CaptureResponse {
        pane,
        capture,
        text,
    }))
}

/// Recent plain-text content of a pane.
async fn pane_content(
    State(state): State<ApiState>,
    Path(pane): Path<String>,
) -> Result<Json<CaptureResponse>, ApiError> {
    let pane = PaneTarget::new(pane);
    let capture = state
        .manager
        .capture(&pane, CaptureSpan::Tail(PANE_CONTENT_LINES), false)
        .await?;
    let text = render_pane_content(&capture);
    Ok(Json(CaptureResponse {
        pane,
        capture,
        text,
    }))
}

async fn list_sessions(State(state): State<ApiState>) -> Result<Json<Vec<TmuxSession>>, ApiError> {
    Ok(Json(state.inventory.list_sessions().await?))
}

async fn list_windows(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<TmuxWindow>>, ApiError> {
    Ok(Json(state.inventory.list_windows(&session_id).await?))
}

async fn list_panes(
    State(state): State<ApiState>,
    Path(window_id): Path<String>,
) -> Result<Json<Vec<TmuxPane>>, ApiError> {
    Ok(Json(state.inventory.list_panes(&window_id).await?))
}

async fn list_all_panes(State(state): State<ApiState>) -> Result<Json<Vec<PaneListing>>, ApiError> {
    Ok(Json(state.inventory.list_all_panes().await?))
}

async fn active_pane(State(state): State<ApiState>) -> Result<Json<TmuxPane>, ApiError> {
    state
        .inventory
        .active_pane()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No active pane".to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use pane_relay_core::{
        CommandTracker, Keystroke, PaneError, PaneReader, PaneWriter, ShellDialect,
        marker::{END_TAG, START_TAG},
    };
    use pane_relay_executor::CommandInjector;
    use pane_relay_session::ManagerSettings;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    /// Pane whose wrapped commands print `hello` and succeed at once.
    #[derive(Default)]
    struct InstantShell {
        history: Mutex<Vec<String>>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl PaneReader for InstantShell {
        async fn capture_history(
            &self,
            target: &PaneTarget,
            _include_color: bool,
        ) -> Result<Vec<String>, PaneError> {
            if target.as_str() == "%404" {
                return Err(PaneError::CommandFailed {
                    command: "tmux capture-pane".into(),
                    stderr: "can't find pane: %404".into(),
                });
            }
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.history.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl PaneWriter for InstantShell {
        async fn send_line(&self, target: &PaneTarget, text: &str) -> Result<(), PaneError> {
            if target.as_str() == "%404" {
                return Err(PaneError::CommandFailed {
                    command: "tmux send-keys".into(),
                    stderr: "can't find pane: %404".into(),
                });
            }
            let mut history = self.history.lock().unwrap();
            history.push(format!("$ {text}"));
            let id = text
                .strip_prefix(&format!("echo \"{START_TAG}_"))
                .and_then(|rest| rest.split_once('"'))
                .map(|(id, _)| id.to_string());
            if let Some(id) = id {
                history.push(format!("{START_TAG}_{id}"));
                history.push("hello".into());
                history.push(format!("{END_TAG}_{id}_0"));
            }
            Ok(())
        }

        async fn send_key(&self, _target: &PaneTarget, _key: &Keystroke) -> Result<(), PaneError> {
            Ok(())
        }
    }

    struct OneSession;

    #[async_trait]
    impl PaneInventory for OneSession {
        async fn list_sessions(&self) -> Result<Vec<TmuxSession>, PaneError> {
            Ok(vec![TmuxSession {
                id: "$0".into(),
                name: "main".into(),
                attached: false,
                windows: 1,
            }])
        }

        async fn list_windows(&self, session_id: &str) -> Result<Vec<TmuxWindow>, PaneError> {
            Ok(vec![TmuxWindow {
                id: "@0".into(),
                name: "shell".into(),
                active: true,
                session_id: session_id.into(),
            }])
        }

        async fn list_panes(&self, window_id: &str) -> Result<Vec<TmuxPane>, PaneError> {
            Ok(vec![TmuxPane {
                id: "%0".into(),
                window_id: window_id.into(),
                active: true,
                title: "host".into(),
            }])
        }
    }

    fn app() -> (Arc<InstantShell>, Router) {
        let shell = Arc::new(InstantShell::default());
        let tracker = Arc::new(CommandTracker::new(shell.clone()));
        let injector = CommandInjector::new(tracker, shell.clone(), ShellDialect::Bash);
        let manager = CommandManager::new(injector, shell.clone(), ManagerSettings::default());
        let router = create_router(ApiState {
            manager: Arc::new(manager),
            inventory: Arc::new(OneSession),
            sweep_max_age_minutes: 60,
        });
        (shell, router)
    }

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_, router) = app();
        let (status, body) = call(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn submit_waits_for_completion() {
        let (_, router) = app();
        let (status, body) = call(
            &router,
            Method::POST,
            "/commands",
            Some(json!({"pane": "%1", "command": "echo hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timed_out"], false);
        assert_eq!(body["record"]["status"], "completed");
        assert_eq!(body["record"]["exit_code"], 0);
        assert_eq!(body["record"]["result"], "hello");
        assert!(body["text"].as_str().unwrap().starts_with("Command ID: "));

        let id = body["id"].as_str().unwrap();
        let (status, view) = call(&router, Method::GET, &format!("/commands/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(view["text"].as_str().unwrap().contains("--- Output ---\nhello"));

        let (_, listing) = call(&router, Method::GET, "/commands", None).await;
        assert_eq!(listing[0]["summary"], "echo hello");
        assert_eq!(listing[0]["status"], "completed");
    }

    #[tokio::test]
    async fn zero_timeout_returns_pending_without_reading() {
        let (shell, router) = app();
        let (status, body) = call(
            &router,
            Method::POST,
            "/commands",
            Some(json!({"pane": "%1", "command": "ls", "timeout_secs": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record"]["status"], "pending");
        assert!(body["text"].as_str().unwrap().starts_with("Command execution started"));
        assert_eq!(shell.reads.load(Ordering::SeqCst), 0);

        let id = body["id"].as_str().unwrap();
        let (_, stored) =
            call(&router, Method::GET, &format!("/commands/{id}?refresh=false"), None).await;
        assert_eq!(stored["record"]["status"], "pending");
        assert_eq!(shell.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn raw_submission_is_untracked() {
        let (shell, router) = app();
        let (status, body) = call(
            &router,
            Method::POST,
            "/commands",
            Some(json!({"pane": "%1", "command": "python3", "raw_mode": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record"]["mode"], "raw");
        assert!(
            body["text"]
                .as_str()
                .unwrap()
                .contains("Status tracking is disabled.")
        );
        assert_eq!(shell.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let (_, router) = app();
        let missing = Uuid::new_v4();
        let uri = format!("/commands/{missing}");
        let (status, body) = call(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains(&missing.to_string()));

        let (status, _) = call(
            &router,
            Method::POST,
            "/commands",
            Some(json!({"pane": "%404", "command": "ls"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = call(
            &router,
            Method::POST,
            "/commands",
            Some(json!({"pane": " ", "command": "ls"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&router, Method::GET, "/panes/%251/capture?start=3", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn captures_pane_tail() {
        let (shell, router) = app();
        shell
            .history
            .lock()
            .unwrap()
            .extend(["one", "two", "three"].map(String::from));
        let (status, body) =
            call(&router, Method::GET, "/panes/%251/capture?lines=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pane"], "%1");
        assert_eq!(body["start_line"], 1);
        assert_eq!(body["text"], "Captured lines 1-3 of 3:\n\ntwo\nthree");
    }

    #[tokio::test]
    async fn pane_content_reads_last_200_lines() {
        let (shell, router) = app();
        let (status, body) = call(&router, Method::GET, "/panes/%251", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "No content captured");

        shell
            .history
            .lock()
            .unwrap()
            .extend((0..250).map(|n| format!("line {n}")));
        let (status, body) = call(&router, Method::GET, "/panes/%251", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pane"], "%1");
        assert_eq!(body["start_line"], 50);
        assert_eq!(body["lines"].as_array().unwrap().len(), 200);
        let text = body["text"].as_str().unwrap();
        assert!(text.starts_with("line 50\n"));
        assert!(text.ends_with("line 249"));

        let (status, _) = call(&router, Method::GET, "/panes/%25404", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn sweep_reports_removed_count() {
        let (_, router) = app();
        let (status, body) =
            call(&router, Method::DELETE, "/commands?max_age_minutes=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 0);
    }

    #[tokio::test]
    async fn inventory_routes() {
        let (_, router) = app();
        let (_, sessions) = call(&router, Method::GET, "/sessions", None).await;
        assert_eq!(sessions[0]["name"], "main");

        let (_, windows) = call(&router, Method::GET, "/sessions/$0/windows", None).await;
        assert_eq!(windows[0]["sessionId"], "$0");

        let (_, panes) = call(&router, Method::GET, "/windows/@0/panes", None).await;
        assert_eq!(panes[0]["windowId"], "@0");

        let (status, all) = call(&router, Method::GET, "/panes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all[0]["id"], "%0");
        assert_eq!(all[0]["sessionName"], "main");

        let (status, _) = call(&router, Method::GET, "/panes/active", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
