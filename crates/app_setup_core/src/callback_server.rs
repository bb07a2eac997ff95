//! Short-lived local HTTP server that receives GitHub's manifest callback.
//!
//! The server has exactly one job: serve the page that submits the manifest, then
//! capture the `code` GitHub appends to the redirect. The first code wins; once it is
//! captured the handler asks the server to shut down from a separate task, so the
//! handler never waits on the server that is dispatching it.
//!
//! # Routes
//!
//! - `GET /` and `GET /start` - the auto-submitting redirect page
//! - `GET /callback?code=...` - captures the code, answers with a confirmation page
//! - `GET /callback` without a code - 400, nothing is recorded
//! - anything else - 404

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Notify},
    task::JoinHandle,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::SetupError;

#[cfg(test)]
#[path = "callback_server_tests.rs"]
mod tests;

/// Port the callback server listens on unless configured otherwise.
pub const DEFAULT_CALLBACK_PORT: u16 = 8765;

/// Path GitHub redirects to after the app was created.
pub const CALLBACK_PATH: &str = "/callback";

/// How long a stopping server may take to finish in-flight requests.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// State shared between the request handlers and the waiting setup flow.
pub struct CallbackState {
    code: OnceLock<String>,
    code_tx: Mutex<Option<oneshot::Sender<String>>>,
    shutdown: Arc<Notify>,
    redirect_page: String,
    success_page: String,
}

impl CallbackState {
    /// Creates the state and the receiver that resolves with the first captured code.
    pub fn new(
        redirect_page: String,
        success_page: String,
    ) -> (Arc<Self>, oneshot::Receiver<String>) {
        let (code_tx, code_rx) = oneshot::channel();
        let state = Arc::new(Self {
            code: OnceLock::new(),
            code_tx: Mutex::new(Some(code_tx)),
            shutdown: Arc::new(Notify::new()),
            redirect_page,
            success_page,
        });
        (state, code_rx)
    }

    /// The captured code, if a callback carrying one has arrived.
    pub fn captured_code(&self) -> Option<&str> {
        self.code.get().map(String::as_str)
    }

    /// Records `code` unless one was captured before. Returns whether it was recorded.
    fn record_code(&self, code: &str) -> bool {
        if self.code.set(code.to_string()).is_err() {
            return false;
        }

        let sender = match self.code_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            // The receiver is gone only if the flow already gave up waiting.
            let _ = sender.send(code.to_string());
        }
        true
    }

    /// Asks the serve loop to stop. Safe to call more than once.
    fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
}

/// Builds the router serving the callback routes.
pub fn router(state: Arc<CallbackState>) -> Router {
    Router::new()
        .route("/", get(redirect_page))
        .route("/start", get(redirect_page))
        .route(CALLBACK_PATH, get(callback))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn redirect_page(State(state): State<Arc<CallbackState>>) -> Html<String> {
    debug!("Serving manifest redirect page");
    Html(state.redirect_page.clone())
}

async fn callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("Callback received without a code");
        return (StatusCode::BAD_REQUEST, "No code received").into_response();
    };

    if state.record_code(&code) {
        info!("Received manifest code from GitHub");
        // Stop from another task; this handler is still being served by the loop.
        let stopper = Arc::clone(&state);
        tokio::spawn(async move { stopper.request_shutdown() });
    } else {
        warn!("Ignoring additional callback, a code was already captured");
    }

    Html(state.success_page.clone()).into_response()
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// A bound, not yet serving, callback listener.
///
/// Binding comes first so the externally reachable callback URL, including the
/// actual port, is known before the manifest that embeds it is built.
pub struct CallbackServer {
    listener: TcpListener,
    base_url: Url,
}

impl CallbackServer {
    /// Binds the listener to `addr`.
    ///
    /// # Arguments
    ///
    /// * `addr` - Local socket address; port `0` picks a free port.
    /// * `public_host` - Host name the browser uses to reach the server, e.g. `localhost`.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::ServerBind` if the address is unavailable, or
    /// `SetupError::InvalidUrl` if `public_host` does not form a valid URL.
    pub async fn bind(addr: SocketAddr, public_host: &str) -> Result<Self, SetupError> {
        let bind_error = |e: std::io::Error| SetupError::ServerBind {
            addr,
            reason: e.to_string(),
        };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let base_url = Url::parse(&format!("http://{}:{}/", public_host, local_addr.port()))
            .map_err(|e| SetupError::InvalidUrl(format!("{}: {}", public_host, e)))?;

        info!(addr = %local_addr, "Callback server bound");
        Ok(Self { listener, base_url })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SetupError> {
        self.listener
            .local_addr()
            .map_err(|e| SetupError::Server(e.to_string()))
    }

    /// The URL that serves the redirect page.
    pub fn start_url(&self) -> &Url {
        &self.base_url
    }

    /// The URL GitHub redirects back to.
    pub fn callback_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(CALLBACK_PATH);
        url
    }

    /// Starts serving on a background task.
    pub fn start(self, redirect_page: String, success_page: String) -> RunningCallbackServer {
        let (state, code_rx) = CallbackState::new(redirect_page, success_page);
        let shutdown = Arc::clone(&state.shutdown);
        let app = router(Arc::clone(&state));
        let listener = self.listener;

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        });

        RunningCallbackServer {
            state,
            code_rx,
            task,
            base_url: self.base_url,
        }
    }
}

enum WaitOutcome {
    Code(Option<String>),
    Stopped(Result<std::io::Result<()>, tokio::task::JoinError>),
}

/// Handle to a serving callback server.
pub struct RunningCallbackServer {
    state: Arc<CallbackState>,
    code_rx: oneshot::Receiver<String>,
    task: JoinHandle<std::io::Result<()>>,
    base_url: Url,
}

impl RunningCallbackServer {
    /// The URL that serves the redirect page.
    pub fn start_url(&self) -> &Url {
        &self.base_url
    }

    pub fn captured_code(&self) -> Option<&str> {
        self.state.captured_code()
    }

    /// Waits up to `timeout` for the first code, then stops the server.
    ///
    /// The server is shut down and joined whether or not a code arrived.
    ///
    /// # Errors
    ///
    /// - `SetupError::CallbackTimeout` if no code arrived in time.
    /// - `SetupError::Server` if the serve loop ended before a code arrived.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String, SetupError> {
        let RunningCallbackServer {
            state,
            mut code_rx,
            mut task,
            ..
        } = self;

        let waited = tokio::time::timeout(timeout, async {
            // The code is sent before shutdown is requested, so it wins when both are ready.
            tokio::select! {
                biased;
                code = &mut code_rx => WaitOutcome::Code(code.ok()),
                stopped = &mut task => WaitOutcome::Stopped(stopped),
            }
        })
        .await;

        match waited {
            Ok(WaitOutcome::Code(Some(code))) => {
                state.request_shutdown();
                finish(task).await;
                Ok(code)
            }
            Ok(WaitOutcome::Code(None)) => {
                state.request_shutdown();
                finish(task).await;
                Err(SetupError::Server(
                    "the callback server stopped before a code arrived".to_string(),
                ))
            }
            Ok(WaitOutcome::Stopped(joined)) => {
                if let Some(code) = state.captured_code() {
                    debug!("Callback server stopped after capturing a code");
                    return Ok(code.to_string());
                }
                Err(SetupError::Server(match joined {
                    Ok(Ok(())) => "the callback server stopped before a code arrived".to_string(),
                    Ok(Err(e)) => e.to_string(),
                    Err(e) => e.to_string(),
                }))
            }
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "No callback received before the timeout"
                );
                state.request_shutdown();
                finish(task).await;
                Err(SetupError::CallbackTimeout(timeout))
            }
        }
    }

    /// Stops the server without waiting for a code.
    pub async fn shutdown(self) {
        self.state.request_shutdown();
        finish(self.task).await;
    }
}

async fn finish(mut task: JoinHandle<std::io::Result<()>>) {
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
        Ok(Ok(Ok(()))) => debug!("Callback server stopped"),
        Ok(Ok(Err(e))) => warn!(error = %e, "Callback server stopped with an error"),
        Ok(Err(e)) => warn!(error = %e, "Callback server task failed"),
        Err(_) => {
            warn!("Callback server did not stop in time, aborting it");
            task.abort();
        }
    }
}
