use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::protocol::{CommandFactory, FormFields, Reply};
use crate::store::Store;

/// Shared by every request handler
#[derive(Clone)]
pub struct AppState {
    cmd_factory: Arc<CommandFactory>,
    store: Arc<dyn Store>,
    static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            cmd_factory: Arc::new(CommandFactory::init()),
            store,
            static_dir: Arc::new(static_dir.into()),
        }
    }

    async fn dispatch(&self, name: &str, form: FormFields) -> Reply {
        self.cmd_factory
            .execute(name, &form, self.store.as_ref())
            .await
    }

    /// Serve one of the HTML form pages
    async fn page(&self, file: &str) -> Response {
        let path = self.static_dir.join(file);
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                warn!("Cannot serve page {}: {}", path.display(), e);
                (StatusCode::NOT_FOUND, "page not found").into_response()
            }
        }
    }
}

/// Largest accepted form body, urlencoded or multipart
pub const MAX_FORM_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// `GET /` serves the home page; every command gets `GET /<name>` for its form
/// page and `POST /<name>` to run it.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new().route(
        "/",
        get(|State(state): State<AppState>| async move { state.page("index.html").await }),
    );

    for name in state.cmd_factory.names() {
        let page = format!("{}.html", name);
        router = router.route(
            &format!("/{}", name),
            get(move |State(state): State<AppState>| async move { state.page(&page).await })
                .post(move |State(state): State<AppState>, form: FormFields| async move {
                    state.dispatch(name, form).await
                }),
        );
    }

    router
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .with_state(state)
}

/// HTTP server
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: AppState,
}

impl Server {
    /// Create and bind the HTTP server to the specified address
    pub async fn bind(
        addr: &str,
        store: Arc<dyn Store>,
        static_dir: &Path,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP server bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            state: AppState::new(store, static_dir),
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until Ctrl-C
    pub async fn run(self) -> std::io::Result<()> {
        info!("Server started, listening on {}", self.local_addr);

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
}
