mod handlers;
mod middleware;
mod page;

pub use middleware::RateLimiter;
pub use page::{PageLinks, PageRenderer};

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::store::CampaignStore;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CampaignStore>,
    pub page: Arc<PageRenderer>,
    /// Applied to both reload routes when set.
    pub reload_limiter: Option<RateLimiter>,
    /// Served under `/static` when set.
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(store: Arc<CampaignStore>, page: PageRenderer) -> Self {
        Self {
            store,
            page: Arc::new(page),
            reload_limiter: None,
            static_dir: None,
        }
    }

    pub fn with_reload_limiter(mut self, limiter: RateLimiter) -> Self {
        self.reload_limiter = Some(limiter);
        self
    }

    pub fn with_static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = Some(dir);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut reload = Router::new()
        .route("/reload", get(handlers::reload_page))
        .route("/api/v1/reload", post(handlers::reload));
    if let Some(limiter) = state.reload_limiter.clone() {
        reload = reload.route_layer(from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/graph", get(handlers::graph))
        .route("/persons", get(handlers::list_persons))
        .route("/stats", get(handlers::stats))
        .layer(CorsLayer::permissive());

    let mut router = Router::new()
        .route("/", get(handlers::index))
        .merge(reload)
        .nest("/api/v1", api);

    if let Some(dir) = &state.static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
