use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::challenge::ChallengeResolver;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::database::registry::ProtectedPathRegistry;
use crate::gate::AccessGate;
use crate::handlers;
use crate::path::PathNormalizer;
use crate::session::SessionStore;

/// Collaborators shared by the middleware and handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<dyn ProtectedPathRegistry>,
    pub sessions: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
    pub gate: AccessGate,
    pub challenge: ChallengeResolver,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        registry: Arc<dyn ProtectedPathRegistry>,
        normalizer: Arc<dyn PathNormalizer>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = AccessGate::new(registry.clone(), normalizer);
        let challenge = ChallengeResolver::new(registry.clone(), config.gate.unlock_ttl_secs);
        Self {
            config: Arc::new(config),
            registry,
            sessions,
            clock,
            gate,
            challenge,
        }
    }
}

/// Full router: public pages behind the gate, challenge route, admin API.
/// `content` is the site being protected.
pub fn router(state: AppState, content: Router<AppState>) -> Router {
    let challenge_route = state.config.gate.challenge_route.clone();

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            &challenge_route,
            get(handlers::challenge::challenge_get)
                .post(handlers::challenge::challenge_post)
                .delete(handlers::challenge::challenge_delete),
        )
        .merge(admin_routes(state.clone()))
        .merge(content)
        .layer(middleware::from_fn_with_state(state.clone(), crate::middleware::gate_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::admin;

    Router::new()
        .route("/api/protected-pages", get(admin::list_pages).post(admin::create_page))
        .route(
            "/api/protected-pages/:pid",
            get(admin::get_page).put(admin::update_page).delete(admin::delete_page),
        )
        .layer(middleware::from_fn_with_state(state, crate::middleware::require_admin))
}

/// Placeholder site used by the standalone server
pub fn demo_content() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .fallback(handlers::content_page)
}
