pub mod bungie;
pub mod config;
pub mod error;
pub mod net;
pub mod oauth;
pub mod storage;
pub mod web;

use crate::bungie::{BungieClient, ProfilePipeline};
use crate::config::Config;
use crate::net::HttpClient;
use crate::oauth::{CallbackHandler, RedirectDispatcher, TokenExchangeClient};
use crate::storage::Session;

use std::sync::Arc;

use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Session,
    pub dispatcher: Arc<RedirectDispatcher>,
    pub callback: Arc<CallbackHandler>,
    pub pipeline: Arc<ProfilePipeline>,
}

impl AppState {
    /// Wire the login components from `config` around `session`.
    pub fn new(config: Arc<Config>, session: Session) -> Self {
        let http = HttpClient::new();
        let pipeline = Arc::new(ProfilePipeline::new(BungieClient::from_config(
            http.clone(),
            &config.bungie,
        )));
        let exchange = TokenExchangeClient::new(http, &config.bungie);
        Self {
            dispatcher: Arc::new(RedirectDispatcher::new(&config.bungie)),
            callback: Arc::new(CallbackHandler::new(exchange, pipeline.clone())),
            pipeline,
            session,
            config,
        }
    }
}

/// Build the full application router with request-id and tracing layers.
pub fn build_app(state: AppState) -> Router {
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();
    let trace = TraceLayer::new_for_http();

    web::build_web_router()
        .with_state(state)
        .layer(propagate_id)
        .layer(trace)
        .layer(request_id)
}
