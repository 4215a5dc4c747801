use crate::{
    api::handlers::{
        auth::{session_layer, AuthState},
        health,
        tickets::TicketState,
    },
    authz::{AuthorizationResolver, TicketAccessGuard},
    credentials::{AuthenticationService, CredentialStore, PgCredentialStore},
    notify::{LogNotifier, Notifier, SmtpNotifier},
    recovery::RecoveryService,
    tickets::{PgTicketStore, TicketStore},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::options,
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

mod config;
pub mod handlers;
mod openapi;

pub use config::ServiceConfig;
pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Shared stores and notifier behind the services.
#[derive(Clone)]
pub struct Backends {
    pub credentials: Arc<dyn CredentialStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// Wire services over `backends` and return the complete application.
///
/// Every service logs under one `ticketdesk` span.
#[must_use]
pub fn app(config: &ServiceConfig, backends: Backends) -> Router {
    let root_span = info_span!("ticketdesk");

    let resolver = AuthorizationResolver::new(config.technician_capability());
    let authentication =
        AuthenticationService::new(backends.credentials.clone(), root_span.clone())
            .with_overrides(config.overrides().clone())
            .with_user_capability(config.user_capability())
            .with_legacy_plaintext(config.legacy_plaintext());
    let recovery = RecoveryService::new(
        backends.credentials.clone(),
        backends.notifier.clone(),
        root_span.clone(),
    )
    .with_code_length(config.recovery_code_length());
    let auth_state = Arc::new(AuthState::new(
        config.auth().clone(),
        authentication,
        recovery,
        resolver.clone(),
    ));

    let guard = TicketAccessGuard::new(resolver, backends.tickets.clone(), root_span);
    let ticket_state = Arc::new(
        TicketState::new(guard, backends.tickets).with_uploads_root(config.uploads_root().clone()),
    );

    // Routes come from openapi.rs; the document is also served to Swagger UI.
    let (router, openapi) = router().split_for_parts();
    router
        .route("/health", options(health::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            session_layer,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state))
                .layer(Extension(ticket_state))
                .layer(Extension(backends.credentials)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, config: ServiceConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let notifier: Arc<dyn Notifier> = match config.smtp() {
        Some(smtp) => {
            info!("Sending notifications through {}:{}", smtp.host(), smtp.port());
            Arc::new(SmtpNotifier::new(smtp.clone())?)
        }
        None => {
            info!("No SMTP host configured, notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let backends = Backends {
        credentials: Arc::new(PgCredentialStore::new(pool.clone())),
        tickets: Arc::new(PgTicketStore::new(pool)),
        notifier,
    };
    let app = app(&config, backends);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Gracefully shutdown"),
                Err(err) => {
                    tracing::error!("Failed to listen for shutdown signal: {err}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
