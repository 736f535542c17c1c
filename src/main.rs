use axum::Router;
use http::{HeaderValue, Method, header};
use splitmate::api::{handlers::api_routes, openapi::ApiDoc};
use splitmate::config::CONFIG;
use splitmate::core::services::SplitMateService;
use splitmate::infrastructure::{
    cache::{in_memory::InMemoryCodeCache, sweeper::spawn_sweeper},
    logging::in_memory::InMemoryLogging,
    mailer::in_memory::InMemoryMailer,
    storage::in_memory::InMemoryStorage,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn cors_layer() -> CorsLayer {
    let origin = match CONFIG.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            warn!(frontend_url = %CONFIG.frontend_url, "invalid FRONTEND_URL, allowing any origin");
            AllowOrigin::from(Any)
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!(config = ?*CONFIG, "starting splitmate");

    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let codes = InMemoryCodeCache::new(CONFIG.verification_code_ttl(), CONFIG.verification_capacity);
    let mailer = InMemoryMailer::new();
    let _sweeper = spawn_sweeper(codes.clone(), CONFIG.verification_sweep_interval());

    let service = Arc::new(SplitMateService::new(
        storage,
        logging,
        codes,
        mailer,
        CONFIG.auth_settings(),
    ));

    let app = Router::new()
        .nest("/api", api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http()); // Request tracing

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    info!("Server running at http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
