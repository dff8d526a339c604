use fyzen_web::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    database::DataAccessCache,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup routine: configuration, logging, shared services, then the HTTP server.
/// It owns the data access cache and passes it into the state assembly.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // Panics on a missing DATABASE_URL, a missing production secret or a bad ACCESS_POLICY.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise the crate logs at debug so the gate's per-check events show.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fyzen_web=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: human-readable output.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: one JSON object per event for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    // Logged here rather than in load() so it reaches the subscriber.
    if config.dev_bypass {
        tracing::warn!("SESSION_DEV_BYPASS is enabled: dev headers can impersonate any role");
    }

    // 4. Data Access Initialization
    // The cache lives as long as the process. Outside production it hands the same
    // client back to every later assembly instead of opening a new pool.
    let data_access = DataAccessCache::new();
    let bind_addr = config.bind_addr.clone();
    // 5. Unified State Assembly
    // Bundles the data access handle, the session resolver and the access policy.
    let app_state = AppState::assemble(config, &data_access)
        .expect("FATAL: Failed to initialise the database client. Check DATABASE_URL.");

    // 6. Router and Server Startup
    let app = create_router(app_state);

    // Binds the TCP listener on BIND_ADDR.

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    // The long-running Axum server process.
    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
