use backend::{handlers, shared, system};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::{
        routing::{get, post},
        Router,
    };
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // Создаем директорию для логов
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("backend.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                // Отключаем логи SQL запросов, но оставляем логи приложения
                "info,sqlx=warn,sea_orm=warn".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let config = shared::config::load_config()?;
    let db_path = shared::config::get_database_path(&config)?;
    let port = config.server.port;
    shared::config::set_active(config);

    shared::data::db::initialize_database(Some(&db_path.to_string_lossy()))
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    // Подписка на топик — до старта сервера, чтобы первый импорт уже имел
    // живого консьюмера аудита
    let audit_rx = shared::events::subscribe();
    tokio::spawn(system::audit::run_loop(audit_rx));

    // Единственный воркер очереди импорта
    tokio::spawn(system::jobs::worker::run_loop());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        // Waybills
        .route("/api/waybills", get(handlers::a003_waybill::list))
        .route("/api/waybills/import", post(handlers::a003_waybill::import))
        .route(
            "/api/waybills/summary",
            get(handlers::d400_waybill_summary::get_summary),
        )
        .route(
            "/api/waybills/generate-monthly-report",
            post(handlers::a003_waybill::generate_monthly_report),
        )
        .route(
            "/api/waybills/:id",
            get(handlers::a003_waybill::get_by_id).put(handlers::a003_waybill::update),
        )
        // Import jobs (опрос фоновых импортов)
        .route(
            "/api/import-jobs/:id",
            get(handlers::a004_import_job::get_by_id),
        )
        // Projects / suppliers
        .route("/api/projects", get(handlers::a001_project::list_all))
        .route(
            "/api/projects/:id/waybills",
            get(handlers::a001_project::waybills_by_project),
        )
        .route("/api/suppliers", get(handlers::a002_supplier::list_all))
        .route(
            "/api/suppliers/:id/summary",
            get(handlers::a002_supplier::summary),
        )
        // Import audits
        .route(
            "/api/import-audits",
            get(handlers::a006_import_audit::list_all),
        )
        .layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
