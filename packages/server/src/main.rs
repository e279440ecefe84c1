use anyhow::Context;
use api::db::{self, Database, MemoryDatabase, PgDatabase};
use api::settings::{Auth, Settings};
use api::AppState;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("failed to load settings")?;
    if settings.auth.jwt_secret == Auth::default().jwt_secret {
        warn!("using the built-in JWT secret; set APP_AUTH__JWT_SECRET in production");
    }

    if settings.database.is_memory() {
        info!("using the in-memory database; data is lost on exit");
        serve(MemoryDatabase::new(), &settings).await
    } else {
        info!("Connecting to database...");
        let pool = db::connect(&settings.database)
            .await
            .context("failed to connect to database")?;
        db::migrate(&pool)
            .await
            .context("failed to run migrations")?;
        serve(PgDatabase::new(pool), &settings).await
    }
}

async fn serve<D: Database>(db: D, settings: &Settings) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&settings.uploads.dir)
        .await
        .with_context(|| format!("failed to create upload dir {}", settings.uploads.dir))?;

    let app = api::router(AppState::new(db, settings));

    let address = settings.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
