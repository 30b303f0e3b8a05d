use std::net::SocketAddr;
use std::path::PathBuf;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use wishlist_api::{AppStateInner, router};
use wishlist_db::{Database, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wishlist_server=debug,wishlist_api=debug,wishlist_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let db_path = std::env::var("WISHLIST_DB_PATH").unwrap_or_else(|_| "wishlist.db".into());
    let host = std::env::var("WISHLIST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("WISHLIST_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let reset = std::env::var("WISHLIST_RESET_DB")
        .map(|v| matches!(v.as_str(), "1" | "true"))
        .unwrap_or(false);

    // Init database
    let db = Database::open(&PathBuf::from(&db_path))?;
    if reset {
        warn!("WISHLIST_RESET_DB is set, dropping all wishlist data");
        db.reset()?;
    }

    // Repositories are built once and shared by every request.
    let state = AppStateInner::new(Registry::new(db));

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Wishlist server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
