use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use snaptex_api::{events, history, recognize, settings, users, AppStateInner};
use snaptex_api::settings::SettingsStore;
use snaptex_users::UserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snaptex=debug,tower_http=info".into()),
        )
        .init();

    // Config
    let data_dir = PathBuf::from(
        std::env::var("SNAPTEX_DATA_DIR").unwrap_or_else(|_| "data".into()),
    );
    let static_dir =
        std::env::var("SNAPTEX_STATIC_DIR").unwrap_or_else(|_| "static".into());
    let addr: SocketAddr = std::env::var("SNAPTEX_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:7420".into())
        .parse()?;

    std::fs::create_dir_all(&data_dir)?;

    // Stores
    let user_store = UserStore::open(data_dir.join("users.json"))?;
    let db = snaptex_db::Database::open(&data_dir.join("history.db"))?;
    let settings_store = SettingsStore::open(data_dir.join("settings.json"))?;

    let state = AppStateInner::new(user_store, db, settings_store);

    // Routes
    let app = Router::new()
        .route("/api/recognize", post(recognize::recognize))
        .route(
            "/api/history",
            get(history::list_history).delete(history::clear_history),
        )
        .route("/api/history/{id}", delete(history::delete_record))
        .route("/api/history/{id}/latex", put(history::update_latex))
        .route("/api/users", get(users::list_users).post(users::add_user))
        .route("/api/users/switch", post(users::switch_user))
        .route("/api/users/current", put(users::update_profile))
        .route("/api/users/{id}", delete(users::delete_user))
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        .route("/api/events", get(events::ws_upgrade))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("SnapTeX listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
