//! Language-learning roleplay web server
//!
//! Teachers author roleplay scenarios with generated previews; students join
//! by code and talk to the roleplay's conversational agent.

use duckcat_api::api;
use duckcat_api::config::Config;
use duckcat_api::core::preferences::PreferenceCache;
use duckcat_api::core::services::{
    MyRoleplayService, MyTeacherService, MyVoiceSessionService, PreviewDrafts,
};
use duckcat_api::core::voice::SessionRegistry;
use duckcat_api::infrastructure::backend::{HttpConversationProvider, HttpGenerationBackend};
use duckcat_api::infrastructure::database::DatabaseConnection;
use duckcat_api::infrastructure::repositories::{DbRoleplayRepository, DbTeacherRepository};
use duckcat_api::infrastructure::storage::HostedObjectStore;
use duckcat_api::infrastructure::voice::WsVoiceLink;

use axum::http::{HeaderValue, Method};
use axum::response::Html;
use axum::{Router, routing::get};
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::info;
use tokio::runtime::{Builder, Runtime};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task());

    Ok(())
}

async fn web_server_task() {
    let config = Config::from_env().expect("configuration must be valid");
    let bind_address = config.bind_address;

    let provider = ServiceCollection::new()
        .add(Config::singleton())
        .add(DatabaseConnection::singleton())
        .add(HostedObjectStore::singleton())
        .add(HttpGenerationBackend::singleton())
        .add(HttpConversationProvider::singleton())
        .add(WsVoiceLink::singleton())
        .add(PreferenceCache::singleton())
        .add(PreviewDrafts::singleton())
        .add(SessionRegistry::singleton())
        .add(DbTeacherRepository::scoped())
        .add(DbRoleplayRepository::scoped())
        .add(MyTeacherService::scoped())
        .add(MyRoleplayService::scoped())
        .add(MyVoiceSessionService::scoped())
        .build_provider()
        .unwrap();

    // build our application with a route
    let app = Router::new()
        .route("/", get(index))
        .nest_service(
            "/static",
            ServiceBuilder::new().service(ServeDir::new("static")),
        )
        .route("/auth/login", get(api::auth::login))
        .nest("/api/roleplays", api::roleplays::router())
        .nest("/api/teachers", api::teachers::router())
        .route("/api/languages", get(api::teachers::list_languages))
        .nest("/api/sessions", api::sessions::router())
        .nest("/api/conversations", api::conversations::router())
        .route("/api/vocabulary", get(api::vocabulary::list_vocabulary))
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_origin([
                    "http://localhost:3000".parse::<HeaderValue>().unwrap(),
                    "http://localhost:5173".parse::<HeaderValue>().unwrap(),
                ]),
        )
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(bind_address).await.unwrap();
    info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
    info!("Shutting down...");
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}
