use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobgrid_common::Config;
use jobgrid_graph::{GraphMaintainer, GraphReader, Projector};
use jobgrid_realtime::{ChatService, ConnectionRegistry, Notifier};
use jobgrid_store::{EntityStore, MemoryStore, PgStore};

mod auth;
mod error;
mod rest;
mod ws;

pub struct AppState {
    pub maintainer: GraphMaintainer,
    pub reader: GraphReader,
    pub projector: Projector,
    pub registry: Arc<ConnectionRegistry>,
    pub notifier: Notifier,
    pub chat: ChatService,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobgrid=info".parse()?))
        .init();

    let config = Config::from_env();

    let store: Arc<dyn EntityStore> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url).await?;
            pg.ensure_schema().await?;
            info!("connected to postgres store");
            Arc::new(pg)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let registry = Arc::new(ConnectionRegistry::new());
    let state = Arc::new(AppState {
        maintainer: GraphMaintainer::new(store.clone()),
        reader: GraphReader::new(store.clone()),
        projector: Projector::new(store.clone()),
        registry: registry.clone(),
        notifier: Notifier::new(store.clone(), registry.clone()),
        chat: ChatService::new(store, registry),
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "jobgrid is running" }))
        // Users
        .route("/api/users", post(rest::users::signup).get(rest::users::list))
        .route("/api/users/{id}", get(rest::users::detail).patch(rest::users::update))
        .route("/api/users/{id}/role", patch(rest::users::register_recruiter))
        .route("/api/users/follow", put(rest::users::follow))
        .route("/api/users/unfollow", put(rest::users::unfollow))
        .route("/api/users/{id}/notifications", get(rest::users::notifications))
        .route("/api/users/{id}/bookmarks", get(rest::users::bookmarks))
        .route("/api/notifications/{id}/read", patch(rest::notifications::mark_read))
        // Posts
        .route("/api/posts", get(rest::posts::list).post(rest::posts::create))
        .route("/api/posts/search", get(rest::posts::search))
        .route("/api/posts/user/{id}", get(rest::posts::by_user))
        .route(
            "/api/posts/{id}",
            get(rest::posts::detail).patch(rest::posts::update).delete(rest::posts::remove),
        )
        .route("/api/posts/{id}/like", put(rest::posts::like))
        .route("/api/posts/{id}/unlike", put(rest::posts::unlike))
        .route("/api/posts/{id}/unicorn", put(rest::posts::unicorn))
        .route("/api/posts/{id}/ununicorn", put(rest::posts::ununicorn))
        .route("/api/posts/{id}/bookmark", put(rest::posts::bookmark))
        .route("/api/posts/{id}/unbookmark", put(rest::posts::unbookmark))
        .route("/api/posts/{id}/tags", patch(rest::posts::sync_tags))
        .route(
            "/api/posts/{id}/comments",
            get(rest::posts::comments).post(rest::posts::comment),
        )
        .route("/api/comments/{id}", delete(rest::posts::remove_comment))
        // Jobs
        .route("/api/jobs", get(rest::jobs::list).post(rest::jobs::create))
        .route("/api/jobs/user/{id}", get(rest::jobs::by_user))
        .route("/api/jobs/company/{id}", get(rest::jobs::by_company))
        .route(
            "/api/jobs/{id}",
            get(rest::jobs::detail).patch(rest::jobs::update).delete(rest::jobs::remove),
        )
        .route("/api/jobs/{id}/bookmark", put(rest::jobs::bookmark))
        .route("/api/jobs/{id}/unbookmark", put(rest::jobs::unbookmark))
        .route("/api/jobs/{id}/tags", patch(rest::jobs::sync_tags))
        // CVs
        .route("/api/cvs", get(rest::cvs::list).post(rest::cvs::create))
        .route("/api/cvs/user/{id}", get(rest::cvs::by_user))
        .route("/api/cvs/{id}", get(rest::cvs::detail).delete(rest::cvs::remove))
        // Applications
        .route(
            "/api/applications",
            get(rest::applications::list).post(rest::applications::create),
        )
        .route("/api/applications/user/{id}", get(rest::applications::by_user))
        .route("/api/applications/job/{id}", get(rest::applications::by_job))
        .route(
            "/api/applications/{id}",
            get(rest::applications::detail)
                .patch(rest::applications::decide)
                .delete(rest::applications::remove),
        )
        // Companies
        .route(
            "/api/companies",
            get(rest::companies::list).post(rest::companies::create),
        )
        .route("/api/companies/search", get(rest::companies::search))
        .route(
            "/api/companies/{id}",
            get(rest::companies::detail)
                .patch(rest::companies::update)
                .delete(rest::companies::remove),
        )
        .route(
            "/api/companies/{id}/members/{user_id}",
            patch(rest::companies::add_member).delete(rest::companies::remove_member),
        )
        // Tags
        .route("/api/tags", get(rest::tags::list))
        .route("/api/tags/name/{name}", get(rest::tags::by_name))
        .route("/api/tags/follow", put(rest::tags::follow))
        .route("/api/tags/unfollow", put(rest::tags::unfollow))
        .route("/api/tags/{id}", get(rest::tags::detail).delete(rest::tags::remove))
        // Chat
        .route("/api/rooms", post(rest::rooms::create))
        .route("/api/rooms/{user_id}", get(rest::rooms::by_user))
        .route(
            "/api/messages",
            post(rest::messages::create),
        )
        .route("/api/messages/{room_id}", get(rest::messages::by_room))
        // Realtime socket
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "jobgrid api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
