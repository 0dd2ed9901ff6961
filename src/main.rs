mod access;
mod config;
mod db;
mod error;
mod handlers;
mod mailer;
mod middleware;
mod models;
mod pagination;
mod services;
mod slug;
mod storage;
mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::mailer::{LogMailer, Mailer};
use crate::models::{CatalogKind, MarketKind, TaxonomyKind};
use crate::storage::StorageProvider;

/// Largest accepted request body; license documents and images are
/// capped well below this per attachment kind.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub storage: Arc<dyn StorageProvider>,
    pub mailer: Arc<dyn Mailer>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medmarket=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MedMarket...");

    // Load configuration
    let config = Config::load()?;
    let config = Arc::new(config);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Storage backend and outbound mail
    let storage = storage::from_config(&config.storage);
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);

    // Create app state
    let state = AppState {
        db,
        config: config.clone(),
        storage,
        mailer,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes; responses still depend on who is asking, so the
    // optional auth middleware resolves the actor when a token is sent
    let public_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/auth/register/manufacturer",
            post(handlers::auth::register_manufacturer),
        )
        .route(
            "/auth/register/healthcare",
            post(handlers::auth::register_healthcare),
        )
        .route("/auth/register/admin", post(handlers::auth::register_admin))
        .route("/auth/verify-email", get(handlers::auth::verify_email))
        .route(
            "/auth/send-email-verification",
            post(handlers::auth::send_email_verification),
        )
        .route("/news", get(handlers::content::news_list))
        .route("/news/:id_or_slug", get(handlers::content::news_get))
        .route("/gov-affairs", get(handlers::content::gov_affair_list))
        .route("/gov-affairs/:id_or_slug", get(handlers::content::gov_affair_get))
        .route("/countries", get(handlers::taxonomy::countries))
        .route("/countries/:id", get(handlers::taxonomy::country))
        .route(
            "/industry-categories",
            get(handlers::taxonomy::industry_categories),
        )
        .route(
            "/industry-categories/:id",
            get(handlers::taxonomy::industry_category),
        )
        .merge(catalog_public(CatalogKind::Product))
        .merge(catalog_public(CatalogKind::Service))
        .merge(market_public(MarketKind::Regulation))
        .merge(market_public(MarketKind::Marketing))
        .merge(taxonomy_public(TaxonomyKind::ProductCategory))
        .merge(taxonomy_public(TaxonomyKind::ServiceCategory))
        .merge(taxonomy_public(TaxonomyKind::RegulationServiceCategory))
        .merge(taxonomy_public(TaxonomyKind::MarketingServiceCategory))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_auth,
        ));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Admin user directory
        .route("/users", get(handlers::user::list))
        .route("/users/:id", get(handlers::user::get))
        // Profiles
        .route(
            "/manufacturer/profile",
            get(handlers::profile::manufacturer_profile)
                .put(handlers::profile::update_manufacturer_profile),
        )
        .route(
            "/healthcare/profile",
            get(handlers::profile::healthcare_profile)
                .put(handlers::profile::update_healthcare_profile),
        )
        // Regulation assessments
        .route(
            "/regulation-assessments",
            get(handlers::assessment::list).post(handlers::assessment::create),
        )
        .route(
            "/regulation-assessments/:id",
            get(handlers::assessment::get)
                .put(handlers::assessment::update_status)
                .delete(handlers::assessment::destroy),
        )
        // Platform content
        .route("/news", post(handlers::content::news_create))
        .route(
            "/news/:id_or_slug",
            put(handlers::content::news_update).delete(handlers::content::news_destroy),
        )
        .route("/gov-affairs", post(handlers::content::gov_affair_create))
        .route(
            "/gov-affairs/:id_or_slug",
            put(handlers::content::gov_affair_update)
                .delete(handlers::content::gov_affair_destroy),
        )
        .merge(catalog_protected(CatalogKind::Product))
        .merge(catalog_protected(CatalogKind::Service))
        .merge(market_protected(MarketKind::Regulation))
        .merge(market_protected(MarketKind::Marketing))
        .merge(taxonomy_protected(TaxonomyKind::ProductCategory))
        .merge(taxonomy_protected(TaxonomyKind::ServiceCategory))
        .merge(taxonomy_protected(TaxonomyKind::RegulationServiceCategory))
        .merge(taxonomy_protected(TaxonomyKind::MarketingServiceCategory))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Combine all routes under /v1; stored objects are served at the
    // root, matching the urls persisted on upload rows
    Router::new()
        .nest("/v1", public_routes.merge(protected_routes))
        .route("/uploads/*key", get(handlers::uploads::serve))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Read side of a catalog subtree. The [`Extension`] layer tags every
/// route with the kind the shared handlers should act on.
fn catalog_public(kind: CatalogKind) -> Router<AppState> {
    let base = kind.base_path();
    let mut router = Router::new()
        .route(base, get(handlers::catalog::list))
        .route(&format!("{base}/:id_or_slug"), get(handlers::catalog::get))
        .route(
            &format!("{base}/:id_or_slug/media"),
            get(handlers::catalog_detail::media_list),
        )
        .route(
            &format!("{base}/:id_or_slug/specifications"),
            get(handlers::catalog_detail::specification_list),
        )
        .route(
            &format!("{base}/:id_or_slug/clinical-applications"),
            get(handlers::catalog_detail::clinical_application_list),
        )
        .route(
            &format!("{base}/:id_or_slug/workflows"),
            get(handlers::catalog_detail::workflow_list),
        )
        .route(
            &format!("{base}/:id_or_slug/question-answers"),
            get(handlers::catalog_detail::qa_list),
        )
        .route(
            &format!("{base}/:id_or_slug/user-manuals"),
            get(handlers::catalog_detail::manual_list),
        );
    if kind == CatalogKind::Product {
        router = router.route(
            &format!("{base}/:id_or_slug/comparisons"),
            get(handlers::comparison::list),
        );
    }
    router.layer(Extension(kind))
}

/// Write side of a catalog subtree
fn catalog_protected(kind: CatalogKind) -> Router<AppState> {
    let base = kind.base_path();
    let mut router = Router::new()
        .route(base, post(handlers::catalog::create))
        .route(
            &format!("{base}/:id_or_slug"),
            put(handlers::catalog::update).delete(handlers::catalog::destroy),
        )
        .route(
            &format!("{base}/:id_or_slug/media"),
            post(handlers::catalog_detail::media_store),
        )
        .route(
            &format!("{base}/:id_or_slug/media/:media_id"),
            delete(handlers::catalog_detail::media_destroy),
        )
        .route(
            &format!("{base}/:id_or_slug/specifications"),
            post(handlers::catalog_detail::specification_store),
        )
        .route(
            &format!("{base}/:id_or_slug/specifications/:spec_id"),
            put(handlers::catalog_detail::specification_update)
                .delete(handlers::catalog_detail::specification_destroy),
        )
        .route(
            &format!("{base}/:id_or_slug/clinical-applications"),
            post(handlers::catalog_detail::clinical_application_store),
        )
        .route(
            &format!("{base}/:id_or_slug/clinical-applications/:application_id"),
            put(handlers::catalog_detail::clinical_application_update)
                .delete(handlers::catalog_detail::clinical_application_destroy),
        )
        .route(
            &format!("{base}/:id_or_slug/workflows"),
            post(handlers::catalog_detail::workflow_store),
        )
        .route(
            &format!("{base}/:id_or_slug/workflows/:workflow_id"),
            put(handlers::catalog_detail::workflow_update)
                .delete(handlers::catalog_detail::workflow_destroy),
        )
        .route(
            &format!("{base}/:id_or_slug/question-answers"),
            post(handlers::catalog_detail::qa_store),
        )
        .route(
            &format!("{base}/:id_or_slug/question-answers/:qa_id"),
            put(handlers::catalog_detail::qa_update)
                .delete(handlers::catalog_detail::qa_destroy),
        )
        .route(
            &format!("{base}/:id_or_slug/user-manuals"),
            post(handlers::catalog_detail::manual_store),
        )
        .route(
            &format!("{base}/:id_or_slug/user-manuals/:manual_id"),
            delete(handlers::catalog_detail::manual_destroy),
        );
    if kind == CatalogKind::Product {
        router = router
            .route(
                &format!("{base}/:id_or_slug/comparisons"),
                post(handlers::comparison::store),
            )
            .route(
                &format!("{base}/:id_or_slug/comparisons/:comparison_id"),
                put(handlers::comparison::update).delete(handlers::comparison::destroy),
            );
    }
    router.layer(Extension(kind))
}

fn market_public(kind: MarketKind) -> Router<AppState> {
    let base = kind.base_path();
    Router::new()
        .route(base, get(handlers::content::market_list))
        .route(&format!("{base}/:id"), get(handlers::content::market_get))
        .layer(Extension(kind))
}

fn market_protected(kind: MarketKind) -> Router<AppState> {
    let base = kind.base_path();
    Router::new()
        .route(base, post(handlers::content::market_create))
        .route(
            &format!("{base}/:id"),
            put(handlers::content::market_update).delete(handlers::content::market_destroy),
        )
        .layer(Extension(kind))
}

fn taxonomy_public(kind: TaxonomyKind) -> Router<AppState> {
    let base = kind.base_path();
    Router::new()
        .route(base, get(handlers::taxonomy::list))
        .route(&format!("{base}/:id"), get(handlers::taxonomy::get))
        .layer(Extension(kind))
}

fn taxonomy_protected(kind: TaxonomyKind) -> Router<AppState> {
    let base = kind.base_path();
    Router::new()
        .route(base, post(handlers::taxonomy::create))
        .route(
            &format!("{base}/:id"),
            put(handlers::taxonomy::update).delete(handlers::taxonomy::destroy),
        )
        .layer(Extension(kind))
}
