use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod config;
mod docs;
mod model;
mod routes;
mod store;
mod terminal;

use config::Config;
use model::shop::ShopRegistry;
use store::local::LocalStore;
use store::remote::RemoteStore;
use store::rest::RestRemoteStore;
use terminal::connectivity::Connectivity;
use terminal::geofence::GeofencePolicy;
use terminal::machine::Terminal;
use terminal::presence::{PresenceChannel, PresenceRoster};
use terminal::sync::{SyncReconciler, run_connectivity_sync};

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance Terminal"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Terminal starting...");

    let registry = match &config.shops_file {
        Some(path) => ShopRegistry::from_file(Path::new(path))
            .expect("SHOPS_FILE is set but could not be loaded"),
        None => ShopRegistry::default(),
    };

    let local =
        Arc::new(LocalStore::open(config.data_dir.clone()).expect("Failed to open data dir"));
    let remote: Arc<dyn RemoteStore> =
        Arc::new(RestRemoteStore::new(&config.remote_url, &config.remote_api_key)
            .expect("Invalid remote store configuration"));

    let connectivity = Arc::new(Connectivity::new(true));
    let presence = PresenceChannel::new();
    let roster = PresenceRoster::spawn(&presence);

    let terminal = Terminal::new(
        registry,
        GeofencePolicy {
            radius_m: config.geofence_radius_m,
        },
        Duration::from_secs(config.result_reset_secs),
        remote.clone(),
        local,
        connectivity.clone(),
        presence,
    );
    let reconciler = Arc::new(SyncReconciler::new(terminal.queue(), remote));

    // Startup pass: drain anything buffered while the device was off.
    let startup_reconciler = reconciler.clone();
    actix_web::rt::spawn(async move {
        match startup_reconciler.drain().await {
            Ok(report) if report.pending > 0 => {
                warn!(pending = report.pending, "Punches still pending after startup sync");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Startup sync failed"),
        }
    });

    // Drain again on every offline→online transition.
    actix_web::rt::spawn(run_connectivity_sync(reconciler, connectivity.clone()));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let terminal_data = Data::new(tokio::sync::Mutex::new(terminal));

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(terminal_data.clone())
            .app_data(Data::new(connectivity.clone()))
            .app_data(Data::new(roster.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
