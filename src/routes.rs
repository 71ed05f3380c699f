use crate::{
    api::{presence, terminal},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // PIN entry gets its own tight limiter; everything else shares one.
    let verify_limiter = Arc::new(build_limiter(config.rate_verify_per_min));
    let terminal_limiter = Arc::new(build_limiter(config.rate_terminal_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/terminal")
                    .service(
                        web::resource("/verify")
                            .wrap(verify_limiter)
                            .route(web::post().to(terminal::verify)),
                    )
                    .service(
                        web::scope("")
                            .wrap(terminal_limiter)
                            .service(
                                web::resource("/state").route(web::get().to(terminal::get_state)),
                            )
                            .service(
                                web::resource("/branch")
                                    .route(web::post().to(terminal::select_branch)),
                            )
                            .service(
                                web::resource("/branch/clear")
                                    .route(web::post().to(terminal::clear_branch)),
                            )
                            .service(
                                web::resource("/location")
                                    .route(web::post().to(terminal::report_location)),
                            )
                            .service(
                                web::resource("/clock").route(web::post().to(terminal::clock)),
                            )
                            .service(
                                web::resource("/reset").route(web::post().to(terminal::reset)),
                            )
                            .service(
                                web::resource("/connectivity")
                                    .route(web::post().to(terminal::connectivity)),
                            ),
                    ),
            )
            .service(web::resource("/presence").route(web::get().to(presence::live_roster))),
    );
}

// KIOSK FLOW
//  branch-setup ── select branch (or QR ?branch=) ──▶ authenticating
//  authenticating ── verify id+pin ──▶ session-active
//  session-active ── clock in/out ──▶ result ── timeout/reset ──▶ authenticating
//  any state ── switch branch ──▶ branch-setup

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Data;
    use actix_web::{App, test};
    use std::time::Duration;

    use crate::model::shop::ShopRegistry;
    use crate::store::local::temp_store;
    use crate::store::memory::MemoryRemoteStore;
    use crate::terminal::connectivity::Connectivity;
    use crate::terminal::geofence::GeofencePolicy;
    use crate::terminal::machine::Terminal;
    use crate::terminal::presence::PresenceChannel;

    fn config(prefix: &str) -> Config {
        Config {
            server_addr: "127.0.0.1:0".into(),
            data_dir: "data".into(),
            remote_url: String::new(),
            remote_api_key: String::new(),
            shops_file: None,
            geofence_radius_m: 1500.0,
            result_reset_secs: 6,
            rate_verify_per_min: 30,
            rate_terminal_per_min: 600,
            api_prefix: prefix.into(),
        }
    }

    fn terminal() -> Terminal {
        Terminal::new(
            ShopRegistry::default(),
            GeofencePolicy { radius_m: 1500.0 },
            Duration::from_secs(6),
            Arc::new(MemoryRemoteStore::new()),
            Arc::new(temp_store()),
            Arc::new(Connectivity::new(true)),
            PresenceChannel::new(),
        )
    }

    #[actix_web::test]
    async fn routes_mount_at_root_by_default() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(tokio::sync::Mutex::new(terminal())))
                .configure(|cfg| configure(cfg, config(""))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/terminal/state")
            .peer_addr("127.0.0.1:9000".parse().unwrap())
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    #[actix_web::test]
    async fn api_prefix_moves_the_whole_surface() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(tokio::sync::Mutex::new(terminal())))
                .configure(|cfg| configure(cfg, config("/kiosk"))),
        )
        .await;

        let hit = test::TestRequest::get()
            .uri("/kiosk/terminal/state")
            .peer_addr("127.0.0.1:9000".parse().unwrap())
            .to_request();
        assert!(test::call_service(&app, hit).await.status().is_success());

        let miss = test::TestRequest::get()
            .uri("/terminal/state")
            .peer_addr("127.0.0.1:9000".parse().unwrap())
            .to_request();
        assert_eq!(test::call_service(&app, miss).await.status(), 404);
    }
}
