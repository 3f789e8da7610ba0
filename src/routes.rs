use crate::{
    api::{adjustment, advance, attendance, holiday, location, payroll, penalty_rule, vault},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / u64::from(requests_per_min)).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiter)
            .service(
                web::scope("/locations")
                    .service(
                        web::resource("")
                            .route(web::get().to(location::list_locations))
                            .route(web::post().to(location::create_location)),
                    )
                    .service(web::resource("/validate").route(web::post().to(location::validate_location)))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(location::update_location))
                            .route(web::delete().to(location::delete_location)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::create_attendance)),
                    )
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
                    .service(web::resource("/summary").route(web::get().to(attendance::attendance_summary)))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance::update_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/advances")
                    .service(
                        web::resource("")
                            .route(web::get().to(advance::list_advances))
                            .route(web::post().to(advance::create_advance)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(advance::get_advance)))
                    .service(web::resource("/{id}/approve").route(web::post().to(advance::approve_advance)))
                    .service(web::resource("/{id}/cancel").route(web::post().to(advance::cancel_advance))),
            )
            .service(
                web::scope("/adjustments")
                    .service(
                        web::resource("")
                            .route(web::get().to(adjustment::list_adjustments))
                            .route(web::post().to(adjustment::create_adjustment)),
                    )
                    .service(web::resource("/{id}").route(web::delete().to(adjustment::delete_adjustment))),
            )
            .service(
                web::scope("/payroll")
                    .service(web::resource("").route(web::get().to(payroll::list_periods)))
                    .service(web::resource("/calculate").route(web::post().to(payroll::calculate_payroll)))
                    .service(web::resource("/{id}").route(web::get().to(payroll::get_period)))
                    .service(web::resource("/{id}/approve").route(web::post().to(payroll::approve_payroll)))
                    .service(web::resource("/{id}/disburse").route(web::post().to(payroll::disburse_payroll))),
            )
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(web::resource("/{id}").route(web::delete().to(holiday::deactivate_holiday))),
            )
            .service(
                web::scope("/penalty-rules")
                    .service(
                        web::resource("")
                            .route(web::get().to(penalty_rule::list_rules))
                            .route(web::post().to(penalty_rule::create_rule)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(penalty_rule::update_rule))
                            .route(web::delete().to(penalty_rule::deactivate_rule)),
                    ),
            )
            .service(web::scope("/vaults").service(web::resource("").route(web::get().to(vault::list_vaults)))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PayrollConfig;
    use actix_web::{App, http::StatusCode, test, web::Data};

    fn test_config() -> Config {
        Config {
            database_url: "mysql://localhost/unused".into(),
            jwt_secret: "secret".into(),
            server_addr: "127.0.0.1:0".into(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            payroll: PayrollConfig::default(),
        }
    }

    #[actix_web::test]
    async fn protected_routes_require_a_bearer_token() {
        let config = test_config();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config.clone()))
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/vaults")
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "unauthorized");
    }

    #[actix_web::test]
    async fn malformed_tokens_are_rejected() {
        let config = test_config();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config.clone()))
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/payroll/calculate")
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
