use crate::{
    api::{attendance, employee, payroll, reports},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Per-route limiter config; the Governor middleware itself is built at
    // each wrap site since the config is what is shareable.
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::scope("/employes")
                    // /employes
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employe))
                            .route(web::get().to(employee::list_employes)),
                    )
                    // /employes/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employe))
                            .route(web::get().to(employee::get_employe)),
                    ),
            )
            // saisie d'un pointage (chef de chantier)
            .service(
                web::resource("/pointage").route(web::post().to(attendance::create_pointage)),
            )
            // relecture de la grille de pointage
            .service(
                web::resource("/pointages").route(web::get().to(attendance::list_pointages)),
            )
            // fiche de paie dérivée
            .service(
                web::resource("/paie/{employe_id}").route(web::get().to(payroll::get_paie)),
            )
            // tableau de bord récapitulatif
            .service(web::resource("/rapports").route(web::get().to(reports::get_rapports))),
    );
}
