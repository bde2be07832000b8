use crate::{
    api::{leave_request, report, school, sync_status, teacher},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
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

    let submit_limiter = build_limiter(config.rate_submit_per_min);
    let general_limiter = build_limiter(config.rate_general_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Governor::new(&general_limiter)) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .wrap(Governor::new(&submit_limiter))
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/report")
                    // /report/{teacher_id}
                    .service(
                        web::resource("/{teacher_id}").route(web::get().to(report::get_report)),
                    ),
            )
            .service(
                web::scope("/teachers")
                    // /teachers
                    .service(web::resource("").route(web::get().to(teacher::list_teachers)))
                    // /teachers/{id}
                    .service(web::resource("/{id}").route(web::get().to(teacher::get_teacher))),
            )
            .service(
                web::scope("/schools")
                    .service(web::resource("").route(web::get().to(school::list_schools))),
            )
            .service(
                web::scope("/sync")
                    // /sync/status
                    .service(
                        web::resource("/status").route(web::get().to(sync_status::get_sync_status)),
                    ),
            ),
    );
}
