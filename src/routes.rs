use crate::{
    api::{leave_request, leave_type},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

/// Builds a per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let scope = web::scope(&config.api_prefix)
        .wrap(from_fn(auth_middleware)) // authentication
        .configure(leave_routes);

    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => cfg.service(scope.wrap(limiter)), // rate limiting
        None => {
            tracing::warn!(
                rate = config.rate_protected_per_min,
                "Invalid rate limit, serving without limiter"
            );
            cfg.service(scope)
        }
    };
}

/// Leave endpoints, relative to the API prefix.
pub fn leave_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/leave-types").route(web::get().to(leave_type::list_leave_types)),
    )
    .service(
        web::scope("/leave")
            // /leave
            .service(
                web::resource("")
                    .route(web::get().to(leave_request::leave_list))
                    .route(web::post().to(leave_request::create_leave)),
            )
            // /leave/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(leave_request::get_leave))
                    .route(web::put().to(leave_request::update_leave))
                    .route(web::delete().to(leave_request::delete_leave)),
            )
            // /leave/{id}/approvals
            .service(
                web::resource("/{id}/approvals")
                    .route(web::post().to(leave_request::record_approval)),
            )
            // /leave/{id}/cancel
            .service(
                web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)),
            )
            // /leave/{id}/status
            .service(
                web::resource("/{id}/status")
                    .route(web::put().to(leave_request::refresh_status)),
            ),
    );
}

// API REQUEST
//  └─ Authorization: Bearer access_token (issued by the identity service)

// LEAVE LIFECYCLE
//  requested ─(approver opens)─> in_review ─(some level approves)─> in_process
//     └──────────────(every level approved)──────────────> approved
//  any denial ─> denied;  employee cancels while open ─> cancellation_requested
