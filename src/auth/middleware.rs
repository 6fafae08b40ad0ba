use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    web::Data,
};
use serde_json::{Value, json};
use tracing::debug;

/// Why a request was turned away before reaching a leave handler.
#[derive(Debug, PartialEq, Eq)]
enum Rejection {
    MissingHeader,
    BadEncoding,
    NotBearer,
}

impl Rejection {
    fn message(&self) -> &'static str {
        match self {
            Rejection::MissingHeader => "Missing Authorization header",
            Rejection::BadEncoding => "Invalid Authorization header encoding",
            Rejection::NotBearer => "Authorization header must start with Bearer",
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Result<&str, Rejection> {
    let value = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(Rejection::MissingHeader)?
        .to_str()
        .map_err(|_| Rejection::BadEncoding)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(Rejection::NotBearer)
}

fn unauthorized(req: ServiceRequest, body: Value) -> ServiceResponse<BoxBody> {
    debug!(path = %req.path(), %body, "Rejected unauthenticated request");
    let resp = HttpResponse::Unauthorized().json(body);
    req.into_response(resp.map_into_boxed_body())
}

/// Verifies the bearer token and stores the resulting [`AuthUser`] in the
/// request extensions for the extractor to pick up.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    let verified = match bearer_token(&req) {
        Ok(token) => verify_access_token(token, &config.jwt_secret)
            .map_err(|e| json!({"error": "Invalid or expired token", "details": e})),
        Err(rejection) => Err(json!({"error": rejection.message()})),
    };

    let claims = match verified {
        Ok(claims) => claims,
        Err(body) => return Ok(unauthorized(req, body)),
    };

    let Some(user) = AuthUser::from_claims(claims) else {
        return Ok(unauthorized(req, json!({"error": "Invalid role"})));
    };

    req.extensions_mut().insert(user);
    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::testing::{SECRET, token};
    use crate::models::TokenType;
    use actix_web::middleware::from_fn;
    use actix_web::{App, test, web};

    fn config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: SECRET.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            approval_policy: Default::default(),
        }
    }

    async fn whoami(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().json(json!({"user_id": user.user_id}))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new().app_data(Data::new(config())).service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .route("/me", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing Authorization header");
    }

    #[actix_web::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header((AUTHORIZATION, "Basic abc"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn refresh_token_is_rejected() {
        let app = app!();
        let refresh = token(7, 3, Some(70), &[], TokenType::Refresh);
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header((AUTHORIZATION, format!("Bearer {refresh}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn valid_access_token_reaches_handler() {
        let app = app!();
        let access = token(7, 3, Some(70), &[], TokenType::Access);
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header((AUTHORIZATION, format!("Bearer {access}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user_id"], 7);
    }
}
