//! Request middleware: the authorization gate and development-mode error
//! detail.

use auth::policy::{Access, Operation, authorize_access};
use auth::UserRepository;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use crate::error::{ApiError, InternalDetail, error_body};
use crate::repositories::RideRepository;
use crate::state::{AppState, Stores};

/// The operation served by `method` on the matched route template.
/// `HEAD` is served by the `GET` handler and shares its operation.
pub fn operation_for(method: &Method, path: &str) -> Option<Operation> {
    let method = if *method == Method::HEAD {
        &Method::GET
    } else {
        method
    };

    let record_path = path
        .strip_prefix("/api/customers")
        .or_else(|| path.strip_prefix("/api/customer"));

    let operation = match (method, path, record_path) {
        (&Method::GET, "/", _) => Operation::Index,
        (&Method::GET, "/health", _) => Operation::Health,
        (&Method::POST, "/api/auth/register", _) => Operation::Register,
        (&Method::POST, "/api/auth/login", _) => Operation::Login,
        (&Method::POST, "/api/auth/change-password", _) => Operation::ChangePassword,
        (&Method::GET, "/api/auth/profile", _) => Operation::Profile,
        (&Method::GET, "/api/admin/users", _) => Operation::ListUsers,
        (&Method::GET, "/api/admin/stats", _) => Operation::AdminStats,
        (&Method::GET, _, Some("")) => Operation::ListRides,
        (&Method::POST, _, Some("")) => Operation::CreateRide,
        (&Method::GET, _, Some("/totals")) => Operation::RideTotals,
        (&Method::GET, _, Some("/monthly")) => Operation::MonthlyEarnings,
        (&Method::GET, _, Some("/:id")) => Operation::GetRide,
        (&Method::PUT, _, Some("/:id")) => Operation::UpdateRide,
        (&Method::DELETE, _, Some("/:id")) => Operation::DeleteRide,
        _ => return None,
    };

    Some(operation)
}

/// Authorization gate
///
/// Looks the route up in the policy table, verifies the bearer token for
/// gated routes and stores the caller's [`auth::Identity`] in the request
/// extensions. A method the route does not serve has no entry and is left
/// to the router, which answers 405.
pub async fn authorize_request<U, R>(
    State(state): State<AppState<U, R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let operation = req
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| operation_for(req.method(), path.as_str()));

    let Some(operation) = operation else {
        return Ok(next.run(req).await);
    };
    let access = operation.required_access();

    if access != Access::Public {
        let bearer = req.headers().typed_get::<Authorization<Bearer>>();
        let identity = state.auth.verify(bearer.as_ref().map(|b| b.token()))?;
        authorize_access(access, Some(&identity))?;

        debug!(
            "Authorized {} for {:?} ({:?})",
            identity.username, operation, access
        );
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// Echo internal error details to clients when the development flag is
/// set. Without the flag the generic 500 body goes out unchanged.
pub async fn expose_internal_errors<U, R>(
    State(state): State<AppState<U, R>>,
    req: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let mut response = next.run(req).await;

    if !state.expose_internal_errors {
        return response;
    }

    match response.extensions_mut().remove::<InternalDetail>() {
        Some(InternalDetail(detail)) => {
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", &detail)
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_routes_map_under_both_prefixes() {
        for prefix in ["/api/customer", "/api/customers"] {
            assert_eq!(
                operation_for(&Method::GET, prefix),
                Some(Operation::ListRides)
            );
            assert_eq!(
                operation_for(&Method::DELETE, &format!("{prefix}/:id")),
                Some(Operation::DeleteRide)
            );
            assert_eq!(
                operation_for(&Method::GET, &format!("{prefix}/totals")),
                Some(Operation::RideTotals)
            );
        }
    }

    #[test]
    fn admin_and_auth_routes_map_to_their_operations() {
        assert_eq!(
            operation_for(&Method::GET, "/api/admin/stats"),
            Some(Operation::AdminStats)
        );
        assert_eq!(
            operation_for(&Method::POST, "/api/auth/change-password"),
            Some(Operation::ChangePassword)
        );
    }

    #[test]
    fn head_shares_the_get_operation() {
        assert_eq!(
            operation_for(&Method::HEAD, "/health"),
            Some(Operation::Health)
        );
        assert_eq!(
            operation_for(&Method::HEAD, "/api/admin/users"),
            Some(Operation::ListUsers)
        );
        assert_eq!(operation_for(&Method::HEAD, "/api/auth/login"), None);
    }

    #[test]
    fn every_served_route_has_an_operation() {
        let mut served = vec![
            (Method::GET, "/".to_string()),
            (Method::GET, "/health".to_string()),
            (Method::POST, "/api/auth/register".to_string()),
            (Method::POST, "/api/auth/login".to_string()),
            (Method::POST, "/api/auth/change-password".to_string()),
            (Method::GET, "/api/auth/profile".to_string()),
            (Method::GET, "/api/admin/users".to_string()),
            (Method::GET, "/api/admin/stats".to_string()),
        ];
        for prefix in crate::routes::RECORD_PREFIXES {
            served.extend([
                (Method::GET, prefix.to_string()),
                (Method::POST, prefix.to_string()),
                (Method::GET, format!("{prefix}/totals")),
                (Method::GET, format!("{prefix}/monthly")),
                (Method::GET, format!("{prefix}/:id")),
                (Method::PUT, format!("{prefix}/:id")),
                (Method::DELETE, format!("{prefix}/:id")),
            ]);
        }

        for (method, path) in served {
            assert!(
                operation_for(&method, &path).is_some(),
                "{method} {path} has no policy entry"
            );
        }
    }

    #[test]
    fn unlisted_routes_have_no_operation() {
        assert_eq!(operation_for(&Method::GET, "/api/secret"), None);
        assert_eq!(operation_for(&Method::PATCH, "/api/customer/:id"), None);
        assert_eq!(operation_for(&Method::GET, "/api/customerz"), None);
    }
}
