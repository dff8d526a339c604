use crate::{
    AppState,
    gate::{self, AccessGate},
    handlers, pages,
    policy::ADMIN_ROUTE,
};
use axum::{Router, middleware, routing::get};

/// Admin Router Module
///
/// Defines the routes reserved for the roles allowed into the `admin` route group
/// (by default the CEO and the COO).
///
/// Access Control:
/// Everything under `/admin` except the denial page runs behind the access gate. The gate
/// is attached with `route_layer`, so it only sees requests that matched one of the
/// guarded routes; unknown paths still 404. It resolves the session, checks the role
/// against the allow-list and either hands the `Session` to the handler through request
/// extensions or answers with a 307 to `/admin/access-denied`. The denial page is added
/// after the layer and stays unguarded, since guarding it would loop the redirect.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    let guarded = Router::new()
        // GET /admin
        // Dashboard with placeholder counts. Reads the permitted Session from the
        // request extensions to greet the user and list the allowed roles.
        .route("/", get(pages::dashboard))
        // GET /admin/api/stats
        // The same placeholder counts as JSON.
        .route("/api/stats", get(handlers::dashboard_stats))
        // Gate layer: built once here, decision recomputed on every request.
        .route_layer(middleware::from_fn_with_state(
            AccessGate::for_route(state, ADMIN_ROUTE),
            gate::access_gate,
        ));

    guarded
        // GET /admin/access-denied
        // Terminal page for every denied request. Renders 200 with a link home; the
        // reason for the denial is only logged, never shown.
        .route("/access-denied", get(pages::access_denied))
}
