use std::{fmt, sync::Arc};

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    policy::{AccessPolicy, AllowedRoles},
    session::{ResolveError, Session, SessionResolverState},
};

/// Where every denied request is sent.
pub const ACCESS_DENIED_PATH: &str = "/admin/access-denied";

/// Outcome of one gate evaluation. There is no retry or intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Permitted,
    Denied(DenialReason),
}

/// Internal cause of a denial. The client sees the same redirect for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NoSession,
    MissingRole,
    RoleNotAllowed,
    ResolverFailure,
    UnknownRoute,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenialReason::NoSession => "no_session",
            DenialReason::MissingRole => "missing_role",
            DenialReason::RoleNotAllowed => "role_not_allowed",
            DenialReason::ResolverFailure => "resolver_failure",
            DenialReason::UnknownRoute => "unknown_route",
        };
        f.write_str(s)
    }
}

/// evaluate
///
/// Access is granted iff a session exists and its role name is a member of `allowed`.
/// Resolver failures deny exactly like a missing session.
pub fn evaluate(
    resolved: &Result<Option<Session>, ResolveError>,
    allowed: &AllowedRoles,
) -> GateDecision {
    let session = match resolved {
        Ok(Some(session)) => session,
        Ok(None) => return GateDecision::Denied(DenialReason::NoSession),
        Err(_) => return GateDecision::Denied(DenialReason::ResolverFailure),
    };

    match session.role_name() {
        None | Some("") => GateDecision::Denied(DenialReason::MissingRole),
        Some(role) if allowed.permits(role) => GateDecision::Permitted,
        Some(_) => GateDecision::Denied(DenialReason::RoleNotAllowed),
    }
}

/// AccessGate
///
/// Guard state for one protected route group. Built once when the router is assembled;
/// the decision itself is recomputed on every request.
#[derive(Clone)]
pub struct AccessGate {
    route: String,
    resolver: SessionResolverState,
    policy: Arc<AccessPolicy>,
}

impl AccessGate {
    pub fn new(
        route: impl Into<String>,
        resolver: SessionResolverState,
        policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            route: route.into(),
            resolver,
            policy,
        }
    }

    pub fn for_route(state: &AppState, route: &str) -> Self {
        Self::new(route, state.sessions.clone(), state.policy.clone())
    }

    /// Resolves the session and decides. Returns the session only when permitted.
    pub async fn check(&self, headers: &HeaderMap) -> (GateDecision, Option<Session>) {
        let resolved = self.resolver.get_session(headers).await;

        if let Err(e) = &resolved {
            tracing::warn!(route = %self.route, error = %e, "session resolution failed");
        }

        let (email, role) = match &resolved {
            Ok(Some(session)) => (session.email(), session.role_name()),
            _ => (None, None),
        };
        tracing::debug!(route = %self.route, email = ?email, role = ?role, "checking access");

        let decision = match self.policy.roles_for(&self.route) {
            Some(allowed) => evaluate(&resolved, allowed),
            None => GateDecision::Denied(DenialReason::UnknownRoute),
        };

        match decision {
            GateDecision::Permitted => {
                tracing::info!(route = %self.route, email = ?email, role = ?role, "access permitted");
            }
            GateDecision::Denied(reason) => {
                tracing::warn!(route = %self.route, email = ?email, role = ?role, %reason, "access denied");
            }
        }

        match (decision, resolved) {
            (GateDecision::Permitted, Ok(session)) => (decision, session),
            _ => (decision, None),
        }
    }
}

/// access_gate
///
/// Middleware guarding a protected subtree. Apply with `route_layer` so that only the
/// subtree's own routes are evaluated. Permitted requests carry the `Session` in their
/// extensions; denied requests are redirected and the inner handler never runs.
pub async fn access_gate(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = gate.check(request.headers()).await;
    match outcome {
        (GateDecision::Permitted, Some(session)) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        _ => Redirect::temporary(ACCESS_DENIED_PATH).into_response(),
    }
}
