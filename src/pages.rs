//! Server-rendered pages.
//!
//! Everything here is presentational except the dashboard, which reads the `Session` the
//! access gate left in the request extensions.

use std::sync::Arc;

use askama::Template;
use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{
    models::DashboardStats,
    policy::{ADMIN_ROUTE, AccessPolicy},
    session::Session,
};

const SERVICES: [&str; 4] = [
    "Desenvolvimento de sites",
    "Sistemas sob medida",
    "Identidade visual",
    "Marketing digital",
];

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub services: Vec<&'static str>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage;

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuotePage;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub email: String,
    pub role: String,
    pub stats: DashboardStats,
    pub allowed_roles: Vec<String>,
}

#[derive(Template)]
#[template(path = "access_denied.html")]
pub struct AccessDeniedPage;

fn render<T: Template>(page: &T) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

pub async fn home() -> Response {
    render(&HomePage {
        services: SERVICES.to_vec(),
    })
}

pub async fn login() -> Response {
    render(&LoginPage)
}

pub async fn quote() -> Response {
    render(&QuotePage)
}

/// dashboard
///
/// [Admin Route] Must sit behind the access gate, which supplies the `Session` extension.
pub async fn dashboard(
    Extension(session): Extension<Session>,
    State(policy): State<Arc<AccessPolicy>>,
) -> Response {
    let allowed_roles = policy
        .roles_for(ADMIN_ROUTE)
        .map(|roles| roles.iter().map(str::to_string).collect())
        .unwrap_or_default();

    render(&DashboardPage {
        email: session.email().unwrap_or("-").to_string(),
        role: session.role_name().unwrap_or("-").to_string(),
        stats: DashboardStats::placeholder(),
        allowed_roles,
    })
}

pub async fn access_denied() -> Response {
    render(&AccessDeniedPage)
}
