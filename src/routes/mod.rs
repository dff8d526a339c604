/// Router Module Index
///
/// Routing is split by access level so that guards are attached at the module boundary
/// (via Axum layers) rather than inside individual handlers.

/// Marketing pages, health checks and the session echo. No guard.
pub mod public;

/// The admin area, guarded by the access gate for the `admin` route group.
pub mod admin;
