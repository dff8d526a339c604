use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Route identifier of the admin area.
pub const ADMIN_ROUTE: &str = "admin";

/// Roles allowed into the admin area unless `ACCESS_POLICY` says otherwise.
pub const DEFAULT_ADMIN_ROLES: [&str; 2] = ["Diretor Executivo (CEO)", "Diretor Operacional (COO)"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("allow-list for route `{0}` is empty")]
    EmptyAllowList(String),
    #[error("allow-list for route `{0}` contains an empty role name")]
    EmptyRoleName(String),
    #[error("malformed policy document: {0}")]
    Malformed(String),
}

/// AllowedRoles
///
/// The set of role names permitted through one access gate. Never empty, and no
/// member is the empty string, so a blank role can never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoles(BTreeSet<String>);

impl AllowedRoles {
    pub fn new<I, S>(route: &str, roles: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for role in roles {
            let role = role.into();
            if role.is_empty() {
                return Err(PolicyError::EmptyRoleName(route.to_string()));
            }
            set.insert(role);
        }
        if set.is_empty() {
            return Err(PolicyError::EmptyAllowList(route.to_string()));
        }
        Ok(Self(set))
    }

    /// Exact, case-sensitive membership. No trimming or normalization.
    pub fn permits(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// AccessPolicy
///
/// Maps a protected route identifier to the roles allowed to enter it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    routes: BTreeMap<String, AllowedRoles>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }

    pub fn with_route<I, S>(mut self, route: &str, roles: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = AllowedRoles::new(route, roles)?;
        self.routes.insert(route.to_string(), allowed);
        Ok(self)
    }

    /// Parses `{ "<route>": ["role", ...], ... }`.
    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let doc: BTreeMap<String, Vec<String>> =
            serde_json::from_str(raw).map_err(|e| PolicyError::Malformed(e.to_string()))?;

        doc.into_iter()
            .try_fold(Self::new(), |policy, (route, roles)| {
                policy.with_route(&route, roles)
            })
    }

    pub fn roles_for(&self, route: &str) -> Option<&AllowedRoles> {
        self.routes.get(route)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let mut routes = BTreeMap::new();
        routes.insert(
            ADMIN_ROUTE.to_string(),
            AllowedRoles(DEFAULT_ADMIN_ROLES.iter().map(|r| r.to_string()).collect()),
        );
        Self { routes }
    }
}
