use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::identity::{Permission, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteName {
    Login,
    Signup,
    Dashboard,
    Students,
    Teachers,
    Classes,
    Attendance,
    Fees,
    Settings,
    Users,
}

impl RouteName {
    pub const ALL: [RouteName; 10] = [
        RouteName::Login,
        RouteName::Signup,
        RouteName::Dashboard,
        RouteName::Students,
        RouteName::Teachers,
        RouteName::Classes,
        RouteName::Attendance,
        RouteName::Fees,
        RouteName::Settings,
        RouteName::Users,
    ];

    pub fn segment(&self) -> &'static str {
        match self {
            RouteName::Login => "login",
            RouteName::Signup => "signup",
            RouteName::Dashboard => "dashboard",
            RouteName::Students => "students",
            RouteName::Teachers => "teachers",
            RouteName::Classes => "classes",
            RouteName::Attendance => "attendance",
            RouteName::Fees => "fees",
            RouteName::Settings => "settings",
            RouteName::Users => "users",
        }
    }

    pub fn path(&self) -> String { format!("/{}", self.segment()) }

    pub fn from_segment(seg: &str) -> Option<RouteName> {
        RouteName::ALL.iter().copied().find(|r| r.segment() == seg)
    }
}

/// A navigable address: path plus query parameters, e.g. `/dashboard?error=access_denied`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn route(name: RouteName) -> Self { Self { path: name.path(), query: BTreeMap::new() } }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Parse a URL-ish string. Leading/trailing slashes are normalised; an empty path is `/`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (path_part, query_part) = match raw.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (raw, None),
        };
        let trimmed = path_part.trim_matches('/');
        let path = format!("/{}", trimmed);
        let mut query = BTreeMap::new();
        if let Some(q) = query_part {
            for pair in q.split('&').filter(|s| !s.is_empty()) {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                let k = urlencoding::decode(k).map(|c| c.into_owned()).unwrap_or_else(|_| k.to_string());
                let v = urlencoding::decode(v).map(|c| c.into_owned()).unwrap_or_else(|_| v.to_string());
                query.insert(k, v);
            }
        }
        Self { path, query }
    }

    /// First path segment, used to match the route table.
    pub fn first_segment(&self) -> &str {
        self.path.trim_start_matches('/').split('/').next().unwrap_or("")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        let mut sep = '?';
        for (k, v) in &self.query {
            write!(f, "{}{}={}", sep, urlencoding::encode(k), urlencoding::encode(v))?;
            sep = '&';
        }
        Ok(())
    }
}

/// Declarative policy attached to a route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRequirement {
    #[default]
    None,
    Roles(Vec<Role>),
    Permissions(Vec<Permission>),
}

/// Which guard variant protects a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    #[default]
    Public,
    Authenticated,
    Role,
    Permission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDef {
    pub name: RouteName,
    #[serde(default)]
    pub guard: GuardKind,
    #[serde(default)]
    pub requirement: RouteRequirement,
}

impl RouteDef {
    pub fn public(name: RouteName) -> Self { Self { name, guard: GuardKind::Public, requirement: RouteRequirement::None } }
    pub fn authenticated(name: RouteName) -> Self { Self { name, guard: GuardKind::Authenticated, requirement: RouteRequirement::None } }
    pub fn roles(name: RouteName, roles: &[Role]) -> Self {
        Self { name, guard: GuardKind::Role, requirement: RouteRequirement::Roles(roles.to_vec()) }
    }
    pub fn permissions(name: RouteName, perms: &[Permission]) -> Self {
        Self { name, guard: GuardKind::Permission, requirement: RouteRequirement::Permissions(perms.to_vec()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a> {
    Route(&'a RouteDef),
    /// No route matched; navigation goes to the given public entry route instead.
    Redirect(RouteName),
}

/// Static route configuration loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDef>) -> Self { Self { routes } }

    /// The canonical console routes: every school page resolves to its own screen.
    pub fn standard() -> Self {
        let staff = [Role::Admin, Role::Manager, Role::User];
        Self::new(vec![
            RouteDef::public(RouteName::Login),
            RouteDef::public(RouteName::Signup),
            RouteDef::authenticated(RouteName::Dashboard),
            RouteDef::roles(RouteName::Students, &staff),
            RouteDef::roles(RouteName::Teachers, &staff),
            RouteDef::roles(RouteName::Classes, &staff),
            RouteDef::roles(RouteName::Attendance, &staff),
            RouteDef::roles(RouteName::Fees, &staff),
            RouteDef::authenticated(RouteName::Settings),
            RouteDef::roles(RouteName::Users, &staff),
        ])
    }

    pub fn from_json(text: &str) -> AppResult<Self> {
        let table: RouteTable = serde_json::from_str(text)
            .map_err(|e| AppError::UserInput { code: "route_config".into(), message: e.to_string() })?;
        Ok(table)
    }

    pub fn get(&self, name: RouteName) -> Option<&RouteDef> { self.routes.iter().find(|r| r.name == name) }

    pub fn routes(&self) -> &[RouteDef] { &self.routes }

    /// Match a location to a route. Empty and unknown paths redirect to `login`.
    pub fn resolve(&self, loc: &Location) -> Resolved<'_> {
        let seg = loc.first_segment();
        match RouteName::from_segment(seg).and_then(|name| self.get(name)) {
            Some(def) => Resolved::Route(def),
            None => Resolved::Redirect(RouteName::Login),
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self { Self::standard() }
}
