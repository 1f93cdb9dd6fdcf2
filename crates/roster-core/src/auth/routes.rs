//! Console routes

use super::gate::Capability;
use std::fmt;

/// Navigable views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Sign-in form; always reachable
    Login,
    /// Employee directory; admins only
    Dashboard,
    /// The signed-in user's own record; landing page for non-admins
    Profile,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Profile => "/profile",
        }
    }

    /// Map a path to a route; unknown paths (including `/`) yield `None`
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim().trim_end_matches('/');
        match path {
            "/login" => Some(Route::Login),
            "/dashboard" => Some(Route::Dashboard),
            "/profile" => Some(Route::Profile),
            _ => None,
        }
    }

    /// Capability needed to enter; `None` for public routes
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Route::Login => None,
            Route::Dashboard => Some(Capability::AdminOnly),
            Route::Profile => Some(Capability::AnyAuthenticated),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
