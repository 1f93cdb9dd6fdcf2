//! Access decisions

use super::routes::Route;
use crate::session::Session;
use std::fmt;

/// What an operation or view requires of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AnyAuthenticated,
    AdminOnly,
}

/// Gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// A restored session is still being confirmed; show a neutral loading
    /// state rather than redirecting
    Pending,
    RedirectTo(Route),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Allow => write!(f, "allowed"),
            Access::Pending => write!(f, "pending session confirmation"),
            Access::RedirectTo(route) => write!(f, "redirect to {}", route),
        }
    }
}

/// Decide whether `session` holds `capability`
pub fn resolve(session: &Session, capability: Capability) -> Access {
    if session.loading {
        return Access::Pending;
    }
    if !session.is_authenticated() {
        return Access::RedirectTo(Route::Login);
    }
    match capability {
        Capability::AnyAuthenticated => Access::Allow,
        Capability::AdminOnly if session.is_admin() => Access::Allow,
        Capability::AdminOnly => Access::RedirectTo(Route::Profile),
    }
}

/// Decide whether `session` may enter `route`
pub fn guard(session: &Session, route: Route) -> Access {
    match route.required_capability() {
        None => Access::Allow,
        Some(capability) => resolve(session, capability),
    }
}

/// Where `/` and unknown paths lead
pub fn landing(session: &Session) -> Route {
    if !session.is_authenticated() {
        Route::Login
    } else if session.is_admin() {
        Route::Dashboard
    } else {
        Route::Profile
    }
}

/// Route-entry decision for a raw path
pub fn enter(session: &Session, path: &str) -> Access {
    match Route::parse(path) {
        Some(route) => guard(session, route),
        None if session.loading => Access::Pending,
        None => Access::RedirectTo(landing(session)),
    }
}

/// Proof that the gate granted `AdminOnly` to some session
///
/// Only [`require_admin`] constructs one.
#[derive(Debug, Clone, Copy)]
pub struct AdminGrant {
    _private: (),
}

/// Ask the gate for admin rights
pub fn require_admin(session: &Session) -> Result<AdminGrant, Access> {
    match resolve(session, Capability::AdminOnly) {
        Access::Allow => Ok(AdminGrant { _private: () }),
        denied => Err(denied),
    }
}

/// UI affordances for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    pub can_create: bool,
    pub can_edit_any: bool,
    pub can_change_status: bool,
    pub can_delete: bool,
    pub can_edit_own_profile: bool,
}

pub fn affordances(session: &Session) -> Affordances {
    let admin = resolve(session, Capability::AdminOnly).is_allowed();
    let signed_in = resolve(session, Capability::AnyAuthenticated).is_allowed();
    Affordances {
        can_create: admin,
        can_edit_any: admin,
        can_change_status: admin,
        can_delete: admin,
        can_edit_own_profile: signed_in,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, UserIdentity};
    use crate::session::{SessionEvent, SessionStatus};

    fn signed_in(role: Role) -> Session {
        Session::unauthenticated()
            .apply(&SessionEvent::LoginStarted)
            .unwrap()
            .apply(&SessionEvent::LoginSucceeded(UserIdentity::new(
                "1",
                "u@x.com",
                role,
            )))
            .unwrap()
    }

    fn restoring(role: Role) -> Session {
        Session::unauthenticated()
            .apply(&SessionEvent::Restored(UserIdentity::new("1", "u@x.com", role)))
            .unwrap()
    }

    #[test]
    fn test_resolve_table() {
        let anon = Session::unauthenticated();
        let admin = signed_in(Role::Admin);
        let employee = signed_in(Role::Employee);

        assert_eq!(resolve(&anon, Capability::AnyAuthenticated), Access::RedirectTo(Route::Login));
        assert_eq!(resolve(&anon, Capability::AdminOnly), Access::RedirectTo(Route::Login));
        assert_eq!(resolve(&admin, Capability::AdminOnly), Access::Allow);
        assert_eq!(resolve(&admin, Capability::AnyAuthenticated), Access::Allow);
        assert_eq!(resolve(&employee, Capability::AnyAuthenticated), Access::Allow);
        assert_eq!(
            resolve(&employee, Capability::AdminOnly),
            Access::RedirectTo(Route::Profile)
        );
    }

    #[test]
    fn test_loading_is_pending_not_redirect() {
        let session = restoring(Role::Employee);
        assert_eq!(resolve(&session, Capability::AdminOnly), Access::Pending);
        assert_eq!(resolve(&session, Capability::AnyAuthenticated), Access::Pending);
        assert_eq!(enter(&session, "/"), Access::Pending);
    }

    #[test]
    fn test_authenticating_redirects_to_login() {
        let session = Session::unauthenticated()
            .apply(&SessionEvent::LoginStarted)
            .unwrap();
        assert_eq!(session.status, SessionStatus::Authenticating);
        assert_eq!(
            resolve(&session, Capability::AnyAuthenticated),
            Access::RedirectTo(Route::Login)
        );
    }

    #[test]
    fn test_login_route_is_public() {
        assert_eq!(guard(&Session::unauthenticated(), Route::Login), Access::Allow);
    }

    #[test]
    fn test_landing_and_unknown_paths() {
        assert_eq!(landing(&Session::unauthenticated()), Route::Login);
        assert_eq!(landing(&signed_in(Role::Admin)), Route::Dashboard);
        assert_eq!(landing(&signed_in(Role::Employee)), Route::Profile);

        assert_eq!(
            enter(&signed_in(Role::Admin), "/nowhere"),
            Access::RedirectTo(Route::Dashboard)
        );
        assert_eq!(
            enter(&signed_in(Role::Employee), "/dashboard"),
            Access::RedirectTo(Route::Profile)
        );
    }

    #[test]
    fn test_admin_grant_only_for_admins() {
        assert!(require_admin(&signed_in(Role::Admin)).is_ok());
        assert_eq!(
            require_admin(&signed_in(Role::Employee)).unwrap_err(),
            Access::RedirectTo(Route::Profile)
        );
        assert_eq!(
            require_admin(&restoring(Role::Admin)).unwrap_err(),
            Access::Pending
        );
    }

    #[test]
    fn test_affordances() {
        let admin = affordances(&signed_in(Role::Admin));
        assert!(admin.can_create && admin.can_delete && admin.can_change_status);

        let employee = affordances(&signed_in(Role::Employee));
        assert!(!employee.can_create && !employee.can_edit_any && !employee.can_delete);
        assert!(employee.can_edit_own_profile);

        assert_eq!(affordances(&Session::unauthenticated()), Affordances::default());
    }
}
