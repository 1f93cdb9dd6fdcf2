//! Sign-in, restore and authorization scenarios

mod common;

use common::Console;
use roster::auth::{self, Access, Capability, Route};
use roster::{AuthError, EmployeeId, EmploymentStatus, Role, SessionStatus, UserIdentity};

#[tokio::test]
async fn test_failed_login_persists_nothing_and_redirects() {
    let console = Console::new();

    let err = console.session.login("a@b.com", "short").await.unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
    let session = console.session.snapshot();
    assert_eq!(session.status, SessionStatus::Error);
    assert!(session.error_message.is_some());
    assert!(console.storage.snapshot().is_none());
    assert!(!console.session.shared_token().is_set());
    assert_eq!(
        auth::guard(&session, Route::Dashboard),
        Access::RedirectTo(Route::Login)
    );
}

#[tokio::test]
async fn test_admin_login_opens_dashboard() {
    let console = Console::signed_in_admin().await;
    let session = console.session.snapshot();

    assert_eq!(auth::guard(&session, Route::Dashboard), Access::Allow);
    assert_eq!(auth::landing(&session), Route::Dashboard);
    let persisted = console.storage.snapshot().unwrap();
    assert_eq!(persisted.identity.email, "admin@example.com");
}

#[tokio::test]
async fn test_employee_is_confined_to_profile() {
    let console = Console::new();
    console.session.login("jo@example.com", "secret1").await.unwrap();
    let session = console.session.snapshot();

    assert_eq!(
        auth::resolve(&session, Capability::AnyAuthenticated),
        Access::Allow
    );
    assert_eq!(
        auth::guard(&session, Route::Dashboard),
        Access::RedirectTo(Route::Profile)
    );
    assert_eq!(auth::enter(&session, "/nowhere"), Access::RedirectTo(Route::Profile));
}

#[tokio::test]
async fn test_non_admin_status_change_stops_at_gate() {
    let console = Console::new();
    console.session.login("jo@example.com", "secret1").await.unwrap();

    let denied = auth::require_admin(&console.session.snapshot()).unwrap_err();

    assert_eq!(denied, Access::RedirectTo(Route::Profile));
    // Without a grant the coordinator cannot be asked; the record is untouched.
    assert_eq!(console.directory.mutation_calls(), 0);
    assert_eq!(
        console.directory.record(&EmployeeId::from("1")).unwrap().status,
        EmploymentStatus::Active
    );
}

#[tokio::test]
async fn test_restore_is_pending_until_probe_confirms() {
    let identity = UserIdentity::new("user-1", "admin@example.com", Role::Admin);
    let console = Console::with_persisted("kept-token", identity.clone());
    console.directory.issue_token("kept-token", identity);

    let optimistic = console.session.restore().await;
    assert!(optimistic.loading);
    assert_eq!(auth::guard(&optimistic, Route::Dashboard), Access::Pending);

    let settled = console.session.confirm().await;
    assert!(!settled.loading);
    assert_eq!(auth::guard(&settled, Route::Dashboard), Access::Allow);
    assert!(console.storage.snapshot().is_some());
    assert!(console.session.readiness().is_open());
}

#[tokio::test]
async fn test_rejected_probe_clears_storage() {
    let identity = UserIdentity::new("user-1", "admin@example.com", Role::Admin);
    let console = Console::with_persisted("revoked-token", identity);

    console.session.restore().await;
    let settled = console.session.confirm().await;

    assert_eq!(settled.status, SessionStatus::Unauthenticated);
    assert!(console.storage.snapshot().is_none());
    assert!(!console.session.shared_token().is_set());
    assert_eq!(
        auth::guard(&settled, Route::Profile),
        Access::RedirectTo(Route::Login)
    );
}

#[tokio::test]
async fn test_every_transition_is_broadcast() {
    let console = Console::new();
    let rx = console.session.subscribe();
    let before = rx.borrow().version;

    console.session.login("admin@example.com", "admin123").await.unwrap();
    console.session.logout();
    console.session.logout();

    let after = rx.borrow().clone();
    assert_eq!(after.status, SessionStatus::Unauthenticated);
    // started, succeeded, logged out; the second logout changes nothing
    assert_eq!(after.version, before + 3);
    assert!(console.storage.snapshot().is_none());
}
