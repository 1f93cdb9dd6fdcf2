//! Sign-in, sign-out and identity commands

use super::emit;
use crate::context::AppContext;
use crate::render;
use anyhow::Result;
use roster_core::RosterError;
use roster_core::auth::{self, Route};
use serde_json::json;

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let spinner = ctx.console.spinner("Signing in...");
    let result = ctx.session.login(email, password).await;
    spinner.finish_and_clear();

    let identity = result.map_err(RosterError::from)?;
    let landing = auth::landing(&ctx.session.snapshot());
    let next = match landing {
        Route::Dashboard => "roster list",
        _ => "roster profile",
    };

    emit(
        ctx,
        &json!({ "identity": identity, "landing": landing.path() }),
        || format!("Signed in as {}. Next: `{}`", render::identity_line(&identity), next),
    )
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.session.logout();
    ctx.cache.clear();
    if !ctx.json {
        ctx.console.success("Signed out");
    }
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let (session, identity) = ctx.signed_in(Route::Profile).await?;
    let affordances = auth::affordances(&session);

    emit(
        ctx,
        &json!({ "identity": identity, "admin": session.is_admin() }),
        || {
            let mut out = render::identity_line(&identity);
            if affordances.can_create {
                out.push_str("\nYou can list, add, edit, flag and delete employees.");
            } else {
                out.push_str("\nYou can view and edit your own profile.");
            }
            out
        },
    )
}
