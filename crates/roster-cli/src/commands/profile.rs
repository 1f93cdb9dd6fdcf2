//! Own-record commands available to every signed-in user

use super::{changes_from, emit};
use crate::args::EditArgs;
use crate::context::AppContext;
use crate::render;
use anyhow::{Result, anyhow};
use roster_core::auth::Route;
use roster_core::{CollectionPage, EmployeeRecord, QuerySpec, RosterError, UserIdentity};

/// The caller's own record out of the profile page
fn own_record(page: &CollectionPage, identity: &UserIdentity) -> Option<EmployeeRecord> {
    page.records()
        .iter()
        .find(|r| r.user_id == identity.id || r.email.eq_ignore_ascii_case(&identity.email))
        .or_else(|| page.records().first())
        .cloned()
}

async fn load(ctx: &AppContext, identity: &UserIdentity) -> Result<EmployeeRecord> {
    let page = ctx
        .cache
        .refresh(&QuerySpec::profile())
        .await
        .map_err(RosterError::from)?;
    own_record(&page, identity).ok_or_else(|| anyhow!("No employee profile found for {}", identity.email))
}

pub async fn show(ctx: &AppContext) -> Result<()> {
    let (_session, identity) = ctx.signed_in(Route::Profile).await?;
    let record = load(ctx, &identity).await?;
    emit(ctx, &record, || render::record_detail(&record))
}

pub async fn edit(ctx: &AppContext, fields: EditArgs) -> Result<()> {
    let (_session, identity) = ctx.signed_in(Route::Profile).await?;
    let changes = changes_from(fields).validate().map_err(RosterError::from)?;
    let record = load(ctx, &identity).await?;

    let updated = ctx
        .mutations
        .update(&record.id, changes)
        .await
        .map_err(RosterError::from)?;
    emit(ctx, &updated, || {
        format!("Profile updated\n{}", render::record_detail(&updated))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::{EmployeeId, EmploymentStatus, Role};

    fn record(id: &str, user_id: &str, email: &str) -> EmployeeRecord {
        EmployeeRecord {
            id: EmployeeId::from(id),
            user_id: user_id.to_string(),
            name: "Someone".to_string(),
            email: email.to_string(),
            phone: "555".to_string(),
            age: 30,
            class: "A".to_string(),
            subjects: Vec::new(),
            attendance: 80.0,
            status: EmploymentStatus::Active,
        }
    }

    #[test]
    fn test_own_record_prefers_matching_user() {
        let mut page = CollectionPage::empty(QuerySpec::profile());
        page.records = vec![
            record("1", "u1", "other@example.com"),
            record("2", "u2", "jo@example.com"),
        ];
        let identity = UserIdentity::new("u2", "jo@example.com", Role::Employee);
        assert_eq!(own_record(&page, &identity).unwrap().id.as_str(), "2");
    }

    #[test]
    fn test_own_record_on_empty_page() {
        let page = CollectionPage::empty(QuerySpec::profile());
        let identity = UserIdentity::new("u2", "jo@example.com", Role::Employee);
        assert!(own_record(&page, &identity).is_none());
    }
}
