//! Admin mutation commands

use super::{changes_from, emit};
use crate::args::{AddArgs, EditArgs};
use crate::context::AppContext;
use crate::render;
use anyhow::{Result, anyhow};
use roster_core::auth::{self, Route};
use roster_core::{DetailView, EmployeeId, EmploymentStatus, NewEmployee, RosterError};
use serde_json::json;

pub async fn add(ctx: &AppContext, args: AddArgs) -> Result<()> {
    ctx.enter(Route::Dashboard).await?;
    let input = NewEmployee::new(args.name, args.email, args.password)
        .with_phone(args.phone)
        .with_age(args.age)
        .with_class(args.class)
        .with_subjects(args.subjects)
        .with_attendance(args.attendance)
        .validate()
        .map_err(RosterError::from)?;

    let spinner = ctx.console.spinner("Creating employee...");
    let result = ctx.mutations.create(input).await;
    spinner.finish_and_clear();
    let record = result.map_err(RosterError::from)?;

    emit(ctx, &record, || {
        format!("Created employee {}\n{}", record.id, render::record_detail(&record))
    })
}

pub async fn edit(ctx: &AppContext, id: &str, fields: EditArgs) -> Result<()> {
    ctx.enter(Route::Dashboard).await?;
    let id = EmployeeId::from(id);
    let changes = changes_from(fields).validate().map_err(RosterError::from)?;

    let spinner = ctx.console.spinner("Saving changes...");
    let result = ctx.mutations.update(&id, changes).await;
    spinner.finish_and_clear();
    let record = result.map_err(RosterError::from)?;

    emit(ctx, &record, || render::record_detail(&record))
}

pub async fn set_status(ctx: &AppContext, id: &str, status: EmploymentStatus) -> Result<()> {
    let session = ctx.enter(Route::Dashboard).await?;
    let grant = auth::require_admin(&session)
        .map_err(|access| anyhow!("Changing status is not allowed ({})", access))?;
    let id = EmployeeId::from(id);

    let change = ctx
        .mutations
        .set_status(&grant, &id, status)
        .await
        .map_err(RosterError::from)?;

    emit(
        ctx,
        &json!({ "id": change.id, "status": change.status }),
        || format!("Employee {} is now {}", change.id, change.status),
    )
}

pub async fn delete(ctx: &AppContext, id: &str, yes: bool) -> Result<()> {
    ctx.enter(Route::Dashboard).await?;
    let id = EmployeeId::from(id);
    let mut view = DetailView::open(ctx.service.clone(), &id)
        .await
        .map_err(RosterError::from)?;

    if !yes {
        if let Some(record) = view.record() {
            println!("{}", render::record_detail(record));
        }
        if !ctx.console.confirm("Delete this employee?")? {
            ctx.console.warn("Cancelled");
            return Ok(());
        }
    }

    let deleted = ctx.mutations.delete(&id).await.map_err(RosterError::from)?;
    if view.references(&deleted.id) {
        view.close();
    }

    emit(
        ctx,
        &json!({ "id": deleted.id, "deleted": true }),
        || format!("Deleted employee {}", deleted.id),
    )
}
