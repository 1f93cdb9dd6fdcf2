//! Read-only dashboard commands

use super::emit;
use crate::args::{ListArgs, OrderArg, SortArg, StatusArg};
use crate::context::AppContext;
use crate::render;
use anyhow::Result;
use roster_core::auth::Route;
use roster_core::{
    DetailView, EmployeeId, EmploymentStatus, QuerySpec, QuerySpecBuilder, RosterError,
    SortField, SortOrder,
};

impl From<StatusArg> for EmploymentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => EmploymentStatus::Active,
            StatusArg::Flagged => EmploymentStatus::Flagged,
        }
    }
}

/// Canonical spec for the list flags; page size falls back to the configured one
pub(crate) fn list_spec(args: &ListArgs, default_page_size: u32) -> QuerySpec {
    let mut builder = QuerySpecBuilder::new()
        .page_size(args.first.unwrap_or(default_page_size))
        .status(args.status.map(EmploymentStatus::from));
    if let Some(search) = &args.search {
        builder = builder.search(search);
    }
    if let Some(class) = &args.class {
        builder = builder.class(class);
    }
    if let Some(sort) = args.sort {
        builder = builder.sort(match sort {
            SortArg::Name => SortField::Name,
            SortArg::Age => SortField::Age,
            SortArg::Class => SortField::Class,
            SortArg::Attendance => SortField::Attendance,
        });
    }
    if let Some(order) = args.order {
        builder = builder.order(match order {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        });
    }
    if let Some(after) = &args.after {
        builder = builder.after(after);
    }
    builder.build()
}

pub async fn list(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    ctx.enter(Route::Dashboard).await?;
    let spec = list_spec(args, ctx.config.page_size);
    ctx.console.info(&format!("Query: {}", spec));

    let spinner = ctx.console.spinner("Loading employees...");
    let result = ctx.cache.refresh(&spec).await;
    spinner.finish_and_clear();
    let page = result.map_err(RosterError::from)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&render::page_json(&page))?);
    } else {
        ctx.console.print_header("Employees");
        println!("{}", render::page_table(&page));
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.enter(Route::Dashboard).await?;
    let id = EmployeeId::from(id);
    let view = DetailView::open(ctx.service.clone(), &id)
        .await
        .map_err(RosterError::from)?;

    match view.record() {
        Some(record) => emit(ctx, record, || render::record_detail(record)),
        None => Ok(()),
    }
}
