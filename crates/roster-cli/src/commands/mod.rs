//! CLI commands

pub mod auth;
pub mod directory;
pub mod manage;
pub mod profile;

use crate::args::EditArgs;
use crate::context::AppContext;
use anyhow::Result;
use roster_core::EmployeeChanges;
use serde::Serialize;

/// Print `value` as JSON in `--json` mode, otherwise the human rendering
pub(crate) fn emit<T: Serialize>(ctx: &AppContext, value: &T, human: impl FnOnce() -> String) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human());
    }
    Ok(())
}

pub(crate) fn changes_from(args: EditArgs) -> EmployeeChanges {
    EmployeeChanges {
        name: args.name,
        email: args.email,
        phone: args.phone,
        age: args.age,
        class: args.class,
        subjects: args.subjects,
        attendance: args.attendance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_carry_only_given_fields() {
        let changes = changes_from(EditArgs {
            age: Some(40),
            subjects: Some(vec!["Math".into(), " ".into()]),
            ..EditArgs::default()
        });
        assert_eq!(changes.age, Some(40));
        assert!(changes.name.is_none());

        let validated = changes.validate().unwrap();
        assert_eq!(validated.subjects, Some(vec!["Math".to_string()]));
    }

    #[test]
    fn test_empty_edit_is_rejected() {
        let errors = changes_from(EditArgs::default()).validate().unwrap_err();
        assert!(errors.field("changes").is_some());
    }
}
