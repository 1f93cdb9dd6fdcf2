//! User-facing rendering of errors

use super::types::RosterError;
use crate::cache::FetchError;
use crate::mutation::MutationError;
use crate::remote::RemoteError;
use crate::session::AuthError;

/// Error category for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Permission,
    Network,
    UserInput,
    NotFound,
    Storage,
    Internal,
}

impl ErrorCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration Error",
            Self::Authentication => "Authentication Error",
            Self::Permission => "Permission Error",
            Self::Network => "Network Error",
            Self::UserInput => "Invalid Input",
            Self::NotFound => "Not Found",
            Self::Storage => "Storage Error",
            Self::Internal => "Internal Error",
        }
    }
}

/// Error rendered for a person at the console
#[derive(Debug, Clone)]
pub struct UserFriendlyError {
    pub category: ErrorCategory,
    pub message: String,
    pub suggestions: Vec<String>,
    pub error_code: String,
}

impl UserFriendlyError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            suggestions: Vec::new(),
            error_code: String::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = code.into();
        self
    }

    pub fn format_display(&self) -> String {
        let mut output = format!("{}: {}", self.category.display_name(), self.message);
        if !self.suggestions.is_empty() {
            output.push_str("\n\nSuggested actions:");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("\n  {}. {}", i + 1, suggestion));
            }
        }
        output
    }
}

fn network(message: impl Into<String>) -> UserFriendlyError {
    UserFriendlyError::new(ErrorCategory::Network, message)
        .with_suggestion("Check that the directory service is running")
        .with_suggestion("Verify the endpoint in your configuration or ROSTER_ENDPOINT")
}

fn signed_out(message: impl Into<String>) -> UserFriendlyError {
    UserFriendlyError::new(ErrorCategory::Authentication, message)
        .with_suggestion("Sign in again with `roster login`")
}

impl From<&RosterError> for UserFriendlyError {
    fn from(err: &RosterError) -> Self {
        let friendly = match err {
            RosterError::Auth(AuthError::InvalidCredentials) => {
                UserFriendlyError::new(ErrorCategory::Authentication, err.to_string())
                    .with_suggestion("Check your email and password")
            }
            RosterError::Auth(AuthError::Network(_))
            | RosterError::Fetch(FetchError::Network(_))
            | RosterError::Mutation(MutationError::Network(_))
            | RosterError::Remote(RemoteError::Network(_)) => network(err.to_string()),
            RosterError::Auth(AuthError::Storage(_)) | RosterError::Storage(_) => {
                UserFriendlyError::new(ErrorCategory::Storage, err.to_string())
                    .with_suggestion("Check permissions on the session directory")
            }
            RosterError::Auth(_) => signed_out(err.to_string()),
            _ if err.is_unauthorized() => signed_out(err.to_string()),
            RosterError::Mutation(MutationError::NotFound(_))
            | RosterError::Remote(RemoteError::NotFound(_)) => {
                UserFriendlyError::new(ErrorCategory::NotFound, err.to_string())
                    .with_suggestion("The record may have been deleted; list employees again")
            }
            RosterError::Validation(_) | RosterError::Query(_) => {
                UserFriendlyError::new(ErrorCategory::UserInput, err.to_string())
            }
            RosterError::Mutation(MutationError::Rejected(_))
            | RosterError::Fetch(FetchError::Rejected(_))
            | RosterError::Remote(RemoteError::Rejected(_)) => {
                UserFriendlyError::new(ErrorCategory::UserInput, err.to_string())
            }
            RosterError::Config { .. } => {
                UserFriendlyError::new(ErrorCategory::Configuration, err.to_string())
                    .with_suggestion("Check your roster configuration file")
            }
            RosterError::Access(_) => UserFriendlyError::new(ErrorCategory::Permission, err.to_string()),
            _ => UserFriendlyError::new(ErrorCategory::Internal, err.to_string()),
        };
        friendly.with_error_code(err.error_code())
    }
}

impl RosterError {
    pub fn category(&self) -> ErrorCategory {
        UserFriendlyError::from(self).category
    }

    pub fn user_friendly(&self) -> UserFriendlyError {
        UserFriendlyError::from(self)
    }
}
