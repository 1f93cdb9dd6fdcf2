//! Which cached pages a mutation invalidates

use std::collections::HashMap;

/// Kinds of mutation the coordinator performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    SetStatus,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::SetStatus => "set_status",
            MutationKind::Delete => "delete",
        }
    }
}

/// Invalidation scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invalidation {
    /// Every held page
    All,
}

/// Declared invalidation scope per mutation kind; undeclared kinds invalidate everything
#[derive(Debug, Clone, Default)]
pub struct DependencyRegistry {
    scopes: HashMap<MutationKind, Invalidation>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, kind: MutationKind, scope: Invalidation) -> Self {
        self.scopes.insert(kind, scope);
        self
    }

    pub fn scope_for(&self, kind: MutationKind) -> Invalidation {
        self.scopes.get(&kind).copied().unwrap_or(Invalidation::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_defaults_to_all() {
        let registry = DependencyRegistry::new();
        for kind in [
            MutationKind::Create,
            MutationKind::Update,
            MutationKind::SetStatus,
            MutationKind::Delete,
        ] {
            assert_eq!(registry.scope_for(kind), Invalidation::All);
        }
    }
}
