//! Normalizing builder for [`QuerySpec`]

use super::QueryError;
use super::spec::{EmployeeFilter, MAX_PAGE_SIZE, QuerySpec, SortField, SortOrder, SortSpec};
use crate::model::EmploymentStatus;
use std::collections::BTreeMap;

/// Builds canonical query specs from user-entered inputs
///
/// Blank text (after trimming) is treated as absent, sort falls back to
/// `name asc`, and page size is clamped to `1..=MAX_PAGE_SIZE`.
///
/// ```
/// use roster_core::query::{QuerySpecBuilder, SortField};
///
/// let a = QuerySpecBuilder::new().search("  ada ").class("").sort(SortField::Age).build();
/// let b = QuerySpecBuilder::new().sort(SortField::Age).search("ada").build();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuerySpecBuilder {
    search: Option<String>,
    class: Option<String>,
    status: Option<EmploymentStatus>,
    sort_field: Option<SortField>,
    sort_order: Option<SortOrder>,
    page_size: Option<u32>,
    after: Option<String>,
}

fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl QuerySpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing spec, e.g. to change one dimension
    pub fn from_spec(spec: &QuerySpec) -> Self {
        Self {
            search: spec.filter.search.clone(),
            class: spec.filter.class.clone(),
            status: spec.filter.status,
            sort_field: Some(spec.sort.field),
            sort_order: Some(spec.sort.order),
            page_size: Some(spec.page_size),
            after: spec.after_cursor.clone(),
        }
    }

    /// Free-text search; blank clears it
    pub fn search(mut self, text: impl AsRef<str>) -> Self {
        self.search = normalize_text(text.as_ref());
        self
    }

    /// Exact class filter; blank clears it
    pub fn class(mut self, class: impl AsRef<str>) -> Self {
        self.class = normalize_text(class.as_ref());
        self
    }

    pub fn status(mut self, status: Option<EmploymentStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn sort(mut self, field: SortField) -> Self {
        self.sort_field = Some(field);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Continue after an opaque cursor; blank starts from the first page
    pub fn after(mut self, cursor: impl AsRef<str>) -> Self {
        self.after = normalize_text(cursor.as_ref());
        self
    }

    /// Build from unordered textual key/value pairs
    ///
    /// Recognized keys: `search`, `class`, `status`, `sort`, `order`, `first`,
    /// `after`. Repeating a key with the same normalized value is harmless;
    /// conflicting repeats are rejected since their outcome would depend on order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen: BTreeMap<String, Option<String>> = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.as_ref().trim().to_ascii_lowercase();
            let value = normalize_text(value.as_ref());
            if let Some(previous) = seen.get(&key) {
                if *previous != value {
                    return Err(QueryError::DuplicateKey(key));
                }
                continue;
            }
            seen.insert(key, value);
        }

        let mut builder = Self::new();
        for (key, value) in seen {
            let Some(value) = value else {
                if !is_known_key(&key) {
                    return Err(QueryError::UnknownKey(key));
                }
                continue;
            };
            let invalid = || QueryError::InvalidValue {
                key: key.clone(),
                value: value.clone(),
            };
            builder = match key.as_str() {
                "search" => builder.search(&value),
                "class" => builder.class(&value),
                "status" => builder.status(Some(value.parse().map_err(|_| invalid())?)),
                "sort" => builder.sort(value.parse().map_err(|_| invalid())?),
                "order" => builder.order(value.parse().map_err(|_| invalid())?),
                "first" => builder.page_size(value.parse().map_err(|_| invalid())?),
                "after" => builder.after(&value),
                _ => return Err(QueryError::UnknownKey(key.clone())),
            };
        }
        Ok(builder)
    }

    pub fn build(self) -> QuerySpec {
        let page_size = self
            .page_size
            .unwrap_or(super::spec::DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        QuerySpec {
            filter: EmployeeFilter {
                search: self.search,
                class: self.class,
                status: self.status,
            },
            sort: SortSpec {
                field: self.sort_field.unwrap_or_default(),
                order: self.sort_order.unwrap_or_default(),
            },
            page_size,
            after_cursor: self.after,
        }
    }
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        "search" | "class" | "status" | "sort" | "order" | "first" | "after"
    )
}
