//! Canonical query descriptor

use crate::model::{EmploymentStatus, PageInfo};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

/// Page size used by the directory dashboard
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Largest page the service is asked for
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sortable employee fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Age,
    Class,
    Attendance,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Class => "class",
            Self::Attendance => "attendance",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "age" => Ok(Self::Age),
            "class" => Ok(Self::Class),
            "attendance" => Ok(Self::Attendance),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Sort clause; defaults to `name asc`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

/// Optional filter dimensions; `None` means "not filtered"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeFilter {
    /// Free text matched by the service across name, email, phone, age and class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EmploymentStatus>,
}

impl EmployeeFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.class.is_none() && self.status.is_none()
    }
}

/// Canonical description of one page request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub filter: EmployeeFilter,
    pub sort: SortSpec,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_cursor: Option<String>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            filter: EmployeeFilter::default(),
            sort: SortSpec::default(),
            page_size: DEFAULT_PAGE_SIZE,
            after_cursor: None,
        }
    }
}

impl QuerySpec {
    /// The own-record lookup used by the profile view: one row, no filter
    pub fn profile() -> Self {
        Self {
            page_size: 1,
            ..Self::default()
        }
    }

    /// Stable byte encoding; equal specs produce equal bytes
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Fixed field order and plain strings/enums; serialization cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Spec for the page following `page_info`, if there is one
    pub fn next_page(&self, page_info: &PageInfo) -> Option<QuerySpec> {
        if !page_info.has_next_page {
            return None;
        }
        let cursor = page_info.end_cursor.clone()?;
        Some(Self {
            after_cursor: Some(cursor),
            ..self.clone()
        })
    }

    /// Same filter and sort, first page
    pub fn first_page(&self) -> QuerySpec {
        Self {
            after_cursor: None,
            ..self.clone()
        }
    }

    /// GraphQL variables for `GetEmployees`
    pub fn to_variables(&self) -> Value {
        let mut filter = Map::new();
        if let Some(search) = &self.filter.search {
            filter.insert("search".into(), json!(search));
        }
        if let Some(class) = &self.filter.class {
            filter.insert("class".into(), json!(class));
        }
        if let Some(status) = self.filter.status {
            filter.insert("status".into(), json!(status.as_str()));
        }

        let mut variables = json!({
            "first": self.page_size,
            "filter": Value::Object(filter),
            "sort": {
                "field": self.sort.field.as_str(),
                "order": self.sort.order.as_str(),
            },
        });
        if let Some(after) = &self.after_cursor {
            variables["after"] = json!(after);
        }
        variables
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            String::from_utf8_lossy(&self.canonical_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sort_is_name_ascending() {
        let spec = QuerySpec::default();
        assert_eq!(spec.sort.field, SortField::Name);
        assert_eq!(spec.sort.order, SortOrder::Asc);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_variables_omit_absent_filters() {
        let mut spec = QuerySpec::default();
        spec.filter.class = Some("A".to_string());
        let vars = spec.to_variables();

        assert_eq!(vars["filter"], json!({"class": "A"}));
        assert_eq!(vars["sort"], json!({"field": "name", "order": "asc"}));
        assert!(vars.get("after").is_none());
    }

    #[test]
    fn test_next_page_uses_end_cursor() {
        let spec = QuerySpec::default();
        let info = PageInfo {
            has_next_page: true,
            has_previous_page: false,
            start_cursor: Some("c0".into()),
            end_cursor: Some("c49".into()),
        };
        let next = spec.next_page(&info).unwrap();
        assert_eq!(next.after_cursor.as_deref(), Some("c49"));
        assert_eq!(next.first_page(), spec);

        let last = PageInfo {
            has_next_page: false,
            ..info
        };
        assert!(spec.next_page(&last).is_none());
    }

    #[test]
    fn test_canonical_bytes_are_stable() {
        let spec = QuerySpec::profile();
        assert_eq!(spec.canonical_bytes(), QuerySpec::profile().canonical_bytes());
        assert_eq!(
            String::from_utf8(spec.canonical_bytes()).unwrap(),
            r#"{"filter":{},"sort":{"field":"name","order":"asc"},"pageSize":1}"#
        );
    }
}
