//! Cached page snapshots

use super::FetchError;
use crate::model::{EmployeeId, EmployeeRecord, PageInfo};
use crate::query::QuerySpec;
use chrono::{DateTime, Utc};
use std::fmt;

/// How current a page is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// Matches the service as of the last fetch, with no mutation since
    Fresh,
    /// May be out of date; a fetch is needed or has been requested
    Stale,
    /// A fetch for this spec is in flight
    Fetching,
    /// The last fetch failed; the records are from an earlier success, if any
    Failed,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::Fetching => "fetching",
            Freshness::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One page of the employee collection as held by the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage {
    pub spec: QuerySpec,
    pub records: Vec<EmployeeRecord>,
    pub page_info: PageInfo,
    pub total_count: u64,
    /// `None` until the first successful fetch
    pub fetched_at: Option<DateTime<Utc>>,
    pub freshness: Freshness,
    pub last_error: Option<FetchError>,
}

impl CollectionPage {
    /// Placeholder for a spec that has never been fetched
    pub fn empty(spec: QuerySpec) -> Self {
        Self {
            spec,
            records: Vec::new(),
            page_info: PageInfo::default(),
            total_count: 0,
            fetched_at: None,
            freshness: Freshness::Stale,
            last_error: None,
        }
    }

    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub fn find(&self, id: &EmployeeId) -> Option<&EmployeeRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Distinct classes on this page, in first-seen order
    pub fn classes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.class.as_str()) {
                seen.push(record.class.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }

    /// Whether any fetch for this spec has succeeded
    pub fn has_data(&self) -> bool {
        self.fetched_at.is_some()
    }

    /// Spec of the following page, if the service reported one
    pub fn next_spec(&self) -> Option<QuerySpec> {
        self.spec.next_page(&self.page_info)
    }
}
