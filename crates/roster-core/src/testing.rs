//! In-memory directory service for tests
//!
//! [`FakeDirectory`] implements [`EmployeeService`] with the same filtering,
//! sorting and cursor pagination the real service offers, plus hooks tests
//! need: call counters, a pause switch for listing, injected failures and an
//! artificial mutation delay.

use crate::concurrency::SharedToken;
use crate::model::{
    EmployeeChanges, EmployeeConnection, EmployeeId, EmployeeRecord, EmploymentStatus,
    LoginGrant, NewEmployee, PageInfo, Role, StatusChange, UserIdentity,
};
use crate::query::{QuerySpec, SortField, SortOrder};
use crate::remote::{EmployeeService, Operation, RemoteError, RemoteResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::watch;

const CURSOR_PREFIX: &str = "cursor:";

struct Account {
    password: String,
    identity: UserIdentity,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, UserIdentity>,
    records: Vec<EmployeeRecord>,
    next_id: u64,
    next_token: u64,
    failures: HashMap<Operation, RemoteError>,
    mutation_delay: Option<Duration>,
}

/// Call counters, one per remote operation
#[derive(Debug, Default)]
pub struct CallCounts {
    pub login: AtomicUsize,
    pub probe: AtomicUsize,
    pub list: AtomicUsize,
    pub get: AtomicUsize,
    pub mutations: AtomicUsize,
}

/// In-memory [`EmployeeService`]
pub struct FakeDirectory {
    state: Mutex<FakeState>,
    calls: CallCounts,
    paused: watch::Sender<bool>,
    bearer: Mutex<Option<SharedToken>>,
}

impl Default for FakeDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDirectory {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            state: Mutex::new(FakeState {
                next_id: 1,
                next_token: 1,
                ..FakeState::default()
            }),
            calls: CallCounts::default(),
            paused,
            bearer: Mutex::new(None),
        }
    }

    /// An admin (`admin@example.com` / `admin123`), an employee
    /// (`jo@example.com` / `secret1`) and a handful of records
    pub fn seeded() -> Self {
        let directory = Self::new()
            .with_account("admin@example.com", "admin123", Role::Admin)
            .with_account("jo@example.com", "secret1", Role::Employee);

        let seed = [
            ("Ada Lovelace", "ada@example.com", 36, "A", 97.5, EmploymentStatus::Active),
            ("Grace Hopper", "grace@example.com", 45, "B", 88.0, EmploymentStatus::Active),
            ("Jo March", "jo@example.com", 24, "A", 72.0, EmploymentStatus::Flagged),
            ("Alan Turing", "alan@example.com", 41, "C", 91.0, EmploymentStatus::Active),
        ];
        for (name, email, age, class, attendance, status) in seed {
            directory.insert(
                NewEmployee::new(name, email, "password")
                    .with_phone("555-0100")
                    .with_age(age)
                    .with_class(class)
                    .with_subjects(["Math"])
                    .with_attendance(attendance),
                status,
            );
        }
        directory
    }

    pub fn with_account(self, email: &str, password: &str, role: Role) -> Self {
        {
            let mut state = self.state.lock();
            let id = format!("user-{}", state.accounts.len() + 1);
            state.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    identity: UserIdentity::new(id, email, role),
                },
            );
        }
        self
    }

    /// Check bearer tokens on `identity_probe` against this shared token
    pub fn attach_token(&self, token: SharedToken) {
        *self.bearer.lock() = Some(token);
    }

    /// Register a token as already issued, e.g. for restore tests
    pub fn issue_token(&self, token: &str, identity: UserIdentity) {
        self.state.lock().tokens.insert(token.to_string(), identity);
    }

    /// Forget every issued token, as if the server restarted with new keys
    pub fn revoke_tokens(&self) {
        self.state.lock().tokens.clear();
    }

    pub fn insert(&self, input: NewEmployee, status: EmploymentStatus) -> EmployeeRecord {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let record = EmployeeRecord {
            id: EmployeeId::from(id),
            user_id: format!("u{}", id),
            name: input.name,
            email: input.email,
            phone: input.phone,
            age: input.age,
            class: input.class,
            subjects: input.subjects,
            attendance: input.attendance,
            status,
        };
        state.records.push(record.clone());
        record
    }

    pub fn record(&self, id: &EmployeeId) -> Option<EmployeeRecord> {
        self.state.lock().records.iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail every call of `op` with `err` until cleared
    pub fn fail(&self, op: Operation, err: RemoteError) {
        self.state.lock().failures.insert(op, err);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Hold every listing call until [`resume_listing`](Self::resume_listing)
    ///
    /// Calls are counted before they block.
    pub fn pause_listing(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume_listing(&self) {
        self.paused.send_replace(false);
    }

    pub fn set_mutation_delay(&self, delay: Option<Duration>) {
        self.state.lock().mutation_delay = delay;
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    pub fn list_calls(&self) -> usize {
        self.calls.list.load(AtomicOrdering::SeqCst)
    }

    pub fn mutation_calls(&self) -> usize {
        self.calls.mutations.load(AtomicOrdering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.calls.probe.load(AtomicOrdering::SeqCst)
    }

    fn injected(&self, op: Operation) -> RemoteResult<()> {
        match self.state.lock().failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn mutation_gate(&self, op: Operation) -> RemoteResult<()> {
        self.calls.mutations.fetch_add(1, AtomicOrdering::SeqCst);
        let delay = self.state.lock().mutation_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.injected(op)
    }

    fn email_taken(state: &FakeState, email: &str, except: Option<&EmployeeId>) -> bool {
        state
            .records
            .iter()
            .any(|r| r.email.eq_ignore_ascii_case(email) && Some(&r.id) != except)
    }
}

fn matches_search(record: &EmployeeRecord, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [
        record.name.to_lowercase(),
        record.email.to_lowercase(),
        record.phone.to_lowercase(),
        record.age.to_string(),
        record.class.to_lowercase(),
    ]
    .iter()
    .any(|field| field.contains(&needle))
}

fn compare(a: &EmployeeRecord, b: &EmployeeRecord, field: SortField) -> Ordering {
    let primary = match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Age => a.age.cmp(&b.age),
        SortField::Class => a.class.cmp(&b.class),
        SortField::Attendance => a
            .attendance
            .partial_cmp(&b.attendance)
            .unwrap_or(Ordering::Equal),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn parse_cursor(cursor: &str) -> RemoteResult<usize> {
    cursor
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| RemoteError::Rejected(format!("invalid cursor: {}", cursor)))
}

fn list(records: &[EmployeeRecord], spec: &QuerySpec) -> RemoteResult<EmployeeConnection> {
    let mut matching: Vec<EmployeeRecord> = records
        .iter()
        .filter(|r| {
            spec.filter
                .search
                .as_deref()
                .is_none_or(|needle| matches_search(r, needle))
        })
        .filter(|r| spec.filter.class.as_deref().is_none_or(|c| r.class == c))
        .filter(|r| spec.filter.status.is_none_or(|s| r.status == s))
        .cloned()
        .collect();

    matching.sort_by(|a, b| {
        let ord = compare(a, b, spec.sort.field);
        match spec.sort.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let start = match &spec.after_cursor {
        Some(cursor) => parse_cursor(cursor)? + 1,
        None => 0,
    };
    let total = matching.len();
    let end = (start + spec.page_size as usize).min(total);
    let page: Vec<EmployeeRecord> = if start < total {
        matching[start..end].to_vec()
    } else {
        Vec::new()
    };

    let cursor = |i: usize| format!("{}{}", CURSOR_PREFIX, i);
    Ok(EmployeeConnection {
        page_info: PageInfo {
            has_next_page: end < total,
            has_previous_page: start > 0,
            start_cursor: (!page.is_empty()).then(|| cursor(start)),
            end_cursor: (!page.is_empty()).then(|| cursor(end - 1)),
        },
        records: page,
        total_count: total as u64,
    })
}

#[async_trait]
impl EmployeeService for FakeDirectory {
    async fn login(&self, email: &str, password: &str) -> RemoteResult<LoginGrant> {
        self.calls.login.fetch_add(1, AtomicOrdering::SeqCst);
        self.injected(Operation::Login)?;

        let mut state = self.state.lock();
        let identity = match state.accounts.get(email) {
            Some(account) if account.password == password => account.identity.clone(),
            _ => return Err(RemoteError::InvalidCredentials),
        };
        let token = format!("fake-token-{}", state.next_token);
        state.next_token += 1;
        state.tokens.insert(token.clone(), identity.clone());
        Ok(LoginGrant { token, identity })
    }

    async fn identity_probe(&self) -> RemoteResult<UserIdentity> {
        self.calls.probe.fetch_add(1, AtomicOrdering::SeqCst);
        self.injected(Operation::GetMe)?;

        let bearer = self.bearer.lock().as_ref().and_then(SharedToken::bearer);
        let state = self.state.lock();
        bearer
            .and_then(|token| state.tokens.get(&token).cloned())
            .ok_or(RemoteError::Unauthorized)
    }

    async fn list_employees(&self, spec: &QuerySpec) -> RemoteResult<EmployeeConnection> {
        self.calls.list.fetch_add(1, AtomicOrdering::SeqCst);
        let mut paused = self.paused.subscribe();
        let _ = paused.wait_for(|paused| !*paused).await;

        self.injected(Operation::GetEmployees)?;
        let state = self.state.lock();
        list(&state.records, spec)
    }

    async fn get_employee(&self, id: &EmployeeId) -> RemoteResult<EmployeeRecord> {
        self.calls.get.fetch_add(1, AtomicOrdering::SeqCst);
        self.injected(Operation::GetEmployee)?;
        self.record(id).ok_or_else(|| RemoteError::NotFound(id.clone()))
    }

    async fn create_employee(&self, input: &NewEmployee) -> RemoteResult<EmployeeRecord> {
        self.mutation_gate(Operation::CreateEmployee).await?;
        if Self::email_taken(&self.state.lock(), &input.email, None) {
            return Err(RemoteError::Rejected("Email already exists".into()));
        }
        Ok(self.insert(input.clone(), EmploymentStatus::Active))
    }

    async fn update_employee(
        &self,
        id: &EmployeeId,
        changes: &EmployeeChanges,
    ) -> RemoteResult<EmployeeRecord> {
        self.mutation_gate(Operation::UpdateEmployee).await?;
        let mut state = self.state.lock();
        if let Some(email) = &changes.email {
            if Self::email_taken(&state, email, Some(id)) {
                return Err(RemoteError::Rejected("Email already exists".into()));
            }
        }
        let record = state
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;

        if let Some(name) = &changes.name {
            record.name = name.clone();
        }
        if let Some(email) = &changes.email {
            record.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            record.phone = phone.clone();
        }
        if let Some(age) = changes.age {
            record.age = age;
        }
        if let Some(class) = &changes.class {
            record.class = class.clone();
        }
        if let Some(subjects) = &changes.subjects {
            record.subjects = subjects.clone();
        }
        if let Some(attendance) = changes.attendance {
            record.attendance = attendance;
        }
        Ok(record.clone())
    }

    async fn update_employee_status(
        &self,
        id: &EmployeeId,
        status: EmploymentStatus,
    ) -> RemoteResult<StatusChange> {
        self.mutation_gate(Operation::UpdateEmployeeStatus).await?;
        let mut state = self.state.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        record.status = status;
        Ok(StatusChange {
            id: id.clone(),
            status,
        })
    }

    async fn delete_employee(&self, id: &EmployeeId) -> RemoteResult<bool> {
        self.mutation_gate(Operation::DeleteEmployee).await?;
        let mut state = self.state.lock();
        let before = state.records.len();
        state.records.retain(|r| &r.id != id);
        Ok(state.records.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QuerySpecBuilder;

    #[tokio::test]
    async fn test_search_spans_fields() {
        let directory = FakeDirectory::seeded();
        let by_email = QuerySpecBuilder::new().search("GRACE@").build();
        let page = directory.list_employees(&by_email).await.unwrap();
        assert_eq!(page.total_count, 1);

        let by_age = QuerySpecBuilder::new().search("41").build();
        let page = directory.list_employees(&by_age).await.unwrap();
        assert_eq!(page.records[0].name, "Alan Turing");
    }

    #[tokio::test]
    async fn test_cursor_pagination_walks_every_record() {
        let directory = FakeDirectory::seeded();
        let mut spec = QuerySpecBuilder::new().page_size(3).build();
        let mut seen = Vec::new();
        loop {
            let page = directory.list_employees(&spec).await.unwrap();
            assert_eq!(page.total_count, 4);
            seen.extend(page.records.iter().map(|r| r.name.clone()));
            match spec.next_page(&page.page_info) {
                Some(next) => spec = next,
                None => break,
            }
        }
        assert_eq!(
            seen,
            vec!["Ada Lovelace", "Alan Turing", "Grace Hopper", "Jo March"]
        );
    }

    #[tokio::test]
    async fn test_sort_descending_by_attendance() {
        let directory = FakeDirectory::seeded();
        let spec = QuerySpecBuilder::new()
            .sort(SortField::Attendance)
            .order(SortOrder::Desc)
            .build();
        let page = directory.list_employees(&spec).await.unwrap();
        assert_eq!(page.records[0].name, "Ada Lovelace");
        assert_eq!(page.records[3].name, "Jo March");
    }

    #[tokio::test]
    async fn test_login_and_probe() {
        let directory = FakeDirectory::seeded();
        assert_eq!(
            directory.login("admin@example.com", "wrong").await.unwrap_err(),
            RemoteError::InvalidCredentials
        );

        let grant = directory.login("admin@example.com", "admin123").await.unwrap();
        let token = SharedToken::new();
        directory.attach_token(token.clone());
        assert_eq!(
            directory.identity_probe().await.unwrap_err(),
            RemoteError::Unauthorized
        );

        token.set(crate::session::SessionToken::parse(grant.token));
        assert_eq!(directory.identity_probe().await.unwrap(), grant.identity);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let directory = FakeDirectory::seeded();
        let input = NewEmployee::new("Other Ada", "ada@example.com", "secret1");
        assert!(matches!(
            directory.create_employee(&input).await,
            Err(RemoteError::Rejected(_))
        ));
    }
}
