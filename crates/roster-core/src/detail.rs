//! Single-record detail handle

use crate::model::{EmployeeId, EmployeeRecord};
use crate::remote::{EmployeeService, RemoteResult};
use std::sync::Arc;
use tracing::debug;

/// A caller-owned view of one employee record
///
/// The collection cache never closes or updates a detail view. After deleting
/// a record the caller checks [`DetailView::references`] and closes it.
pub struct DetailView {
    service: Arc<dyn EmployeeService>,
    id: EmployeeId,
    record: Option<EmployeeRecord>,
}

impl DetailView {
    /// Fetch `id` and open a view on it
    pub async fn open(service: Arc<dyn EmployeeService>, id: &EmployeeId) -> RemoteResult<Self> {
        let record = service.get_employee(id).await?;
        debug!(id = %id, "Opened detail view");
        Ok(Self {
            service,
            id: id.clone(),
            record: Some(record),
        })
    }

    /// Open a view on a record already in hand, e.g. a row of a cached page
    pub fn from_record(service: Arc<dyn EmployeeService>, record: EmployeeRecord) -> Self {
        Self {
            service,
            id: record.id.clone(),
            record: Some(record),
        }
    }

    pub fn id(&self) -> &EmployeeId {
        &self.id
    }

    /// The record as last fetched; `None` once closed
    pub fn record(&self) -> Option<&EmployeeRecord> {
        self.record.as_ref()
    }

    /// Fetch the record again; on failure the previous copy is kept
    pub async fn reload(&mut self) -> RemoteResult<&EmployeeRecord> {
        let record = self.service.get_employee(&self.id).await?;
        Ok(&*self.record.insert(record))
    }

    pub fn close(&mut self) {
        if self.record.take().is_some() {
            debug!(id = %self.id, "Closed detail view");
        }
    }

    pub fn is_open(&self) -> bool {
        self.record.is_some()
    }

    pub fn references(&self, id: &EmployeeId) -> bool {
        self.is_open() && &self.id == id
    }
}

impl std::fmt::Debug for DetailView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailView")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use crate::testing::FakeDirectory;

    #[tokio::test]
    async fn test_open_and_close() {
        let directory = Arc::new(FakeDirectory::seeded());
        let id = EmployeeId::from("2");

        let mut view = DetailView::open(directory, &id).await.unwrap();
        assert_eq!(view.record().unwrap().name, "Grace Hopper");
        assert!(view.references(&id));
        assert!(!view.references(&EmployeeId::from("1")));

        view.close();
        assert!(!view.is_open());
        assert!(!view.references(&id));
    }

    #[tokio::test]
    async fn test_open_unknown_is_not_found() {
        let directory = Arc::new(FakeDirectory::seeded());
        let id = EmployeeId::from("99");
        let err = DetailView::open(directory, &id).await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound(id));
    }

    #[tokio::test]
    async fn test_view_outlives_deletion_until_closed() {
        let directory = Arc::new(FakeDirectory::seeded());
        let id = EmployeeId::from("4");
        let mut view = DetailView::open(directory.clone(), &id).await.unwrap();

        assert!(directory.delete_employee(&id).await.unwrap());
        assert!(view.is_open());
        assert_eq!(view.record().unwrap().name, "Alan Turing");

        let err = view.reload().await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound(id.clone()));
        assert!(view.is_open());

        view.close();
        assert!(!view.references(&id));
    }
}
