//! Create, edit, status and delete scenarios against a populated cache

mod common;

use common::Console;
use roster::auth;
use roster::{
    DetailView, EmployeeChanges, EmployeeId, EmploymentStatus, MutationError, NewEmployee,
    QuerySpec, QuerySpecBuilder, SessionStatus,
};

fn jo() -> NewEmployee {
    NewEmployee::new("Jo Bloggs", "jo.bloggs@example.com", "secret1")
        .with_phone("555-0142")
        .with_age(31)
        .with_class("A")
        .with_subjects(["Math", "", "Physics"])
        .with_attendance(88.0)
}

#[tokio::test]
async fn test_create_refreshes_every_held_page() {
    let console = Console::signed_in_admin().await;
    let all = QuerySpec::default();
    let class_a = QuerySpecBuilder::new().class("A").build();
    let searched = QuerySpecBuilder::new().search("jo").build();
    let mut before = Vec::new();
    for spec in [&all, &class_a, &searched] {
        before.push(console.cache.refresh(spec).await.unwrap().total_count);
    }

    let record = console.mutations.create(jo().validate().unwrap()).await.unwrap();

    assert_eq!(record.subjects, vec!["Math", "Physics"]);
    for (spec, count) in [&all, &class_a, &searched].into_iter().zip(before) {
        let page = console.cache.peek(spec).unwrap();
        assert!(page.is_fresh(), "{} not fresh", spec);
        assert_eq!(page.total_count, count + 1, "{}", spec);
    }
}

#[tokio::test]
async fn test_invalid_input_never_reaches_service() {
    let console = Console::signed_in_admin().await;

    let errors = NewEmployee::new("", "not-an-email", "short")
        .with_age(12)
        .validate()
        .unwrap_err();

    for field in ["name", "email", "password", "phone", "age", "class"] {
        assert!(errors.field(field).is_some(), "missing {} error", field);
    }
    assert_eq!(console.directory.mutation_calls(), 0);
}

#[tokio::test]
async fn test_delete_leaves_detail_view_to_caller() {
    let console = Console::signed_in_admin().await;
    let spec = QuerySpec::default();
    console.cache.refresh(&spec).await.unwrap();
    let id = EmployeeId::from("3");
    let mut view = DetailView::open(console.directory.clone(), &id).await.unwrap();

    let deleted = console.mutations.delete(&id).await.unwrap();

    assert_eq!(deleted.id, id);
    assert!(view.is_open());
    assert!(console.cache.peek(&spec).unwrap().find(&id).is_none());
    assert!(view.references(&deleted.id));
    view.close();
    assert!(!view.is_open());
}

#[tokio::test]
async fn test_admin_flags_employee() {
    let console = Console::signed_in_admin().await;
    let flagged = QuerySpecBuilder::new()
        .status(Some(EmploymentStatus::Flagged))
        .build();
    assert_eq!(console.cache.refresh(&flagged).await.unwrap().total_count, 1);

    let grant = auth::require_admin(&console.session.snapshot()).unwrap();
    let change = console
        .mutations
        .set_status(&grant, &EmployeeId::from("4"), EmploymentStatus::Flagged)
        .await
        .unwrap();

    assert_eq!(change.status, EmploymentStatus::Flagged);
    assert_eq!(console.cache.peek(&flagged).unwrap().total_count, 2);
}

#[tokio::test]
async fn test_rejected_edit_changes_nothing() {
    let console = Console::signed_in_admin().await;
    let spec = QuerySpec::default();
    let before = console.cache.refresh(&spec).await.unwrap();
    let listed = console.directory.list_calls();

    let changes = EmployeeChanges::new()
        .email("grace@example.com")
        .validate()
        .unwrap();
    let err = console
        .mutations
        .update(&EmployeeId::from("1"), changes)
        .await
        .unwrap_err();

    assert_eq!(err, MutationError::Rejected("Email already exists".into()));
    assert_eq!(console.cache.peek(&spec).unwrap(), before);
    assert_eq!(console.directory.list_calls(), listed);
}

#[tokio::test]
async fn test_unauthorized_mutation_ends_session() {
    let console = Console::signed_in_admin().await;
    console.directory.fail(
        roster::remote::Operation::UpdateEmployee,
        roster::RemoteError::Unauthorized,
    );

    let changes = EmployeeChanges::new().age(40).validate().unwrap();
    let err = console
        .mutations
        .update(&EmployeeId::from("2"), changes)
        .await
        .unwrap_err();

    assert_eq!(err, MutationError::Unauthorized);
    assert_eq!(console.session.snapshot().status, SessionStatus::Unauthenticated);
    assert!(console.storage.snapshot().is_none());
}
