use std::sync::Arc;

use async_trait::async_trait;
use creditbook::models::bookings::{BookingState, CancelOutcome, EnrollOutcome, EnrollRejection};
use creditbook::models::courses::Course;
use creditbook::services::{AdmissionService, BookingService, CourseCatalog};
use creditbook::EngineResult;
use sea_orm::EntityTrait;
use time::macros::datetime;
use tokio::{sync::Barrier, task::JoinSet};
use uuid::Uuid;

use crate::common::{setup_app, test_config, START};

#[tokio::test]
async fn test_single_credit_covers_one_course() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let coach = Uuid::new_v4();
    let course1 = app.course(coach, 10).await;
    let course2 = app.course(coach, 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 1, 100).await;

    let first = admission.enroll(account, course1).await.unwrap();
    assert!(first.is_enrolled());

    let second = admission.enroll(account, course2).await.unwrap();
    assert_eq!(second, EnrollOutcome::Rejected(EnrollRejection::InsufficientCredit));
}

#[tokio::test]
async fn test_enroll_unknown_course_is_not_found() {
    let app = setup_app().await;
    let account = Uuid::new_v4();
    app.grant(account, 5, 500).await;

    let outcome = app
        .state
        .admission_service
        .enroll(account, Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(outcome, EnrollOutcome::Rejected(EnrollRejection::NotFound));
}

#[tokio::test]
async fn test_double_enroll_yields_already_enrolled() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 5, 500).await;

    assert!(admission.enroll(account, course).await.unwrap().is_enrolled());
    assert_eq!(
        admission.enroll(account, course).await.unwrap(),
        EnrollOutcome::Rejected(EnrollRejection::AlreadyEnrolled)
    );

    // Only one credit was spent
    let remaining = app.state.metrics_service.remaining_credit(account).await.unwrap();
    assert_eq!(remaining, 4);
}

#[tokio::test]
async fn test_already_enrolled_is_checked_before_credit() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 1, 100).await;

    assert!(admission.enroll(account, course).await.unwrap().is_enrolled());

    // No credit left either, but the duplicate is what gets reported
    assert_eq!(
        admission.enroll(account, course).await.unwrap(),
        EnrollOutcome::Rejected(EnrollRejection::AlreadyEnrolled)
    );
}

#[tokio::test]
async fn test_credit_is_checked_before_capacity() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 1).await;
    let holder = Uuid::new_v4();
    app.grant(holder, 1, 100).await;
    assert!(admission.enroll(holder, course).await.unwrap().is_enrolled());

    let broke = Uuid::new_v4();
    assert_eq!(
        admission.enroll(broke, course).await.unwrap(),
        EnrollOutcome::Rejected(EnrollRejection::InsufficientCredit)
    );
}

#[tokio::test]
async fn test_full_course_rejects_until_a_seat_frees_up() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 1).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    app.grant(alice, 1, 100).await;
    app.grant(bob, 1, 100).await;

    assert!(admission.enroll(alice, course).await.unwrap().is_enrolled());
    assert_eq!(
        admission.enroll(bob, course).await.unwrap(),
        EnrollOutcome::Rejected(EnrollRejection::CapacityExceeded)
    );

    assert!(admission.cancel(alice, course).await.unwrap().is_cancelled());
    assert!(admission.enroll(bob, course).await.unwrap().is_enrolled());
}

#[tokio::test]
async fn test_cancel_twice_yields_not_enrolled() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 1, 100).await;
    assert!(admission.enroll(account, course).await.unwrap().is_enrolled());

    assert!(admission.cancel(account, course).await.unwrap().is_cancelled());
    assert_eq!(
        admission.cancel(account, course).await.unwrap(),
        CancelOutcome::NotEnrolled
    );
}

#[tokio::test]
async fn test_cancel_without_booking_is_not_enrolled() {
    let app = setup_app().await;
    let course = app.course(Uuid::new_v4(), 10).await;

    let outcome = app
        .state
        .admission_service
        .cancel(Uuid::new_v4(), course)
        .await
        .unwrap();

    assert_eq!(outcome, CancelOutcome::NotEnrolled);
}

#[tokio::test]
async fn test_cancel_stamps_clock_time_and_keeps_the_row() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 1, 100).await;

    let enrolled = match admission.enroll(account, course).await.unwrap() {
        EnrollOutcome::Enrolled(booking) => booking,
        other => panic!("expected enrollment, got {:?}", other),
    };
    assert_eq!(enrolled.created_at, START);
    assert_eq!(enrolled.state, BookingState::Active);

    app.clock.advance(time::Duration::hours(2));
    let cancelled = match admission.cancel(account, course).await.unwrap() {
        CancelOutcome::Cancelled(booking) => booking,
        other => panic!("expected cancellation, got {:?}", other),
    };

    assert_eq!(cancelled.id, enrolled.id);
    assert_eq!(
        cancelled.state,
        BookingState::Cancelled {
            at: START + time::Duration::hours(2)
        }
    );

    let stored = entity::course_bookings::Entity::find_by_id(enrolled.id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("booking row must survive cancellation");
    assert_eq!(stored.cancelled_at, Some(START + time::Duration::hours(2)));
}

#[tokio::test]
async fn test_reenroll_after_cancel_creates_new_booking() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 1, 100).await;

    assert!(admission.enroll(account, course).await.unwrap().is_enrolled());
    assert!(admission.cancel(account, course).await.unwrap().is_cancelled());
    assert!(admission.enroll(account, course).await.unwrap().is_enrolled());

    let history = app
        .state
        .metrics_service
        .account_booking_history(account)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[0].state.is_active());
    assert!(history[1].state.is_active());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enrolls_for_last_seat() {
    let app = setup_app().await;
    let admission = app.state.admission_service.clone();

    let course = app.course(Uuid::new_v4(), 1).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    app.grant(alice, 1, 100).await;
    app.grant(bob, 1, 100).await;

    let barrier = Arc::new(Barrier::new(2));
    let mut tasks = JoinSet::new();
    for account in [alice, bob] {
        let admission = admission.clone();
        let barrier = barrier.clone();
        tasks.spawn(async move {
            barrier.wait().await;
            admission.enroll(account, course).await
        });
    }

    let mut enrolled = 0;
    let mut full = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap().unwrap() {
            EnrollOutcome::Enrolled(_) => enrolled += 1,
            EnrollOutcome::Rejected(EnrollRejection::CapacityExceeded) => full += 1,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(enrolled, 1);
    assert_eq!(full, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enrolls_never_overbook() {
    let app = setup_app().await;
    let admission = app.state.admission_service.clone();

    let capacity = 3;
    let course = app.course(Uuid::new_v4(), capacity).await;

    let mut accounts = Vec::new();
    for _ in 0..10 {
        let account = Uuid::new_v4();
        app.grant(account, 1, 100).await;
        accounts.push(account);
    }

    let barrier = Arc::new(Barrier::new(accounts.len()));
    let mut tasks = JoinSet::new();
    for account in accounts {
        let admission = admission.clone();
        let barrier = barrier.clone();
        tasks.spawn(async move {
            barrier.wait().await;
            admission.enroll(account, course).await
        });
    }

    let mut enrolled = 0;
    let mut full = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap().unwrap() {
            EnrollOutcome::Enrolled(_) => enrolled += 1,
            EnrollOutcome::Rejected(EnrollRejection::CapacityExceeded) => full += 1,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(enrolled, 3);
    assert_eq!(full, 7);

    let active = BookingService::active_count_for_course(&app.db, course)
        .await
        .unwrap();
    assert_eq!(active, i64::from(capacity));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enrolls_never_overspend() {
    let app = setup_app().await;
    let admission = app.state.admission_service.clone();

    let coach = Uuid::new_v4();
    let account = Uuid::new_v4();
    app.grant(account, 2, 200).await;

    let mut courses = Vec::new();
    for _ in 0..6 {
        courses.push(app.course(coach, 10).await);
    }

    let barrier = Arc::new(Barrier::new(courses.len()));
    let mut tasks = JoinSet::new();
    for course in courses {
        let admission = admission.clone();
        let barrier = barrier.clone();
        tasks.spawn(async move {
            barrier.wait().await;
            admission.enroll(account, course).await
        });
    }

    let mut enrolled = 0;
    let mut broke = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap().unwrap() {
            EnrollOutcome::Enrolled(_) => enrolled += 1,
            EnrollOutcome::Rejected(EnrollRejection::InsufficientCredit) => broke += 1,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(enrolled, 2);
    assert_eq!(broke, 4);
    assert_eq!(
        app.state.metrics_service.remaining_credit(account).await.unwrap(),
        0
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_enrolls_create_one_booking() {
    let app = setup_app().await;
    let admission = app.state.admission_service.clone();

    let course = app.course(Uuid::new_v4(), 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 5, 500).await;

    let barrier = Arc::new(Barrier::new(5));
    let mut handles = Vec::new();
    for _ in 0..5 {
        let admission = admission.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            admission.enroll(account, course).await
        }));
    }

    let outcomes: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let enrolled = outcomes.iter().filter(|o| o.is_enrolled()).count();
    let duplicate = outcomes
        .iter()
        .filter(|o| o.rejection() == Some(EnrollRejection::AlreadyEnrolled))
        .count();

    assert_eq!(enrolled, 1, "Exactly one enrollment should win");
    assert_eq!(duplicate, 4);
    assert_eq!(
        BookingService::active_count_for_account(&app.db, account)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_cancel_once() {
    let app = setup_app().await;
    let admission = app.state.admission_service.clone();

    let course = app.course(Uuid::new_v4(), 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 1, 100).await;
    assert!(admission.enroll(account, course).await.unwrap().is_enrolled());

    let barrier = Arc::new(Barrier::new(5));
    let mut handles = Vec::new();
    for _ in 0..5 {
        let admission = admission.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            admission.cancel(account, course).await
        }));
    }

    let outcomes: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let cancelled = outcomes.iter().filter(|o| o.is_cancelled()).count();

    assert_eq!(cancelled, 1, "Only one cancel should release the credit");
    assert_eq!(outcomes.len() - cancelled, 4);
}

/// Catalog held in memory, with nothing in the `courses` table
struct InMemoryCatalog {
    courses: Vec<Course>,
}

#[async_trait]
impl CourseCatalog for InMemoryCatalog {
    async fn get(&self, course_id: Uuid) -> EngineResult<Option<Course>> {
        Ok(self.courses.iter().find(|c| c.id == course_id).cloned())
    }

    async fn courses_by_coach(&self, coach_id: Uuid) -> EngineResult<Vec<Course>> {
        Ok(self
            .courses
            .iter()
            .filter(|c| c.coach_id == coach_id)
            .cloned()
            .collect())
    }
}

#[tokio::test]
async fn test_enroll_through_catalog_outside_the_database() {
    let app = setup_app().await;

    let course = Course {
        id: Uuid::new_v4(),
        coach_id: Uuid::new_v4(),
        name: "Morning flow".to_string(),
        capacity: 1,
        starts_at: datetime!(2025-03-10 09:00 UTC),
        ends_at: datetime!(2025-03-10 10:00 UTC),
    };
    let admission = AdmissionService::new(
        app.db.clone(),
        Arc::new(InMemoryCatalog {
            courses: vec![course.clone()],
        }),
        app.clock.clone(),
        &test_config().admission,
    );

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    app.grant(alice, 1, 100).await;
    app.grant(bob, 1, 100).await;

    let first = admission.enroll(alice, course.id).await.unwrap();
    assert!(first.is_enrolled());

    let second = admission.enroll(bob, course.id).await.unwrap();
    assert_eq!(
        second,
        EnrollOutcome::Rejected(EnrollRejection::CapacityExceeded)
    );

    let unknown = admission.enroll(bob, Uuid::new_v4()).await.unwrap();
    assert_eq!(unknown, EnrollOutcome::Rejected(EnrollRejection::NotFound));

    assert!(admission.cancel(alice, course.id).await.unwrap().is_cancelled());
}
