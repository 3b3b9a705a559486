use creditbook::{
    models::{courses::CourseStatus, reports::CoachMonthlyReport},
    EngineError,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use time::macros::datetime;
use uuid::Uuid;

use crate::common::setup_app;

#[tokio::test]
async fn test_coach_monthly_report_uses_blended_price() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;
    let metrics = &app.state.metrics_service;

    let coach = Uuid::new_v4();
    let other_coach = Uuid::new_v4();
    let yoga = app.course(coach, 10).await;
    let pilates = app.course(coach, 10).await;
    let boxing = app.course(other_coach, 10).await;

    // 10 credits sold for 1000 in total -> 100 per credit
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    app.grant(alice, 4, 400).await;
    app.grant(bob, 6, 600).await;

    // Three bookings in March on this coach's courses
    app.clock.set(datetime!(2025-03-03 10:00 UTC));
    assert!(admission.enroll(alice, yoga).await.unwrap().is_enrolled());
    app.clock.set(datetime!(2025-03-15 10:00 UTC));
    assert!(admission.enroll(bob, yoga).await.unwrap().is_enrolled());
    app.clock.set(datetime!(2025-03-31 23:59:59 UTC));
    assert!(admission.enroll(alice, pilates).await.unwrap().is_enrolled());

    // Another coach's course in March, and this coach's course in April
    assert!(admission.enroll(bob, boxing).await.unwrap().is_enrolled());
    app.clock.set(datetime!(2025-04-01 00:00 UTC));
    assert!(admission.enroll(bob, pilates).await.unwrap().is_enrolled());

    // Cancelling later does not take March's booking out of the report
    assert!(admission.cancel(alice, yoga).await.unwrap().is_cancelled());

    let march = metrics.coach_monthly_report(coach, 2025, 3).await.unwrap();
    assert_eq!(
        march,
        CoachMonthlyReport {
            revenue: 300,
            participants: 2,
            course_count: 3,
        }
    );

    let april = metrics.coach_monthly_report(coach, 2025, 4).await.unwrap();
    assert_eq!(april.course_count, 1);
    assert_eq!(april.participants, 1);
    assert_eq!(april.revenue, 100);
}

#[tokio::test]
async fn test_coach_without_courses_gets_zero_report() {
    let app = setup_app().await;
    app.grant(Uuid::new_v4(), 10, 1000).await;

    let report = app
        .state
        .metrics_service
        .coach_monthly_report(Uuid::new_v4(), 2025, 3)
        .await
        .unwrap();

    assert_eq!(report, CoachMonthlyReport::default());
}

#[tokio::test]
async fn test_coach_report_rejects_invalid_month() {
    let app = setup_app().await;

    let result = app
        .state
        .metrics_service
        .coach_monthly_report(Uuid::new_v4(), 2025, 13)
        .await;

    assert!(matches!(result, Err(EngineError::BadRequest(_))));
}

#[tokio::test]
async fn test_remaining_credit_tracks_active_bookings() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;
    let metrics = &app.state.metrics_service;

    let coach = Uuid::new_v4();
    let first = app.course(coach, 10).await;
    let second = app.course(coach, 10).await;
    let account = Uuid::new_v4();
    app.grant(account, 3, 300).await;

    assert_eq!(metrics.remaining_credit(account).await.unwrap(), 3);

    admission.enroll(account, first).await.unwrap();
    admission.enroll(account, second).await.unwrap();
    let summary = metrics.account_credit_summary(account).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.used, 2);
    assert_eq!(summary.remaining, 1);

    admission.cancel(account, first).await.unwrap();
    assert_eq!(metrics.remaining_credit(account).await.unwrap(), 2);

    // Unknown accounts simply have nothing
    assert_eq!(metrics.remaining_credit(Uuid::new_v4()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_roster_size_at_point_in_time() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;
    let metrics = &app.state.metrics_service;

    let course = app.course(Uuid::new_v4(), 10).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    app.grant(alice, 1, 100).await;
    app.grant(bob, 1, 100).await;

    app.clock.set(datetime!(2025-03-10 10:00 UTC));
    admission.enroll(alice, course).await.unwrap();
    app.clock.set(datetime!(2025-03-11 10:00 UTC));
    admission.enroll(bob, course).await.unwrap();
    app.clock.set(datetime!(2025-03-12 10:00 UTC));
    admission.cancel(alice, course).await.unwrap();

    let expected = [
        (datetime!(2025-03-09 00:00 UTC), 0),
        (datetime!(2025-03-10 12:00 UTC), 1),
        (datetime!(2025-03-11 12:00 UTC), 2),
        (datetime!(2025-03-12 12:00 UTC), 1),
    ];
    for (at, size) in expected {
        assert_eq!(metrics.course_roster_size(course, at).await.unwrap(), size, "at {}", at);
    }
}

#[tokio::test]
async fn test_course_status_from_catalog_window() {
    let app = setup_app().await;
    let metrics = &app.state.metrics_service;

    let course = app
        .course_with_window(
            Uuid::new_v4(),
            5,
            datetime!(2025-03-10 09:00 UTC),
            datetime!(2025-03-10 10:00 UTC),
        )
        .await;

    assert_eq!(
        metrics
            .course_status(course, datetime!(2025-03-10 08:00 UTC))
            .await
            .unwrap(),
        CourseStatus::NotStarted
    );
    assert_eq!(
        metrics
            .course_status(course, datetime!(2025-03-10 10:00 UTC))
            .await
            .unwrap(),
        CourseStatus::Open
    );
    assert_eq!(
        metrics
            .course_status(course, datetime!(2025-03-10 10:00:01 UTC))
            .await
            .unwrap(),
        CourseStatus::Ended
    );

    let missing = metrics
        .course_status(Uuid::new_v4(), datetime!(2025-03-10 10:00 UTC))
        .await;
    assert!(matches!(missing, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn test_booking_history_is_ordered_with_course_status() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let coach = Uuid::new_v4();
    let past = app
        .course_with_window(
            coach,
            5,
            datetime!(2025-02-01 09:00 UTC),
            datetime!(2025-02-01 10:00 UTC),
        )
        .await;
    let upcoming = app
        .course_with_window(
            coach,
            5,
            datetime!(2025-06-01 09:00 UTC),
            datetime!(2025-06-01 10:00 UTC),
        )
        .await;
    let account = Uuid::new_v4();
    app.grant(account, 2, 200).await;

    app.clock.set(datetime!(2025-01-20 10:00 UTC));
    admission.enroll(account, past).await.unwrap();
    app.clock.set(datetime!(2025-01-21 10:00 UTC));
    admission.enroll(account, upcoming).await.unwrap();
    app.clock.set(datetime!(2025-01-22 10:00 UTC));
    admission.cancel(account, upcoming).await.unwrap();

    app.clock.set(datetime!(2025-03-01 00:00 UTC));
    let history = app
        .state
        .metrics_service
        .account_booking_history(account)
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].course_id, past);
    assert!(history[0].state.is_active());
    assert_eq!(history[0].course_status, Some(CourseStatus::Ended));

    assert_eq!(history[1].course_id, upcoming);
    assert_eq!(
        history[1].state.cancelled_at(),
        Some(datetime!(2025-01-22 10:00 UTC))
    );
    assert_eq!(history[1].course_status, Some(CourseStatus::NotStarted));
}

#[tokio::test]
async fn test_coach_course_overview_counts_participants() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let coach = Uuid::new_v4();
    let busy = app.course(coach, 5).await;
    let quiet = app.course(coach, 5).await;
    app.course(Uuid::new_v4(), 5).await;

    for _ in 0..3 {
        let account = Uuid::new_v4();
        app.grant(account, 1, 100).await;
        admission.enroll(account, busy).await.unwrap();
    }

    let overview = app
        .state
        .metrics_service
        .coach_course_overview(coach)
        .await
        .unwrap();

    assert_eq!(overview.len(), 2);
    let busy_line = overview.iter().find(|c| c.course_id == busy).unwrap();
    let quiet_line = overview.iter().find(|c| c.course_id == quiet).unwrap();
    assert_eq!(busy_line.participants, 3);
    assert_eq!(busy_line.capacity, 5);
    assert_eq!(busy_line.status, CourseStatus::Open);
    assert_eq!(quiet_line.participants, 0);
}

#[tokio::test]
async fn test_bookings_outlive_course_removed_from_catalog() {
    let app = setup_app().await;
    let admission = &app.state.admission_service;

    let course = app.course(Uuid::new_v4(), 5).await;
    let account = Uuid::new_v4();
    app.grant(account, 1, 100).await;
    assert!(admission.enroll(account, course).await.unwrap().is_enrolled());

    entity::courses::Entity::delete_by_id(course)
        .exec(&app.db)
        .await
        .unwrap();

    let rows = entity::course_bookings::Entity::find()
        .filter(entity::course_bookings::Column::CourseId.eq(course))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let history = app
        .state
        .metrics_service
        .account_booking_history(account)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].course_id, course);
    assert!(history[0].state.is_active());
    assert_eq!(history[0].course_status, None);

    // The booking still holds its credit
    assert_eq!(
        app.state.metrics_service.remaining_credit(account).await.unwrap(),
        0
    );
}
