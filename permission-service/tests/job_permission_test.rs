//! Integration tests for job checks and the worker assignment cache.

mod common;

use common::{refs, TestApp};
use permission_service::models::{PermissionLevel, ResourceKind};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn job(id: &str) -> permission_service::authz::ResourceRefs {
    refs(&[(ResourceKind::Job, id)])
}

// ============================================================================
// Workers
// ============================================================================

#[tokio::test]
async fn test_worker_executes_only_its_job() {
    let app = TestApp::new();
    let user = app.create_user("hatchery");
    app.create_job(10, &[]);
    app.create_job(11, &[]);
    let worker = app.worker_for(&user, Some(10)).await;

    assert_ok!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
            .await
    );
    let err = assert_err!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("11"))
            .await
    );
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn test_cached_grant_skips_job_store() {
    let app = TestApp::new();
    let user = app.create_user("hatchery");
    app.create_job(10, &[]);
    let worker = app.worker_for(&user, Some(10)).await;

    for _ in 0..3 {
        assert_ok!(
            app.authorizer
                .check_permission(&worker, PermissionLevel::ReadWriteExecute, &job("10"))
                .await
        );
    }
    assert_eq!(app.store.call_count("load_job_run"), 1);
    assert_eq!(app.cache.sets(), 1);
    assert_eq!(app.cache.gets(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cached_grant_expires_after_ttl() {
    let app = TestApp::with_ttl(60);
    let user = app.create_user("hatchery");
    app.create_job(10, &[]);
    let worker = app.worker_for(&user, Some(10)).await;

    assert_ok!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
            .await
    );
    tokio::time::advance(Duration::from_secs(59)).await;
    assert_ok!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
            .await
    );
    assert_eq!(app.store.call_count("load_job_run"), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_ok!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
            .await
    );
    assert_eq!(app.store.call_count("load_job_run"), 2);
}

#[tokio::test]
async fn test_unbounded_ttl_keeps_worker_grant() {
    let app = TestApp::with_ttl(u64::MAX);
    let user = app.create_user("hatchery");
    app.create_job(10, &[]);
    let worker = app.worker_for(&user, Some(10)).await;

    for _ in 0..2 {
        assert_ok!(
            app.authorizer
                .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
                .await
        );
    }
    assert_eq!(app.store.call_count("load_job_run"), 1);
}

/// A worker denied once stays denied until the cached denial expires, even
/// after it is assigned the job.
#[tokio::test(start_paused = true)]
async fn test_cached_denial_outlives_reassignment_until_ttl() {
    let app = TestApp::with_ttl(3600);
    let user = app.create_user("hatchery");
    app.create_job(10, &[]);
    let mut worker = app.worker_for(&user, None).await;

    let err = assert_err!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
            .await
    );
    assert!(err.is_forbidden());

    if let Some(w) = worker.worker.as_mut() {
        w.job_run_id = Some(10);
    }

    tokio::time::advance(Duration::from_secs(3599)).await;
    assert_err!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
            .await
    );
    assert_eq!(app.store.call_count("load_job_run"), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_ok!(
        app.authorizer
            .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
            .await
    );
}

#[tokio::test]
async fn test_cache_failure_falls_back_to_evaluation() {
    let app = TestApp::new();
    let user = app.create_user("hatchery");
    app.create_job(10, &[]);
    let worker = app.worker_for(&user, Some(10)).await;
    app.cache.fail.store(true, Ordering::SeqCst);

    for _ in 0..2 {
        assert_ok!(
            app.authorizer
                .check_permission(&worker, PermissionLevel::ReadExecute, &job("10"))
                .await
        );
    }
    assert_eq!(app.store.call_count("load_job_run"), 2);
}

#[tokio::test]
async fn test_worker_read_uses_exec_groups() {
    let app = TestApp::new();
    let user = app.create_user("hatchery");
    app.create_group(5, "builders", &[(&user, false)]);
    app.create_job(10, &[5]);
    app.create_job(11, &[6]);
    let worker = app.worker_for(&user, Some(99)).await;

    assert_ok!(app.authorizer.check_permission(&worker, PermissionLevel::Read, &job("10")).await);
    assert_err!(app.authorizer.check_permission(&worker, PermissionLevel::Read, &job("11")).await);
    assert_eq!(app.cache.gets(), 0);
}

// ============================================================================
// Other consumers
// ============================================================================

#[tokio::test]
async fn test_exec_groups_or_admin_for_regular_consumers() {
    let app = TestApp::new();
    let member = app.create_user("member");
    let outsider = app.create_user("outsider");
    let admin = app.create_admin("root");
    app.create_group(5, "builders", &[(&member, false)]);
    app.create_job(10, &[5]);

    let member = app.consumer_for(&member).await;
    let outsider = app.consumer_for(&outsider).await;
    let admin = app.consumer_for(&admin).await;
    let execute = PermissionLevel::ReadExecute;

    assert_ok!(app.authorizer.check_permission(&member, execute, &job("10")).await);
    assert_ok!(app.authorizer.check_permission(&admin, execute, &job("10")).await);
    let err = assert_err!(app.authorizer.check_permission(&outsider, execute, &job("10")).await);
    assert!(err.is_forbidden());
    assert_eq!(app.cache.gets(), 0);
}

#[tokio::test]
async fn test_missing_job_is_forbidden() {
    let app = TestApp::new();
    let admin = app.create_admin("root");
    let consumer = app.consumer_for(&admin).await;

    let err = assert_err!(
        app.authorizer
            .check_permission(&consumer, PermissionLevel::Read, &job("404"))
            .await
    );
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn test_malformed_job_id_is_wrong_request() {
    let app = TestApp::new();
    let user = app.create_user("hatchery");
    let worker = app.worker_for(&user, Some(10)).await;

    for id in ["", "ten", "10.5"] {
        let err = assert_err!(
            app.authorizer
                .check_permission(&worker, PermissionLevel::ReadExecute, &job(id))
                .await
        );
        assert!(err.is_wrong_request(), "{:?}", id);
    }
    assert_eq!(app.store.call_count("load_job_run"), 0);
}
