//! Runs reconciliation against a live PostgreSQL server.
//!
//! Set `RLS_GUARD_TEST_URL` to a disposable database to enable these tests.
//! They drop and recreate the four target tables in `public` and a `billing`
//! schema. Without the variable every test returns early.

use std::sync::Arc;

use rls_guard_core::{
    ApplyMode, ApplyOptions, PgSecurityCatalog, RlsGuardError, RlsGuardService, TargetTable,
};
use serial_test::serial;
use sqlx::postgres::{PgPool, PgPoolOptions};

const TEST_URL_ENV: &str = "RLS_GUARD_TEST_URL";

const RESET_SQL: &str = "DROP SCHEMA IF EXISTS billing CASCADE;
DO $reset$
DECLARE r record;
BEGIN
    FOR r IN
        SELECT c.relname, c.relkind
        FROM pg_catalog.pg_class c
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = 'public'
          AND c.relname IN ('users', 'customers', 'invoices', 'revenue')
          AND c.relkind IN ('r', 'p', 'v')
    LOOP
        IF r.relkind = 'v' THEN
            EXECUTE format('DROP VIEW %I CASCADE', r.relname);
        ELSE
            EXECUTE format('DROP TABLE %I CASCADE', r.relname);
        END IF;
    END LOOP;
END $reset$";

const CREATE_TABLES_SQL: &str = "CREATE TABLE public.users (id bigint PRIMARY KEY);
CREATE TABLE public.customers (id bigint PRIMARY KEY);
CREATE TABLE public.invoices (id bigint PRIMARY KEY);
CREATE TABLE public.revenue (id bigint PRIMARY KEY)";

async fn live_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var(TEST_URL_ENV) else {
        eprintln!("{TEST_URL_ENV} not set, skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("test database should be reachable");
    sqlx::raw_sql(RESET_SQL)
        .execute(&pool)
        .await
        .expect("reset should succeed");
    Some(pool)
}

async fn run(pool: &PgPool, sql: &str) {
    sqlx::raw_sql(sql)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("setup failed for {sql}: {e}"));
}

fn service(pool: &PgPool) -> RlsGuardService {
    RlsGuardService::new(Arc::new(PgSecurityCatalog::from_pool(pool.clone())))
}

async fn rls_flag(pool: &PgPool, qualified: &str) -> bool {
    let (enabled,): (bool,) =
        sqlx::query_as("SELECT relrowsecurity FROM pg_catalog.pg_class WHERE oid = $1::regclass")
            .bind(qualified)
            .fetch_one(pool)
            .await
            .expect("table should exist");
    enabled
}

#[tokio::test]
#[serial]
async fn test_apply_twice_installs_each_policy_once() {
    let Some(pool) = live_pool().await else { return };
    run(&pool, CREATE_TABLES_SQL).await;
    let service = service(&pool);

    for _ in 0..2 {
        service
            .apply(ApplyOptions::default())
            .await
            .expect("apply should succeed");
    }

    let statuses = service.inspect().await.expect("inspect should succeed");
    assert_eq!(statuses.len(), 4);
    assert!(statuses.iter().all(|s| s.rls_enabled && s.schema == "public"));

    let audit = service.audit_policies().await.expect("audit should succeed");
    assert!(audit.is_compliant(), "drift after apply: {audit:?}");
    let on_targets = audit
        .present
        .iter()
        .filter(|p| TargetTable::from_name(&p.table).is_some())
        .count();
    assert_eq!(on_targets, 7);
}

#[tokio::test]
#[serial]
async fn test_apply_on_empty_database_is_a_no_op() {
    let Some(pool) = live_pool().await else { return };
    let service = service(&pool);

    let result = service
        .apply(ApplyOptions::default())
        .await
        .expect("apply should succeed without tables");

    assert!(result.success);
    assert!(service.inspect().await.expect("inspect").is_empty());
}

#[tokio::test]
#[serial]
async fn test_apply_with_rls_already_on_and_no_policies() {
    let Some(pool) = live_pool().await else { return };
    run(&pool, CREATE_TABLES_SQL).await;
    run(
        &pool,
        "ALTER TABLE public.users ENABLE ROW LEVEL SECURITY;
         ALTER TABLE public.revenue ENABLE ROW LEVEL SECURITY",
    )
    .await;
    let service = service(&pool);

    service
        .apply(ApplyOptions::default())
        .await
        .expect("apply should succeed");

    let audit = service.audit_policies().await.expect("audit should succeed");
    assert!(audit.missing.is_empty());
    for table in ["public.users", "public.customers", "public.invoices", "public.revenue"] {
        assert!(rls_flag(&pool, table).await, "{table} left without RLS");
    }
}

#[tokio::test]
#[serial]
async fn test_transactional_apply_commits_everything() {
    let Some(pool) = live_pool().await else { return };
    run(&pool, CREATE_TABLES_SQL).await;
    let service = service(&pool);

    let result = service
        .apply(ApplyOptions {
            mode: ApplyMode::Transactional,
        })
        .await
        .expect("transactional apply should succeed");

    assert_eq!(result.mode, ApplyMode::Transactional);
    let audit = service.audit_policies().await.expect("audit should succeed");
    assert!(audit.missing.is_empty());
}

// A view named like a target table makes `ENABLE ROW LEVEL SECURITY` fail on
// the fourth statement.
async fn catalog_with_revenue_view(pool: &PgPool) {
    run(
        pool,
        "CREATE TABLE public.users (id bigint PRIMARY KEY);
         CREATE TABLE public.customers (id bigint PRIMARY KEY);
         CREATE TABLE public.invoices (id bigint PRIMARY KEY);
         CREATE VIEW public.revenue AS SELECT 1 AS id",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn test_transactional_apply_rolls_back_on_failure() {
    let Some(pool) = live_pool().await else { return };
    catalog_with_revenue_view(&pool).await;
    let service = service(&pool);

    let err = service
        .apply(ApplyOptions {
            mode: ApplyMode::Transactional,
        })
        .await
        .expect_err("apply should fail on the view");

    assert!(matches!(err, RlsGuardError::Reconcile { completed: 0, .. }));
    assert!(!rls_flag(&pool, "public.users").await);
}

#[tokio::test]
#[serial]
async fn test_sequential_apply_keeps_completed_steps() {
    let Some(pool) = live_pool().await else { return };
    catalog_with_revenue_view(&pool).await;
    let service = service(&pool);

    let err = service
        .apply(ApplyOptions::default())
        .await
        .expect_err("apply should fail on the view");

    assert!(matches!(err, RlsGuardError::Reconcile { completed: 3, .. }));
    assert!(rls_flag(&pool, "public.users").await);
    assert!(rls_flag(&pool, "public.invoices").await);
}

#[tokio::test]
#[serial]
async fn test_tables_outside_search_path_are_not_reported_as_secured() {
    let Some(pool) = live_pool().await else { return };
    run(
        &pool,
        "CREATE SCHEMA billing;
         CREATE TABLE billing.users (id bigint PRIMARY KEY);
         CREATE TABLE billing.customers (id bigint PRIMARY KEY);
         CREATE TABLE billing.invoices (id bigint PRIMARY KEY);
         CREATE TABLE billing.revenue (id bigint PRIMARY KEY)",
    )
    .await;
    let service = service(&pool);

    service
        .apply(ApplyOptions::default())
        .await
        .expect("apply should succeed");

    // Both sides resolve through the search path, so neither touches billing.
    assert!(service.inspect().await.expect("inspect").is_empty());
    assert!(!rls_flag(&pool, "billing.users").await);
}
