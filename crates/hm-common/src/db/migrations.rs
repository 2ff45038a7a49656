use thiserror::Error;
use tracing::info;

use super::pool::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hm_users (
    id                   TEXT PRIMARY KEY,
    name                 TEXT NOT NULL,
    password_hash        TEXT,
    skills               TEXT[] NOT NULL DEFAULT '{}',
    preferences          TEXT[] NOT NULL DEFAULT '{}',
    time_slots           TEXT[] NOT NULL DEFAULT '{}',
    noise_tolerance      INT NOT NULL DEFAULT 50,
    space_requirement    INT NOT NULL DEFAULT 50,
    social_density       INT NOT NULL DEFAULT 50,
    urgency_acceptance   INT NOT NULL DEFAULT 50,
    multitask_capability INT NOT NULL DEFAULT 50,
    active_tasks         TEXT[] NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS hm_tasks (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    tags        TEXT[] NOT NULL DEFAULT '{}',
    time_slots  TEXT[] NOT NULL DEFAULT '{}',
    environment TEXT[] NOT NULL DEFAULT '{}',
    urgency     INT NOT NULL DEFAULT 1,
    level       INT NOT NULL DEFAULT 1,
    status      TEXT NOT NULL DEFAULT 'unassigned'
);

CREATE TABLE IF NOT EXISTS hm_assignments (
    id           TEXT PRIMARY KEY,
    task_id      TEXT NOT NULL REFERENCES hm_tasks(id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL REFERENCES hm_users(id),
    final_score  DOUBLE PRECISION NOT NULL,
    breakdown    JSONB NOT NULL,
    status       TEXT NOT NULL DEFAULT 'assigned',
    assigned_at  TIMESTAMPTZ NOT NULL,
    started_at   TIMESTAMPTZ,
    completed_at TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS hm_tasks_status_idx ON hm_tasks (status);
CREATE INDEX IF NOT EXISTS hm_assignments_task_idx ON hm_assignments (task_id);
"#;

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let client = pool.get().await?;
    client.batch_execute(SCHEMA).await?;
    info!("database schema ensured");
    Ok(())
}
