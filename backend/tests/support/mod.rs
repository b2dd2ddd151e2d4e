//! Embedded PostgreSQL helpers for the Diesel adapter suites.
//!
//! The suites are opt-in: they run only when `RUN_PG_EMBEDDED=1` and are
//! marked `#[ignore]`, so `cargo test -- --ignored` is also required.
//! Installation and data directories default to the target directory so the
//! bootstrap works in sandboxes that forbid writes to `/var/tmp`.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::TestCluster;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static BOOTSTRAP_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// True when the embedded suites were explicitly requested.
pub fn embedded_postgres_requested() -> bool {
    std::env::var("RUN_PG_EMBEDDED").as_deref() == Ok("1")
}

fn scratch_dirs() -> Result<(PathBuf, PathBuf), std::io::Error> {
    let target = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("target"));
    let base = target
        .join("pg-embed")
        .join(format!("{}-{}", std::process::id(), Uuid::new_v4()));
    let runtime_dir = base.join("install");
    let data_dir = base.join("data");
    std::fs::create_dir_all(&runtime_dir)?;
    std::fs::create_dir_all(&data_dir)?;
    Ok((runtime_dir, data_dir))
}

/// Start a cluster, overriding `PG_RUNTIME_DIR`/`PG_DATA_DIR` when unset.
pub fn start_cluster() -> Result<TestCluster, String> {
    let _guard = BOOTSTRAP_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let needs_override =
        std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none();
    let _env = if needs_override {
        let (runtime_dir, data_dir) = scratch_dirs().map_err(|err| err.to_string())?;
        Some(env_lock::lock_env([
            (
                "PG_RUNTIME_DIR",
                Some(runtime_dir.to_string_lossy().into_owned()),
            ),
            ("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())),
        ]))
    } else {
        None
    };

    TestCluster::new().map_err(|err| format!("{err:?}"))
}

/// Apply every migration to the database at `url`.
pub fn migrate(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|err| format!("migrate: {err}"))
}

/// Drop the route tables to simulate schema loss.
pub fn drop_route_tables(url: &str) -> Result<(), String> {
    use diesel::RunQueryDsl;

    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    diesel::sql_query("DROP TABLE IF EXISTS waypoints, routes CASCADE")
        .execute(&mut conn)
        .map(|_| ())
        .map_err(|err| format!("drop: {err}"))
}
