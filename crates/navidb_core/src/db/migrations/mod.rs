//! Ordered schema steps for the section database.
//!
//! Step `n` brings a database from `user_version = n - 1` to `n`. Steps are
//! never edited once released; schema changes append a new step.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::{Connection, Transaction};

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "comments",
        sql: include_str!("0001_comments.sql"),
    },
    Step {
        version: 2,
        name: "sections",
        sql: include_str!("0002_sections.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// Pending steps share one transaction, so a failure keeps the previous
/// version and tables.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = current_user_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&Step> = STEPS.iter().filter(|step| step.version > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        run_step(&tx, step).map_err(|source| DbError::MigrationFailed {
            version: step.version,
            name: step.name,
            source,
        })?;
        debug!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &Step) -> rusqlite::Result<()> {
    tx.execute_batch(step.sql)?;
    // PRAGMA does not take bound parameters.
    tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
