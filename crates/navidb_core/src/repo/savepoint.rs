//! Named savepoint scope for multi-statement procedures.
//!
//! Savepoints nest inside caller-managed transactions, so procedures stay
//! atomic without taking over transaction boundaries.

use rusqlite::Connection;

struct SavepointGuard<'conn> {
    conn: &'conn Connection,
    name: &'static str,
    released: bool,
}

impl<'conn> SavepointGuard<'conn> {
    fn begin(conn: &'conn Connection, name: &'static str) -> rusqlite::Result<Self> {
        conn.execute_batch(&format!("SAVEPOINT {name};"))?;
        Ok(Self {
            conn,
            name,
            released: false,
        })
    }

    fn release(mut self) -> rusqlite::Result<()> {
        self.conn
            .execute_batch(&format!("RELEASE SAVEPOINT {};", self.name))?;
        self.released = true;
        Ok(())
    }
}

impl Drop for SavepointGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Errors cannot escape drop; the original failure is already on its way up.
        let _ = self.conn.execute_batch(&format!(
            "ROLLBACK TO SAVEPOINT {0}; RELEASE SAVEPOINT {0};",
            self.name
        ));
    }
}

/// Runs `body` inside savepoint `name`, releasing it on success and rolling
/// it back on any error.
///
/// `name` must be a plain SQL identifier.
pub(crate) fn within_savepoint<T, E>(
    conn: &Connection,
    name: &'static str,
    body: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<rusqlite::Error>,
{
    let guard = SavepointGuard::begin(conn, name)?;
    let value = body(conn)?;
    guard.release()?;
    Ok(value)
}
