//! Reader for the calendar storage database.
//!
//! Rows are streamed from the live statement: [`ThunderbirdStore::events`]
//! prepares the join and [`EventQuery::cursor`] runs it, yielding a
//! [`RowCursor`] the assembler pulls from one row at a time.

use std::fmt;
use std::path::{Path, PathBuf};

use calgrid_core::timezone::FLOATING;
use calgrid_core::{RawRow, RowSource, SourceError};
use rusqlite::{Connection, OpenFlags, Row, Rows, Statement};
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};

/// The event/recurrence join, one row per recurrence line, grouped by event.
pub const EVENTS_QUERY: &str = "\
SELECT e.cal_id, e.title, e.event_start, e.event_end, r.icalString, e.id, e.flags, \
       e.event_start_tz, e.event_end_tz, e.recurrence_id, e.event_stamp
FROM cal_events e
LEFT OUTER JOIN cal_recurrence r ON e.id = r.item_id AND e.cal_id = r.cal_id
ORDER BY e.id";

/// A read-only handle on a calendar storage database.
#[derive(Debug)]
pub struct ThunderbirdStore {
    conn: Connection,
    path: PathBuf,
}

impl ThunderbirdStore {
    /// Opens the database at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not a database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::open(path, e))?;
        debug!(path = %path.display(), "Opened calendar database");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Returns the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prepares the event join.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared, for instance on
    /// a database without the calendar tables.
    pub fn events(&self) -> StoreResult<EventQuery<'_>> {
        let stmt = self.conn.prepare(EVENTS_QUERY)?;
        Ok(EventQuery { stmt })
    }

    /// Fetches every row of the event join at once, ordered by event id.
    ///
    /// # Errors
    ///
    /// See [`ThunderbirdStore::events`]; also fails if a row cannot be read.
    pub fn load_rows(&self) -> StoreResult<Vec<RawRow>> {
        let mut query = self.events()?;
        let rows = query
            .stmt
            .query_map([], raw_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "Fetched event rows");
        Ok(rows)
    }
}

/// The prepared event join.
#[derive(Debug)]
pub struct EventQuery<'conn> {
    stmt: Statement<'conn>,
}

impl EventQuery<'_> {
    /// Runs the join and returns a cursor over its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be started.
    pub fn cursor(&mut self) -> StoreResult<RowCursor<'_>> {
        let rows = self.stmt.query([])?;
        Ok(RowCursor { rows, pulled: 0 })
    }
}

/// A forward-only cursor over the rows of the event join.
pub struct RowCursor<'stmt> {
    rows: Rows<'stmt>,
    pulled: usize,
}

impl RowCursor<'_> {
    /// Returns the number of rows pulled so far.
    pub fn pulled(&self) -> usize {
        self.pulled
    }
}

impl fmt::Debug for RowCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCursor")
            .field("pulled", &self.pulled)
            .finish_non_exhaustive()
    }
}

impl RowSource for RowCursor<'_> {
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError> {
        let row = match self.rows.next() {
            Ok(Some(row)) => raw_row(row),
            Ok(None) => {
                debug!(rows = self.pulled, "Event rows exhausted");
                return Ok(None);
            }
            Err(e) => Err(e),
        };
        let row = row.map_err(|e| SourceError::new("cannot read event row").with_source(e))?;
        self.pulled += 1;
        Ok(Some(row))
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    let zone = |index: usize| -> rusqlite::Result<String> {
        Ok(row
            .get::<_, Option<String>>(index)?
            .unwrap_or_else(|| FLOATING.to_string()))
    };

    let raw = RawRow {
        calendar_id: row.get(0)?,
        title: row.get(1)?,
        start: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        end: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
        recurrence_payload: row.get(4)?,
        event_id: row.get(5)?,
        flags: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
        start_tz: zone(7)?,
        end_tz: zone(8)?,
        recurrence_id: row.get(9)?,
        stamp: row.get(10)?,
    };
    trace!(event_id = %raw.event_id, has_payload = raw.recurrence_payload.is_some(), "Row");
    Ok(raw)
}
