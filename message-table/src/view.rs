use std::collections::HashMap;

use metrics::{counter, gauge};
use tokio::sync::Mutex;

use crate::dedup::DuplicateDetector;
use crate::error::TableError;
use crate::filter::{FilterSpec, Predicate};
use crate::record::{RawMessage, Record};
use crate::schema;
use crate::sort::{self, SortState};
use crate::stats::{Bounds, ColumnBounds};
use crate::store::RowStore;

/// One rendered column heading. `filtered` is the "this column is filtered"
/// indicator the presentation layer shows as a marker prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub title: String,
    pub filtered: bool,
}

/// One visible row, cells rendered as text in storage column order. Rows
/// carrying `duplicate` get the highlight tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub duplicate: bool,
}

/// The filtered, sorted view handed to the presentation layer. Each refresh
/// produces a complete replacement; there is no incremental diff, since a new
/// filter can retroactively hide rows that were visible before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub headings: Vec<Heading>,
    pub rows: Vec<TableRow>,
}

struct TableState {
    store: RowStore,
    dedup: DuplicateDetector,
    filter: FilterSpec,
    sort: Option<SortState>,
    bounds: ColumnBounds,
}

/// The session object that owns the row store and all derived view state.
///
/// Every operation serializes behind one lock: an inbound message's duplicate
/// check, insert and refresh run as one atomic unit, and a refresh never
/// interleaves with a concurrent insert. Filter and sort state live here,
/// never in ambient globals.
pub struct MessageTable {
    state: Mutex<TableState>,
}

impl MessageTable {
    pub fn new(store: RowStore, dedup: DuplicateDetector) -> MessageTable {
        MessageTable {
            state: Mutex::new(TableState {
                store,
                dedup,
                filter: FilterSpec::new(),
                sort: None,
                bounds: ColumnBounds::default(),
            }),
        }
    }

    /// Type, duplicate-check, persist and re-project one inbound message.
    /// Malformed payloads fail before the store is touched; storage failures
    /// leave the message unacknowledged for the transport to redeliver.
    pub async fn ingest(
        &self,
        payload: &[u8],
        attributes: &HashMap<String, String>,
    ) -> Result<TableSnapshot, TableError> {
        let raw = RawMessage::from_bytes(payload)?;
        let mut record = Record::from_wire(&raw, attributes, false)?;

        let mut state = self.state.lock().await;
        let state = &mut *state;

        record.duplicate = state
            .dedup
            .is_duplicate(&state.store, record.message_id)
            .await?;
        state.store.insert(&record).await?;

        counter!("table_messages_ingested_total").increment(1);
        if record.duplicate {
            counter!("table_messages_duplicate_total").increment(1);
        }

        refresh_state(state).await
    }

    /// Re-project the current view without mutating anything.
    pub async fn refresh(&self) -> Result<TableSnapshot, TableError> {
        let mut state = self.state.lock().await;
        refresh_state(&mut state).await
    }

    /// Commit a predicate for one column, replacing any prior predicate
    /// there. A rejected commit surfaces synchronously and leaves the
    /// previous filter state untouched.
    pub async fn set_filter(
        &self,
        column: usize,
        predicate: Predicate,
    ) -> Result<TableSnapshot, TableError> {
        let mut state = self.state.lock().await;
        let state = &mut *state;
        state.filter.set(column, predicate)?;
        refresh_state(state).await
    }

    /// Clear all filters and the sort, returning to the full view in
    /// insertion order.
    pub async fn reset_view(&self) -> Result<TableSnapshot, TableError> {
        let mut state = self.state.lock().await;
        let state = &mut *state;
        state.filter.clear();
        state.sort = None;
        refresh_state(state).await
    }

    /// Select a sort column: re-selecting the active column toggles the
    /// direction, any other column starts ascending.
    pub async fn sort_by(&self, column: usize) -> Result<TableSnapshot, TableError> {
        if schema::COLUMNS.get(column).is_none() {
            return Err(TableError::UnknownColumn(column));
        }
        let mut state = self.state.lock().await;
        let state = &mut *state;
        state.sort = Some(SortState::select(state.sort, column));
        refresh_state(state).await
    }

    /// Observed bounds for an Integer column, from the latest scan. Seeds
    /// the filter dialog's default min/max entries.
    pub async fn bounds(&self, column: usize) -> Option<Bounds> {
        self.state.lock().await.bounds.get(column)
    }

    /// The active predicate for a column, if any; its values take precedence
    /// over the observed bounds when seeding the filter dialog.
    pub async fn active_filter(&self, column: usize) -> Option<Predicate> {
        self.state.lock().await.filter.get(column).cloned()
    }
}

/// Full projection pass: scan, recompute bounds, filter, sort, render.
/// Runs with the session lock held so it never observes a half-written row.
async fn refresh_state(state: &mut TableState) -> Result<TableSnapshot, TableError> {
    let records = state.store.scan_all().await?;

    // Bounds cover the whole scan, before filtering: dialog defaults must
    // still span rows a filter currently hides.
    state.bounds.reset();
    for record in &records {
        state.bounds.observe(record);
    }

    let mut visible: Vec<Record> = records
        .into_iter()
        .filter(|record| state.filter.passes(record))
        .collect();
    if let Some(sort_state) = &state.sort {
        sort::order(&mut visible, sort_state);
    }

    let headings = schema::COLUMNS
        .iter()
        .enumerate()
        .map(|(ordinal, column)| Heading {
            title: schema::heading_title(column.name),
            filtered: state.filter.is_filtered(ordinal),
        })
        .collect();

    let rows: Vec<TableRow> = visible
        .iter()
        .map(|record| TableRow {
            cells: (0..schema::COLUMN_COUNT)
                .map(|ordinal| record.cell_text(ordinal))
                .collect(),
            duplicate: record.duplicate,
        })
        .collect();

    gauge!("table_visible_rows").set(rows.len() as f64);

    Ok(TableSnapshot { headings, rows })
}
