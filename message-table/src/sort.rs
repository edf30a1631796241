use crate::record::Record;

/// The single active sort: one column, one direction. `None` at the session
/// level until the user picks a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub descending: bool,
}

impl SortState {
    /// Apply a header selection: re-selecting the active column toggles the
    /// direction, any other column starts a fresh ascending sort.
    pub fn select(current: Option<SortState>, column: usize) -> SortState {
        match current {
            Some(state) if state.column == column => SortState {
                column,
                descending: !state.descending,
            },
            _ => SortState {
                column,
                descending: false,
            },
        }
    }
}

/// Cell text that is all ASCII digits compares numerically, everything else
/// lexicographically. Numeric keys order before text keys, so one column with
/// mixed content still has a total order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(i64),
    Text(String),
}

fn sort_key(text: String) -> SortKey {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        // Digit runs too long for i64 fall back to text comparison.
        if let Ok(number) = text.parse() {
            return SortKey::Number(number);
        }
    }
    SortKey::Text(text)
}

/// Stable, type-aware ordering of the visible set. Records with equal keys
/// keep their relative (insertion) order in both directions.
pub fn order(records: &mut [Record], state: &SortState) {
    records.sort_by(|a, b| {
        let ordering = sort_key(a.cell_text(state.column)).cmp(&sort_key(b.cell_text(state.column)));
        if state.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
