use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::record::{DEFAULT_VISIBLE, Field, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: Field,
    pub direction: SortDirection,
}

impl SortState {
    /// Same field flips the direction, another field starts ascending.
    pub fn toggle_or_set(&mut self, field: Field) {
        if self.field == field {
            self.direction = self.direction.reversed();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: Field::Name,
            direction: SortDirection::Ascending,
        }
    }
}

/// Ordered set of visible fields. Order is the order fields were switched on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Field>", into = "Vec<Field>")]
pub struct VisibleColumns(Vec<Field>);

impl VisibleColumns {
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    /// Removes a visible field or appends a hidden one.
    pub fn toggle(&mut self, field: Field) {
        if let Some(pos) = self.0.iter().position(|&f| f == field) {
            self.0.remove(pos);
        } else {
            self.0.push(field);
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for VisibleColumns {
    fn default() -> Self {
        Self(DEFAULT_VISIBLE.to_vec())
    }
}

impl From<Vec<Field>> for VisibleColumns {
    fn from(fields: Vec<Field>) -> Self {
        let mut unique = Vec::with_capacity(fields.len());
        for field in fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self(unique)
    }
}

impl From<VisibleColumns> for Vec<Field> {
    fn from(columns: VisibleColumns) -> Self {
        columns.0
    }
}

/// Indices (into the record store) of records where any visible field
/// contains `term`, ignoring case. Store order is preserved.
pub fn filter_rows(records: &[Record], visible: &VisibleColumns, term: &str) -> Vec<usize> {
    let needle = term.to_lowercase();
    records
        .par_iter()
        .enumerate()
        .filter(|(_, record)| matches_search(record, visible, &needle))
        .map(|(idx, _)| idx)
        .collect()
}

fn matches_search(record: &Record, visible: &VisibleColumns, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    visible
        .fields()
        .iter()
        .any(|&field| record.display(field).to_lowercase().contains(needle))
}

/// Sorts `rows` by the value of `sort.field`.
///
/// A record without a value for the field compares equal to everything, so
/// it keeps its slot; the records that have a value are stably sorted into
/// the remaining slots.
pub fn sort_rows(records: &[Record], rows: &mut [usize], sort: SortState) {
    let slots: Vec<usize> = (0..rows.len())
        .filter(|&slot| records[rows[slot]].get(sort.field).is_some())
        .collect();
    let mut present: Vec<usize> = slots.iter().map(|&slot| rows[slot]).collect();

    present.sort_by(|&a, &b| {
        let ordering = match (records[a].get(sort.field), records[b].get(sort.field)) {
            (Some(left), Some(right)) => left.compare(right),
            _ => Ordering::Equal,
        };
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    trace!(
        "Sorted {} of {} rows by {} {:?}",
        present.len(),
        rows.len(),
        sort.field,
        sort.direction
    );
    for (slot, row) in slots.into_iter().zip(present) {
        rows[slot] = row;
    }
}

/// Rows of page `page`. Pages past the end are empty.
pub fn paginate(rows: &[usize], page: usize, page_size: usize) -> &[usize] {
    let start = page.saturating_mul(page_size).min(rows.len());
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Filter then sort. The result is the full ordered view the pages are cut from.
pub fn view_rows(
    records: &[Record],
    visible: &VisibleColumns,
    term: &str,
    sort: SortState,
) -> Vec<usize> {
    let mut rows = filter_rows(records, visible, term);
    sort_rows(records, &mut rows, sort);
    rows
}
