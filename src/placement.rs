// Lays schedule records out on the slot x weekday grid.

use thiserror::Error;
use tracing::warn;

use crate::format;
use crate::model::ScheduleRecord;
use crate::time_grid::{self, slot_index_for, TIME_SLOTS, WEEKDAYS};

// ============================================================================
// Grid Cells
// ============================================================================

/// A single slot of one weekday.
///
/// Primary cells have `row_span >= 1` and carry the text; continuation cells
/// are occupied with `row_span == 0` and render nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridCell<'a> {
    pub content: String,
    pub row_span: usize,
    pub is_occupied: bool,
    pub source: Option<&'a ScheduleRecord>,
    pub is_merged_continuation: bool,
}

impl<'a> GridCell<'a> {
    pub fn is_primary(&self) -> bool {
        self.is_occupied && self.row_span > 0
    }

    pub fn is_continuation(&self) -> bool {
        self.is_occupied && self.row_span == 0
    }
}

// ============================================================================
// Placement Diagnostics
// ============================================================================

/// Why a record was left off the grid.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementIssue {
    #[error("unknown day")]
    UnknownDay,
    #[error("unreadable time")]
    UnreadableTime,
    #[error("time out of range")]
    TimeOutOfRange,
    #[error("invalid duration")]
    InvalidDuration,
    #[error("slot not available")]
    SlotUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementWarning {
    pub issue: PlacementIssue,
    pub record: String,
}

/// Records skipped during one export, in the order they were met.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<PlacementWarning>,
}

impl Diagnostics {
    pub fn push(&mut self, issue: PlacementIssue, record: &ScheduleRecord) {
        let record = record.describe();
        warn!(%record, %issue, "schedule skipped");
        self.warnings.push(PlacementWarning { issue, record });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn warnings(&self) -> &[PlacementWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn count(&self, issue: PlacementIssue) -> usize {
        self.warnings.iter().filter(|w| w.issue == issue).count()
    }
}

// ============================================================================
// Timetable Grid
// ============================================================================

/// Rows follow [`TIME_SLOTS`], columns follow [`WEEKDAYS`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimetableGrid<'a> {
    rows: Vec<Vec<GridCell<'a>>>,
}

impl<'a> Default for TimetableGrid<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TimetableGrid<'a> {
    pub fn new() -> Self {
        TimetableGrid {
            rows: (0..TIME_SLOTS.len())
                .map(|_| vec![GridCell::default(); WEEKDAYS.len()])
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&GridCell<'a>> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn row(&self, row: usize) -> &[GridCell<'a>] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All primary cells as `(row, column, cell)`.
    pub fn primary_cells(&self) -> impl Iterator<Item = (usize, usize, &GridCell<'a>)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_primary())
                .map(move |(c, cell)| (r, c, cell))
        })
    }

    /// Rows after which no primary cell continues into the next row.
    ///
    /// Consecutive rows between two boundaries must stay on one page.
    pub fn row_groups(&self) -> Vec<std::ops::Range<usize>> {
        let mut groups = Vec::new();
        let mut start = 0;
        let mut reach = 0;

        for row in 0..self.rows.len() {
            for cell in self.row(row).iter().filter(|c| c.is_primary()) {
                reach = reach.max(row + cell.row_span);
            }
            reach = reach.max(row + 1);
            if reach == row + 1 {
                groups.push(start..row + 1);
                start = row + 1;
            }
        }
        if start < self.rows.len() {
            groups.push(start..self.rows.len());
        }
        groups
    }

    /// Put one record on the grid, all or nothing.
    pub fn place(&mut self, record: &'a ScheduleRecord) -> Result<(), PlacementIssue> {
        let column = record.weekday().ok_or(PlacementIssue::UnknownDay)?.column();
        let start = record.start_minutes().ok_or(PlacementIssue::UnreadableTime)?;
        let end = record.end_minutes().ok_or(PlacementIssue::UnreadableTime)?;

        let start_slot = slot_index_for(start).ok_or(PlacementIssue::TimeOutOfRange)?;
        let end_slot = slot_index_for(end).ok_or(PlacementIssue::TimeOutOfRange)?;

        if end_slot <= start_slot {
            return Err(PlacementIssue::InvalidDuration);
        }
        let duration = end_slot - start_slot;

        for row in start_slot..start_slot + duration {
            match self.cell(row, column) {
                Some(cell) if !cell.is_occupied => {}
                _ => return Err(PlacementIssue::SlotUnavailable),
            }
        }

        self.rows[start_slot][column] = GridCell {
            content: format::cell_text(record),
            row_span: duration,
            is_occupied: true,
            source: Some(record),
            is_merged_continuation: duration > 1,
        };
        for row in start_slot + 1..start_slot + duration {
            self.rows[row][column] = GridCell {
                content: String::new(),
                row_span: 0,
                is_occupied: true,
                source: Some(record),
                is_merged_continuation: true,
            };
        }

        Ok(())
    }
}

// ============================================================================
// Placement
// ============================================================================

/// A filled grid and the records it had to skip.
#[derive(Debug, Clone)]
pub struct Placement<'a> {
    pub grid: TimetableGrid<'a>,
    pub diagnostics: Diagnostics,
}

/// Canonical placement order: weekday rank, then start time. Stable, so
/// records with equal keys keep their input order.
pub fn sort_for_placement<'a, I>(records: I) -> Vec<&'a ScheduleRecord>
where
    I: IntoIterator<Item = &'a ScheduleRecord>,
{
    let mut sorted: Vec<&ScheduleRecord> = records.into_iter().collect();
    sorted.sort_by_key(|r| {
        (
            time_grid::day_rank(&r.day),
            r.start_minutes().unwrap_or(u32::MAX),
        )
    });
    sorted
}

/// Build a fresh grid. When two records contend for a slot the one that
/// sorts first keeps it.
pub fn build_grid<'a, I>(records: I) -> Placement<'a>
where
    I: IntoIterator<Item = &'a ScheduleRecord>,
{
    let mut grid = TimetableGrid::new();
    let mut diagnostics = Diagnostics::default();

    for record in sort_for_placement(records) {
        if let Err(issue) = grid.place(record) {
            diagnostics.push(issue, record);
        }
    }

    Placement { grid, diagnostics }
}
