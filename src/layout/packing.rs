/// First-fit row assignment for one lane.
///
/// Rows hold half-open pixel intervals. An interval goes to the first row it
/// does not overlap; a new row opens while the lane is under its cap, and
/// once the cap is reached the interval is forced into row 0 even if that
/// overlaps.
#[derive(Debug)]
pub(crate) struct RowPacker {
    rows: Vec<Vec<(i64, i64)>>,
    max_rows: usize,
    forced: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub row: usize,
    pub forced: bool,
}

impl RowPacker {
    pub(crate) fn new(max_rows: usize) -> Self {
        Self {
            rows: Vec::new(),
            max_rows: max_rows.max(1),
            forced: 0,
        }
    }

    pub(crate) fn place(&mut self, start: i64, end: i64) -> Placement {
        let free_row = self.rows.iter().position(|row| {
            row.iter()
                .all(|&(taken_start, taken_end)| !overlaps(start, end, taken_start, taken_end))
        });

        if let Some(row) = free_row {
            self.rows[row].push((start, end));
            return Placement { row, forced: false };
        }

        if self.rows.len() < self.max_rows {
            self.rows.push(vec![(start, end)]);
            return Placement {
                row: self.rows.len() - 1,
                forced: false,
            };
        }

        self.rows[0].push((start, end));
        self.forced += 1;
        Placement { row: 0, forced: true }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn forced(&self) -> usize {
        self.forced
    }
}

fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    !(a_end <= b_start || b_end <= a_start)
}
