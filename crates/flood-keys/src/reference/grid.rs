use super::parser::AtRiskRow;
use crate::lookup::domain::Peril;
use std::collections::{HashMap, HashSet};

/// Arc-second cell exposed to a peril.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub peril: Peril,
    pub lat_id: i64,
    pub lon_id: i64,
}

/// Shared at-risk membership set, indexed by latitude id.
#[derive(Debug, Clone, Default)]
pub struct AtRiskGrid {
    by_lat: HashMap<i64, Vec<(i64, Peril)>>,
    len: usize,
}

impl AtRiskGrid {
    pub fn from_cells<I: IntoIterator<Item = GridCell>>(cells: I) -> Self {
        let mut unique = HashSet::new();
        let mut by_lat: HashMap<i64, Vec<(i64, Peril)>> = HashMap::new();
        for cell in cells {
            if unique.insert(cell) {
                by_lat
                    .entry(cell.lat_id)
                    .or_default()
                    .push((cell.lon_id, cell.peril));
            }
        }
        Self {
            by_lat,
            len: unique.len(),
        }
    }

    /// Returns the grid and the number of rows whose peril was not recognised. A row without
    /// a peril marks the cell at risk for every peril.
    pub(crate) fn from_rows(rows: Vec<AtRiskRow>) -> (Self, usize) {
        let mut skipped = 0;
        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let cell = |peril| GridCell {
                peril,
                lat_id: row.lat_id,
                lon_id: row.lon_id,
            };
            match row.peril_id.as_deref() {
                None => cells.extend(Peril::ordered().map(cell)),
                Some(code) => match parse_grid_peril(code) {
                    Some(peril) => cells.push(cell(peril)),
                    None => skipped += 1,
                },
            }
        }
        (Self::from_cells(cells), skipped)
    }

    pub fn contains(&self, cell: &GridCell) -> bool {
        self.by_lat
            .get(&cell.lat_id)
            .map(|row| row.contains(&(cell.lon_id, cell.peril)))
            .unwrap_or(false)
    }

    /// Private copy restricted to the cells a batch can hit. The shared grid is left untouched.
    pub fn narrowed(&self, lat_ids: &HashSet<i64>, lon_ids: &HashSet<i64>) -> AtRiskView {
        let mut cells = HashSet::new();
        for lat_id in lat_ids {
            if let Some(row) = self.by_lat.get(lat_id) {
                cells.extend(
                    row.iter()
                        .filter(|(lon_id, _)| lon_ids.contains(lon_id))
                        .map(|(lon_id, peril)| GridCell {
                            peril: *peril,
                            lat_id: *lat_id,
                            lon_id: *lon_id,
                        }),
                );
            }
        }
        AtRiskView { cells }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Per-call scratch view over the at-risk grid.
#[derive(Debug, Clone, Default)]
pub struct AtRiskView {
    cells: HashSet<GridCell>,
}

impl AtRiskView {
    pub fn contains(&self, cell: &GridCell) -> bool {
        self.cells.contains(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn parse_grid_peril(value: &str) -> Option<Peril> {
    match value.trim() {
        "1" => Some(Peril::Fluvial),
        "2" => Some(Peril::Pluvial),
        "3" => Some(Peril::Coastal),
        other => Peril::from_code(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(peril: Peril, lat_id: i64, lon_id: i64) -> GridCell {
        GridCell {
            peril,
            lat_id,
            lon_id,
        }
    }

    #[test]
    fn narrowing_builds_a_private_view() {
        let grid = AtRiskGrid::from_cells([
            cell(Peril::Fluvial, 10, 20),
            cell(Peril::Pluvial, 10, 21),
            cell(Peril::Coastal, 11, 20),
        ]);

        let view = grid.narrowed(&HashSet::from([10]), &HashSet::from([20]));
        assert_eq!(view.len(), 1);
        assert!(view.contains(&cell(Peril::Fluvial, 10, 20)));
        assert!(!view.contains(&cell(Peril::Pluvial, 10, 21)));

        // a second, different batch still sees the full grid
        let other = grid.narrowed(&HashSet::from([10, 11]), &HashSet::from([20, 21]));
        assert_eq!(other.len(), 3);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn duplicate_cells_collapse() {
        let grid = AtRiskGrid::from_cells([
            cell(Peril::Fluvial, 1, 1),
            cell(Peril::Fluvial, 1, 1),
        ]);
        assert_eq!(grid.len(), 1);
        assert!(grid.contains(&cell(Peril::Fluvial, 1, 1)));
        assert!(!grid.contains(&cell(Peril::Coastal, 1, 1)));
    }

    #[test]
    fn rows_without_peril_cover_every_peril() {
        let row = |peril_id: Option<&str>, lat_id| AtRiskRow {
            peril_id: peril_id.map(str::to_string),
            lat_id,
            lon_id: 5,
        };
        let (grid, skipped) =
            AtRiskGrid::from_rows(vec![row(None, 1), row(Some("2"), 2), row(Some("XYZ"), 3)]);

        assert_eq!(skipped, 1);
        assert_eq!(grid.len(), 4);
        for peril in Peril::ordered() {
            assert!(grid.contains(&cell(peril, 1, 5)));
        }
        assert!(grid.contains(&cell(Peril::Pluvial, 2, 5)));
        assert!(!grid.contains(&cell(Peril::Fluvial, 2, 5)));
    }
}
