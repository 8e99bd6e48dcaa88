/// Coordinate tolerances used across edge snapping, grid resolution and
/// shading matching. All values are in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Quantum that cell edges are rounded to before grid indexing.
    pub grid_quantum: f64,
    /// Slack allowed when testing that a filled rectangle contains a cell.
    pub shading: f64,
    /// Collinear ruling edges closer than this are snapped together.
    pub snap: f64,
    /// Collinear ruling edges with gaps up to this are joined.
    pub join: f64,
    /// Slack when intersecting horizontal and vertical ruling edges.
    pub intersection: f64,
    /// Ruling edges shorter than this are ignored.
    pub min_edge_length: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            grid_quantum: 1.0,
            shading: 5.0,
            snap: 3.0,
            join: 3.0,
            intersection: 3.0,
            min_edge_length: 3.0,
        }
    }
}

impl Tolerance {
    /// Rounds a coordinate onto the grid quantum, returning the index key.
    /// A non-positive quantum falls back to whole points.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantize(&self, value: f64) -> i64 {
        let quantum = if self.grid_quantum > 0.0 {
            self.grid_quantum
        } else {
            1.0
        };
        (value / quantum).round() as i64
    }

    #[must_use]
    pub fn grid_aligned(&self, left: f64, right: f64) -> bool {
        self.quantize(left) == self.quantize(right)
    }

    #[must_use]
    pub fn near(value: f64, other: f64, slack: f64) -> bool {
        (value - other).abs() <= slack
    }
}
