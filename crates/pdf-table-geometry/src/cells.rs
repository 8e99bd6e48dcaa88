use std::collections::{BTreeMap, BTreeSet};

use crate::model::{BBox, TextCell};
use crate::table_parse::normalize_cell;
use crate::tolerance::Tolerance;

/// Share of the font size between the baseline and the glyph midpoint.
const MIDLINE_RATIO: f64 = 0.3;
/// Share of the font size into the first glyph used as the anchor x.
const ANCHOR_RATIO: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Orientation {
    Horizontal,
    Vertical,
}

/// Axis-aligned ruling segment. `position` is y for horizontal edges and x
/// for vertical ones; `start..end` runs along the other axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Edge {
    pub orientation: Orientation,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

impl Edge {
    pub(crate) fn horizontal(y: f64, x0: f64, x1: f64) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            position: y,
            start: x0.min(x1),
            end: x0.max(x1),
        }
    }

    pub(crate) fn vertical(x: f64, y0: f64, y1: f64) -> Self {
        Self {
            orientation: Orientation::Vertical,
            position: x,
            start: y0.min(y1),
            end: y0.max(y1),
        }
    }

    fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// A run of text shown at one position. `baseline` is in top-left
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextFragment {
    pub x: f64,
    pub baseline: f64,
    pub size: f64,
    pub text: String,
}

impl TextFragment {
    fn anchor(&self) -> (f64, f64) {
        (
            self.x + self.size * ANCHOR_RATIO,
            self.baseline - self.size * MIDLINE_RATIO,
        )
    }
}

/// Clusters edge positions per orientation; every member of a cluster moves
/// to the cluster mean.
fn snap_edges(edges: &[Edge], snap: f64) -> Vec<Edge> {
    let mut snapped = Vec::with_capacity(edges.len());
    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        let mut group = edges
            .iter()
            .filter(|edge| edge.orientation == orientation)
            .copied()
            .collect::<Vec<_>>();
        group.sort_by(|a, b| a.position.total_cmp(&b.position));

        let mut cluster: Vec<Edge> = Vec::new();
        for edge in group {
            if let Some(last) = cluster.last()
                && edge.position - last.position > snap
            {
                flush_cluster(&mut cluster, &mut snapped);
            }
            cluster.push(edge);
        }
        flush_cluster(&mut cluster, &mut snapped);
    }
    snapped
}

fn flush_cluster(cluster: &mut Vec<Edge>, out: &mut Vec<Edge>) {
    if cluster.is_empty() {
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = cluster.iter().map(|edge| edge.position).sum::<f64>() / cluster.len() as f64;
    out.extend(cluster.drain(..).map(|edge| Edge {
        position: mean,
        ..edge
    }));
}

/// Merges collinear edges whose gap is within `join`.
fn join_edges(edges: &[Edge], join: f64) -> Vec<Edge> {
    let mut sorted = edges.to_vec();
    sorted.sort_by(|a, b| {
        a.orientation
            .cmp(&b.orientation)
            .then(a.position.total_cmp(&b.position))
            .then(a.start.total_cmp(&b.start))
    });

    let mut joined: Vec<Edge> = Vec::with_capacity(sorted.len());
    for edge in sorted {
        match joined.last_mut() {
            Some(last)
                if last.orientation == edge.orientation
                    && (last.position - edge.position).abs() < f64::EPSILON
                    && edge.start <= last.end + join =>
            {
                last.end = last.end.max(edge.end);
            }
            _ => joined.push(edge),
        }
    }
    joined
}

pub(crate) fn normalize_edges(edges: &[Edge], tolerance: &Tolerance) -> Vec<Edge> {
    join_edges(&snap_edges(edges, tolerance.snap), tolerance.join)
        .into_iter()
        .filter(|edge| edge.length() >= tolerance.min_edge_length)
        .collect()
}

#[derive(Debug, Clone, Default)]
struct Intersection {
    x: f64,
    y: f64,
    vertical: BTreeSet<usize>,
    horizontal: BTreeSet<usize>,
}

impl Intersection {
    fn shares_vertical(&self, other: &Self) -> bool {
        !self.vertical.is_disjoint(&other.vertical)
    }

    fn shares_horizontal(&self, other: &Self) -> bool {
        !self.horizontal.is_disjoint(&other.horizontal)
    }
}

fn point_key(x: f64, y: f64) -> (i64, i64) {
    #[allow(clippy::cast_possible_truncation)]
    let key = |value: f64| (value * 1000.0).round() as i64;
    (key(y), key(x))
}

/// Points where a vertical and a horizontal edge cross, keyed by (y, x).
fn intersections(edges: &[Edge], tolerance: f64) -> BTreeMap<(i64, i64), Intersection> {
    let mut points: BTreeMap<(i64, i64), Intersection> = BTreeMap::new();
    for (v_index, vertical) in edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.orientation == Orientation::Vertical)
    {
        for (h_index, horizontal) in edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.orientation == Orientation::Horizontal)
        {
            let (x, y) = (vertical.position, horizontal.position);
            let crosses = x >= horizontal.start - tolerance
                && x <= horizontal.end + tolerance
                && y >= vertical.start - tolerance
                && y <= vertical.end + tolerance;
            if !crosses {
                continue;
            }
            let point = points.entry(point_key(x, y)).or_insert_with(|| Intersection {
                x,
                y,
                ..Intersection::default()
            });
            point.vertical.insert(v_index);
            point.horizontal.insert(h_index);
        }
    }
    points
}

/// Smallest rectangles whose four corners are intersections joined by edges.
fn cells_from_intersections(points: &BTreeMap<(i64, i64), Intersection>) -> Vec<BBox> {
    let ordered = points.values().collect::<Vec<_>>();
    let mut cells = Vec::new();

    for (index, corner) in ordered.iter().enumerate() {
        let rest = &ordered[index + 1..];
        let below = rest
            .iter()
            .filter(|point| (point.x - corner.x).abs() < f64::EPSILON && point.y > corner.y);
        let right = rest
            .iter()
            .filter(|point| (point.y - corner.y).abs() < f64::EPSILON && point.x > corner.x)
            .collect::<Vec<_>>();

        'search: for below_point in below {
            if !corner.shares_vertical(below_point) {
                continue;
            }
            for right_point in &right {
                if !corner.shares_horizontal(right_point) {
                    continue;
                }
                let Some(opposite) = points.get(&point_key(right_point.x, below_point.y)) else {
                    continue;
                };
                if opposite.shares_vertical(right_point) && opposite.shares_horizontal(below_point)
                {
                    cells.push(BBox::new(corner.x, corner.y, opposite.x, opposite.y));
                    break 'search;
                }
            }
        }
    }

    cells
}

fn find(parent: &mut [usize], index: usize) -> usize {
    let mut root = index;
    while parent[root] != root {
        root = parent[root];
    }
    let mut current = index;
    while parent[current] != root {
        let next = parent[current];
        parent[current] = root;
        current = next;
    }
    root
}

/// Groups cells that share at least one corner into tables, each sorted
/// top-to-bottom then left-to-right; tables are ordered the same way.
fn group_cells(cells: &[BBox]) -> Vec<Vec<BBox>> {
    let mut parent = (0..cells.len()).collect::<Vec<_>>();
    let mut owner: BTreeMap<(i64, i64), usize> = BTreeMap::new();

    for (index, cell) in cells.iter().enumerate() {
        let corners = [
            point_key(cell.left, cell.top),
            point_key(cell.right, cell.top),
            point_key(cell.left, cell.bottom),
            point_key(cell.right, cell.bottom),
        ];
        for corner in corners {
            match owner.get(&corner) {
                Some(&other) => {
                    let (a, b) = (find(&mut parent, index), find(&mut parent, other));
                    if a != b {
                        parent[a] = b;
                    }
                }
                None => {
                    owner.insert(corner, index);
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<BBox>> = BTreeMap::new();
    for (index, cell) in cells.iter().enumerate() {
        let root = find(&mut parent, index);
        groups.entry(root).or_default().push(*cell);
    }

    let by_reading_order = |a: &BBox, b: &BBox| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left));
    let mut tables = groups.into_values().collect::<Vec<_>>();
    for table in &mut tables {
        table.sort_by(by_reading_order);
    }
    tables.sort_by(|a, b| by_reading_order(&a[0], &b[0]));
    tables
}

/// Joins the fragments of one cell: same-line fragments by x with a space,
/// lines by baseline with a newline.
fn cell_text(fragments: &mut [&TextFragment]) -> String {
    fragments.sort_by(|a, b| a.baseline.total_cmp(&b.baseline).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();
    for fragment in fragments.iter().copied() {
        match lines.last_mut() {
            Some(line)
                if (line[0].baseline - fragment.baseline).abs()
                    <= line[0].size.max(fragment.size) / 2.0 =>
            {
                line.push(fragment);
            }
            _ => lines.push(vec![fragment]),
        }
    }

    let text = lines
        .iter_mut()
        .map(|line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            line.iter()
                .map(|fragment| fragment.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");
    normalize_cell(&text)
}

/// Detects ruled tables on a page and fills each cell with the text whose
/// first glyph falls inside it.
pub(crate) fn detect_cells(
    edges: &[Edge],
    fragments: &[TextFragment],
    tolerance: &Tolerance,
) -> Vec<Vec<TextCell>> {
    let edges = normalize_edges(edges, tolerance);
    let points = intersections(&edges, tolerance.intersection);
    let tables = group_cells(&cells_from_intersections(&points));

    let mut assigned: Vec<Vec<Vec<&TextFragment>>> = tables
        .iter()
        .map(|table| vec![Vec::new(); table.len()])
        .collect();
    for fragment in fragments {
        let (x, y) = fragment.anchor();
        let target = tables
            .iter()
            .enumerate()
            .flat_map(|(table_index, table)| {
                table
                    .iter()
                    .enumerate()
                    .map(move |(cell_index, cell)| (table_index, cell_index, cell))
            })
            .filter(|(_, _, cell)| cell.contains_point(x, y))
            .min_by(|a, b| {
                (a.2.width() * a.2.height()).total_cmp(&(b.2.width() * b.2.height()))
            });
        if let Some((table_index, cell_index, _)) = target {
            assigned[table_index][cell_index].push(fragment);
        }
    }

    tables
        .into_iter()
        .zip(assigned)
        .map(|(table, mut texts)| {
            table
                .into_iter()
                .zip(texts.iter_mut())
                .map(|(bbox, fragments)| TextCell::new(bbox, cell_text(fragments)))
                .collect()
        })
        .collect()
}
