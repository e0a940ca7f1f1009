//! Domain model: points, subject groups, and the aggregate flow demand
//! matrix between groups (C1).

use crate::error::{ArrangementError, ArrangementResult};
use crate::ids::{GroupIndex, PointIndex};
use std::collections::HashMap;

/// A candidate location inside the facility.
///
/// Immutable after construction, per the data model's lifetime note: point
/// objects live for the duration of one top-level arrangement call.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    name: String,
    x: f64,
    y: f64,
    area: u32,
}

impl Point {
    pub fn new(name: impl Into<String>, x: f64, y: f64, area: u32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            area,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn area(&self) -> u32 {
        self.area
    }
}

/// A class of identical subjects sharing input/output capacities and area.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectGroup {
    name: String,
    input_capacity: u32,
    output_capacity: u32,
    area: u32,
}

impl SubjectGroup {
    pub fn new(
        name: impl Into<String>,
        input_capacity: u32,
        output_capacity: u32,
        area: u32,
    ) -> Self {
        Self {
            name: name.into(),
            input_capacity,
            output_capacity,
            area,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_capacity(&self) -> u32 {
        self.input_capacity
    }

    pub fn output_capacity(&self) -> u32 {
        self.output_capacity
    }

    pub fn area(&self) -> u32 {
        self.area
    }
}

/// An insertion-ordered name table: preserves loader order (required for
/// reproducible variable/constraint creation) while handing out dense
/// indices for hot-loop use.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: Vec<String>,
    index_of: HashMap<String, usize>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` if absent and returns its dense index either way.
    pub fn intern(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(&idx) = self.index_of.get(&name) {
            return idx;
        }
        let idx = self.names.len();
        self.index_of.insert(name.clone(), idx);
        self.names.push(name);
        idx
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_of.get(name).copied()
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Aggregate flow demand matrix between subject groups, with the in/out
/// sums the sizing preprocessor consumes.
#[derive(Debug, Clone)]
pub struct TotalFlows {
    groups: NameTable,
    total_flow: HashMap<(usize, usize), u64>,
}

impl TotalFlows {
    /// Builds a zero-initialized matrix over the given group names, in the
    /// order given (the order becomes the canonical group iteration order).
    pub fn new(group_names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut groups = NameTable::new();
        for name in group_names {
            groups.intern(name);
        }
        let mut total_flow = HashMap::new();
        for i in 0..groups.len() {
            for j in 0..groups.len() {
                total_flow.insert((i, j), 0);
            }
        }
        Self { groups, total_flow }
    }

    pub fn groups(&self) -> &NameTable {
        &self.groups
    }

    pub fn set_flow(
        &mut self,
        group_a: &str,
        group_b: &str,
        new_flow: u64,
    ) -> ArrangementResult<()> {
        let (a, b) = self.resolve_pair(group_a, group_b)?;
        self.total_flow.insert((a, b), new_flow);
        Ok(())
    }

    pub fn flow(&self, group_a: &str, group_b: &str) -> ArrangementResult<u64> {
        let (a, b) = self.resolve_pair(group_a, group_b)?;
        Ok(self.total_flow[&(a, b)])
    }

    pub fn flow_by_index(&self, i: GroupIndex, j: GroupIndex) -> u64 {
        self.total_flow
            .get(&(i.value(), j.value()))
            .copied()
            .unwrap_or(0)
    }

    /// `in(i) = Σ_k T[k,i]`
    pub fn in_flow(&self, group: GroupIndex) -> u64 {
        (0..self.groups.len())
            .map(|k| self.total_flow[&(k, group.value())])
            .sum()
    }

    /// `out(i) = Σ_k T[i,k]`
    pub fn out_flow(&self, group: GroupIndex) -> u64 {
        (0..self.groups.len())
            .map(|k| self.total_flow[&(group.value(), k)])
            .sum()
    }

    fn resolve_pair(&self, group_a: &str, group_b: &str) -> ArrangementResult<(usize, usize)> {
        let a = self
            .groups
            .index_of(group_a)
            .ok_or_else(|| ArrangementError::Configuration(format!("unknown group {group_a}")))?;
        let b = self
            .groups
            .index_of(group_b)
            .ok_or_else(|| ArrangementError::Configuration(format!("unknown group {group_b}")))?;
        Ok((a, b))
    }
}

/// Describes a regular grid layout, carried alongside a `Point` set
/// generated as a grid (§3, §6.2). `anchor` selects whether C6's first
/// row/column constraints are "used exactly" (`0`) or "used at least"
/// (`1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDescriptor {
    cols: usize,
    rows: usize,
    anchor: u8,
}

impl GridDescriptor {
    pub fn new(cols: usize, rows: usize, anchor: u8) -> ArrangementResult<Self> {
        if anchor > 1 {
            return Err(ArrangementError::Configuration(format!(
                "anchor must be 0 or 1, got {anchor}"
            )));
        }
        if cols == 0 || rows == 0 {
            return Err(ArrangementError::Configuration(
                "grid dimensions must be positive".into(),
            ));
        }
        Ok(Self { cols, rows, anchor })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn anchor(&self) -> u8 {
        self.anchor
    }

    /// Returns the sub-grid descriptor used by the cascade reducer: same
    /// dimensions, anchor forced to 0 ("enforce exactly").
    pub fn as_sub_grid(&self, cols: usize, rows: usize) -> ArrangementResult<Self> {
        GridDescriptor::new(cols, rows, 0)
    }

    pub fn point_name(x: usize, y: usize) -> String {
        format!("({x},{y})")
    }

    /// Inverse of [`GridDescriptor::point_name`]: parses a `"(x,y)"` point
    /// name back into its grid coordinate. Returns `None` for names that
    /// were not generated by this grid (e.g. a hand-authored FASF bundle).
    pub fn parse_point_xy(name: &str) -> Option<(usize, usize)> {
        let inner = name.strip_prefix('(')?.strip_suffix(')')?;
        let (x, y) = inner.split_once(',')?;
        Some((x.parse().ok()?, y.parse().ok()?))
    }

    /// Parses the `gN:HxM:WxA` facility descriptor string (§6.2): `N` rows,
    /// `M` columns, row step `H`, column step `W`, per-point area `A`.
    /// Generated points are named `"(x,y)"` for `0 ≤ x < M`, `0 ≤ y < N`,
    /// with coordinates `(W·x, H·y)`. The grid descriptor returned carries
    /// `anchor = 1` ("enforce at least"), matching the top-level-solve
    /// default; callers building a sub-grid for the cascade reducer should
    /// use [`GridDescriptor::as_sub_grid`] instead.
    pub fn parse(descriptor: &str) -> ArrangementResult<(Vec<Point>, Self)> {
        let bad = || {
            ArrangementError::Configuration(format!(
                "invalid grid descriptor {descriptor:?}, expected gN:HxM:WxA"
            ))
        };
        let mut parts = descriptor.splitn(3, ':');
        let rows_part = parts.next().ok_or_else(bad)?;
        let step_cols_part = parts.next().ok_or_else(bad)?;
        let step_area_part = parts.next().ok_or_else(bad)?;

        let rows_str = rows_part.strip_prefix('g').ok_or_else(bad)?;
        let rows: usize = rows_str.parse().map_err(|_| bad())?;

        let (row_step_str, cols_str) = step_cols_part.split_once('x').ok_or_else(bad)?;
        let row_step: f64 = row_step_str.parse().map_err(|_| bad())?;
        let cols: usize = cols_str.parse().map_err(|_| bad())?;

        let (col_step_str, area_str) = step_area_part.split_once('x').ok_or_else(bad)?;
        let col_step: f64 = col_step_str.parse().map_err(|_| bad())?;
        let area: u32 = area_str.parse().map_err(|_| bad())?;

        if rows == 0 || cols == 0 || row_step <= 0.0 || col_step <= 0.0 || area == 0 {
            return Err(ArrangementError::Configuration(
                "grid descriptor fields must be positive".into(),
            ));
        }

        let mut points = Vec::with_capacity(rows * cols);
        for y in 0..rows {
            for x in 0..cols {
                points.push(Point::new(
                    Self::point_name(x, y),
                    col_step * x as f64,
                    row_step * y as f64,
                    area,
                ));
            }
        }
        let grid = GridDescriptor::new(cols, rows, 1)?;
        Ok((points, grid))
    }
}

/// Per-group derived sizing (C3): sufficient subject count `N_i` and net
/// production `G_i`. See [`crate::sizing::compute_sizing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSizing {
    pub subject_count: u64,
    pub net_production: i64,
}

/// Index into a point list, resolved once the grid/location set is fixed.
pub fn point_index(points: &NameTable, name: &str) -> Option<PointIndex> {
    points.index_of(name).map(PointIndex::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_flows_tracks_in_and_out() {
        let mut flows = TotalFlows::new(["A", "B"]);
        flows.set_flow("A", "B", 5).unwrap();
        assert_eq!(flows.flow("A", "B").unwrap(), 5);
        assert_eq!(flows.in_flow(GroupIndex::new(1)), 5);
        assert_eq!(flows.out_flow(GroupIndex::new(0)), 5);
        assert_eq!(flows.in_flow(GroupIndex::new(0)), 0);
        assert_eq!(flows.out_flow(GroupIndex::new(1)), 0);
    }

    #[test]
    fn unknown_group_is_configuration_error() {
        let flows = TotalFlows::new(["A"]);
        assert!(flows.flow("A", "Z").is_err());
    }

    #[test]
    fn name_table_preserves_insertion_order() {
        let mut t = NameTable::new();
        t.intern("B");
        t.intern("A");
        t.intern("B");
        assert_eq!(t.len(), 2);
        assert_eq!(t.name(0), "B");
        assert_eq!(t.name(1), "A");
    }

    #[test]
    fn parses_s1_grid_descriptor() {
        let (points, grid) = GridDescriptor::parse("g1:1x1:1x2").unwrap();
        assert_eq!(grid.rows(), 1);
        assert_eq!(grid.cols(), 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name(), "(0,0)");
        assert_eq!(points[0].area(), 2);
    }

    #[test]
    fn parses_s2_grid_descriptor() {
        let (points, grid) = GridDescriptor::parse("g1:1x2:1x1").unwrap();
        assert_eq!(grid.rows(), 1);
        assert_eq!(grid.cols(), 2);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name(), "(0,0)");
        assert_eq!(points[1].name(), "(1,0)");
        assert_eq!(points[1].x(), 1.0);
    }

    #[test]
    fn rejects_malformed_grid_descriptor() {
        assert!(GridDescriptor::parse("bogus").is_err());
        assert!(GridDescriptor::parse("g0:1x1:1x1").is_err());
    }

    #[test]
    fn point_xy_round_trips_through_the_name() {
        assert_eq!(GridDescriptor::parse_point_xy("(3,5)"), Some((3, 5)));
        assert_eq!(GridDescriptor::parse_point_xy("loading-dock"), None);
    }
}
