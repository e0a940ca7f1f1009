//! Pairwise distance between locations under a chosen Minkowski metric (C2).

use crate::error::{ArrangementError, ArrangementResult};
use crate::model::Point;
use std::fmt;
use std::str::FromStr;

/// A selectable Minkowski distance metric: `m1..m50` (L1 through L50), or
/// `moo` (Chebyshev / L∞). See §6.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Minkowski(u8),
    Chebyshev,
}

impl DistanceMetric {
    pub const MIN_ORDER: u8 = 1;
    pub const MAX_ORDER: u8 = 50;

    pub fn minkowski(order: u8) -> ArrangementResult<Self> {
        if !(Self::MIN_ORDER..=Self::MAX_ORDER).contains(&order) {
            return Err(ArrangementError::Configuration(format!(
                "minkowski order must be between {} and {}, got {order}",
                Self::MIN_ORDER,
                Self::MAX_ORDER
            )));
        }
        Ok(DistanceMetric::Minkowski(order))
    }

    /// Evaluates `d(u,v)` for two points under this metric.
    pub fn distance(&self, a: &Point, b: &Point) -> f64 {
        let dx = (a.x() - b.x()).abs();
        let dy = (a.y() - b.y()).abs();
        match self {
            DistanceMetric::Minkowski(1) => dx + dy,
            DistanceMetric::Minkowski(k) => {
                let k = *k as f64;
                (dx.powf(k) + dy.powf(k)).powf(1.0 / k)
            }
            DistanceMetric::Chebyshev => dx.max(dy),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Minkowski(k) => write!(f, "m{k}"),
            DistanceMetric::Chebyshev => write!(f, "moo"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = ArrangementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "moo" {
            return Ok(DistanceMetric::Chebyshev);
        }
        let order_str = s.strip_prefix('m').ok_or_else(|| {
            ArrangementError::Configuration(format!(
                "invalid distance metric {s:?}, expected m1..m50 or moo"
            ))
        })?;
        let order: u8 = order_str.parse().map_err(|_| {
            ArrangementError::Configuration(format!("invalid distance metric order in {s:?}"))
        })?;
        DistanceMetric::minkowski(order)
    }
}

/// Dense distance table over a fixed point list, indexed by position.
///
/// Not required to be symmetric or satisfy the triangle inequality by the
/// data model, but every metric implemented here happens to be a genuine
/// metric; the table itself makes no such assumption and simply caches
/// `d(u,v)` for every ordered pair.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    metric: DistanceMetric,
    values: Vec<f64>,
    n: usize,
}

impl DistanceTable {
    pub fn build(points: &[Point], metric: DistanceMetric) -> Self {
        let n = points.len();
        let mut values = vec![0.0; n * n];
        for (ui, u) in points.iter().enumerate() {
            for (vi, v) in points.iter().enumerate() {
                values[ui * n + vi] = metric.distance(u, v);
            }
        }
        Self { metric, values, n }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn get(&self, u: usize, v: usize) -> f64 {
        self.values[u * self.n + v]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_distance() {
        let p = Point::new("(0,0)", 0.0, 0.0, 1);
        for metric in [
            DistanceMetric::minkowski(1).unwrap(),
            DistanceMetric::minkowski(2).unwrap(),
            DistanceMetric::Chebyshev,
        ] {
            assert_eq!(metric.distance(&p, &p), 0.0);
        }
    }

    #[test]
    fn m2_of_3_4_is_5() {
        let a = Point::new("(0,0)", 0.0, 0.0, 1);
        let b = Point::new("(3,4)", 3.0, 4.0, 1);
        let m2 = DistanceMetric::minkowski(2).unwrap();
        assert!((m2.distance(&a, &b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn unit_axis_points_agree_across_metrics() {
        let a = Point::new("(0,0)", 0.0, 0.0, 1);
        let b = Point::new("(1,0)", 1.0, 0.0, 1);
        for order in 1..=50u8 {
            let m = DistanceMetric::minkowski(order).unwrap();
            assert!((m.distance(&a, &b) - 1.0).abs() < 1e-9);
        }
        assert_eq!(DistanceMetric::Chebyshev.distance(&a, &b), 1.0);
    }

    #[test]
    fn parses_metric_strings() {
        assert_eq!(
            "m1".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Minkowski(1)
        );
        assert_eq!(
            "m50".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Minkowski(50)
        );
        assert_eq!(
            "moo".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Chebyshev
        );
        assert!("m51".parse::<DistanceMetric>().is_err());
        assert!("bogus".parse::<DistanceMetric>().is_err());
    }

    #[test]
    fn distance_table_matches_pointwise_evaluation() {
        let points = vec![
            Point::new("(0,0)", 0.0, 0.0, 1),
            Point::new("(1,0)", 1.0, 0.0, 1),
        ];
        let metric = DistanceMetric::minkowski(1).unwrap();
        let table = DistanceTable::build(&points, metric);
        assert_eq!(table.get(0, 1), metric.distance(&points[0], &points[1]));
        assert_eq!(table.get(0, 0), 0.0);
    }
}
