//! Strategies deciding whether one administrative area nests inside another.
//!
//! Boundary rings run to thousands of points, so nesting is decided from a
//! single representative point of the inner ring rather than a full
//! ring-versus-ring test. This is a known approximation: concave or oddly
//! ordered boundaries can be attached to the wrong parent, or to none.

use crate::Polygon;

/// Decides whether `inner` should be nested under `outer`.
pub trait ContainmentStrategy {
    /// Return `true` when `inner` belongs inside `outer`.
    fn nests_within(&self, outer: &Polygon, inner: &Polygon) -> bool;
}

/// Nest an area when the second point of its ring lies inside the parent.
///
/// Rings with fewer than two points never nest.
///
/// # Examples
/// ```
/// use gazetteer_core::{ContainmentStrategy, Point, Polygon, RepresentativePoint};
///
/// let outer = Polygon::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(0.0, 10.0),
///     Point::new(10.0, 10.0),
///     Point::new(10.0, 0.0),
/// ]);
/// // Only the second point is inside, which is enough.
/// let inner = Polygon::new(vec![
///     Point::new(20.0, 20.0),
///     Point::new(5.0, 5.0),
///     Point::new(20.0, 30.0),
/// ]);
/// assert!(RepresentativePoint.nests_within(&outer, &inner));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RepresentativePoint;

impl ContainmentStrategy for RepresentativePoint {
    fn nests_within(&self, outer: &Polygon, inner: &Polygon) -> bool {
        inner
            .representative_point()
            .is_some_and(|point| outer.contains(&point))
    }
}
