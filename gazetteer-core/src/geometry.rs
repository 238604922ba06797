//! Geometry primitives shared by the hierarchy builder and the lookup
//! service.
//!
//! Points are WGS84 degrees. Conversions into `geo` types use
//! `x = longitude` and `y = latitude`.

use geo::{Contains, Coord, LineString};

/// A latitude/longitude pair in degrees.
///
/// # Examples
/// ```
/// use gazetteer_core::Point;
///
/// let point = Point::new(42.87, 74.59);
/// assert_eq!(point.lat, 42.87);
/// assert_eq!(point.to_coord().x, 74.59);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Point {
    /// Construct a point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Convert into a `geo` coordinate (`x = lon`, `y = lat`).
    #[must_use]
    pub const fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }

    /// Build a point from a `geo` coordinate (`x = lon`, `y = lat`).
    #[must_use]
    pub const fn from_coord(coord: Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lon: coord.x,
        }
    }
}

/// An ordered ring of points, implicitly closed from the last point back to
/// the first.
///
/// The ring is kept exactly as assembled: no reordering, closing or
/// de-duplication happens on construction. Rings with fewer than three points
/// are legal but never contain anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<Point>,
    shape: Option<geo::Polygon<f64>>,
}

impl Polygon {
    /// Build a polygon from its ring.
    ///
    /// # Examples
    /// ```
    /// use gazetteer_core::{Point, Polygon};
    ///
    /// let square = Polygon::new(vec![
    ///     Point::new(0.0, 0.0),
    ///     Point::new(0.0, 2.0),
    ///     Point::new(2.0, 2.0),
    ///     Point::new(2.0, 0.0),
    /// ]);
    /// assert!(square.contains(&Point::new(1.0, 1.0)));
    /// assert!(!square.contains(&Point::new(3.0, 1.0)));
    /// ```
    #[must_use]
    pub fn new(ring: Vec<Point>) -> Self {
        let shape = (ring.len() >= 3).then(|| {
            let exterior: LineString<f64> = ring.iter().map(|point| point.to_coord()).collect();
            geo::Polygon::new(exterior, Vec::new())
        });
        Self { ring, shape }
    }

    /// The ring's points in assembly order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.ring
    }

    /// Number of points in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the ring has no points at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// The second point of the ring, used as a cheap stand-in for the whole
    /// boundary when nesting areas.
    #[must_use]
    pub fn representative_point(&self) -> Option<Point> {
        self.ring.get(1).copied()
    }

    /// Point-in-polygon test over the ring's edges.
    ///
    /// Points on the boundary are not contained. Rings with fewer than three
    /// points always return `false`.
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        self.shape
            .as_ref()
            .is_some_and(|shape| shape.contains(&geo::Point::from(point.to_coord())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn square() -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ])
    }

    #[rstest]
    #[case(Point::new(5.0, 5.0))]
    #[case(Point::new(0.5, 9.5))]
    #[case(Point::new(9.9, 0.1))]
    fn convex_ring_contains_interior_points(square: Polygon, #[case] point: Point) {
        assert!(square.contains(&point), "{point:?} should be inside");
    }

    #[rstest]
    #[case(Point::new(-1.0, 5.0))]
    #[case(Point::new(5.0, 10.5))]
    #[case(Point::new(11.0, 11.0))]
    #[case(Point::new(-0.1, -0.1))]
    fn convex_ring_excludes_exterior_points(square: Polygon, #[case] point: Point) {
        assert!(!square.contains(&point), "{point:?} should be outside");
    }

    #[rstest]
    fn triangle_uses_ring_edges() {
        let triangle = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(4.0, 0.0),
        ]);
        assert!(triangle.contains(&Point::new(1.0, 1.0)));
        assert!(!triangle.contains(&Point::new(3.0, 3.0)));
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![Point::new(1.0, 1.0)])]
    #[case(vec![Point::new(0.0, 0.0), Point::new(2.0, 2.0)])]
    fn degenerate_rings_contain_nothing(#[case] ring: Vec<Point>) {
        let polygon = Polygon::new(ring);
        for probe in [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(-5.0, 7.0),
        ] {
            assert!(!polygon.contains(&probe));
        }
    }

    #[rstest]
    fn ring_order_is_preserved_without_closing() {
        let ring = vec![
            Point::new(3.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 5.0),
        ];
        let polygon = Polygon::new(ring.clone());
        assert_eq!(polygon.points(), ring.as_slice());
        assert_eq!(polygon.len(), 3);
    }

    #[rstest]
    fn representative_point_is_second_ring_point(square: Polygon) {
        assert_eq!(square.representative_point(), Some(Point::new(0.0, 10.0)));
        assert_eq!(
            Polygon::new(vec![Point::new(1.0, 1.0)]).representative_point(),
            None
        );
    }

    #[rstest]
    fn coord_conversion_swaps_axes() {
        let point = Point::new(42.0, 74.0);
        let coord = point.to_coord();
        assert_eq!((coord.x, coord.y), (74.0, 42.0));
        assert_eq!(Point::from_coord(coord), point);
    }
}
