/// A 2D point in frame pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Orders two points as (left, right) by x-coordinate. `p0` wins ties.
pub fn disambiguate_left_right(p0: Point, p1: Point) -> (Point, Point) {
    if p0.x <= p1.x {
        (p0, p1)
    } else {
        (p1, p0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let m = midpoint(Point::new(480.0, 390.0), Point::new(520.0, 410.0));
        assert_eq!(m, Point::new(500.0, 400.0));
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(Point::new(1.0, 1.0), Point::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_distance_matches_hit_scenario() {
        let d = distance(Point::new(415.0, 398.0), Point::new(420.0, 400.0));
        assert!((d - 29f64.sqrt()).abs() < 1e-12);
        assert!(d <= 35.0);
    }

    #[test]
    fn test_disambiguate_orders_by_x() {
        let a = Point::new(300.0, 10.0);
        let b = Point::new(100.0, 20.0);
        assert_eq!(disambiguate_left_right(a, b), (b, a));
        assert_eq!(disambiguate_left_right(b, a), (b, a));
    }

    #[test]
    fn test_disambiguate_tie_keeps_first_as_left() {
        let a = Point::new(200.0, 10.0);
        let b = Point::new(200.0, 90.0);
        assert_eq!(disambiguate_left_right(a, b), (a, b));
        assert_eq!(disambiguate_left_right(b, a), (b, a));
    }

    #[test]
    fn test_point_tuple_conversions() {
        let p: Point = (1.5, 2.5).into();
        assert_eq!(p, Point::new(1.5, 2.5));
        let t: (f64, f64) = p.into();
        assert_eq!(t, (1.5, 2.5));
    }
}
