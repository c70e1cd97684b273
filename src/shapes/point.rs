#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Point {
        Point { x, y }
    }

    /// Nearest pixel to a sub-pixel landmark coordinate.
    pub fn from_f64(x: f64, y: f64) -> Point {
        Point {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }
}

impl From<Point> for imageproc::point::Point<i32> {
    fn from(p: Point) -> imageproc::point::Point<i32> {
        imageproc::point::Point::new(p.x, p.y)
    }
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Point {
        Point::new(p.x, p.y)
    }
}

#[test]
fn test_from_f64_rounds() {
    assert_eq!(Point::from_f64(1.4, 2.6), Point::new(1, 3));
    assert_eq!(Point::from_f64(-0.6, 0.49), Point::new(-1, 0));
}
