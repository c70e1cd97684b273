use super::point::Point;
use imageproc::drawing::{Canvas, draw_line_segment_mut, draw_polygon_mut};
use imageproc::geometry::convex_hull;

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Convex hull of the vertices, counter-clockwise, without repeated points.
    pub fn convex_hull(&self) -> Polygon {
        let mut unique = self.points.clone();
        unique.sort();
        unique.dedup();
        if unique.len() < 3 {
            return Polygon::new(unique);
        }

        let vertices: Vec<imageproc::point::Point<i32>> =
            unique.into_iter().map(Into::into).collect();
        let hull = convex_hull(&vertices[..]);

        let mut points: Vec<Point> = hull.into_iter().map(Into::into).collect();
        points.dedup();
        // imageproc rejects closed paths
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        Polygon::new(points)
    }

    /// Paints the polygon and its interior. Degenerate polygons (a point or a
    /// segment) are painted as a line.
    pub fn fill<C>(&self, canvas: &mut C, color: C::Pixel)
    where
        C: Canvas,
    {
        match self.points.len() {
            0 => {}
            1 | 2 => {
                let start = self.points[0];
                let end = self.points[self.points.len() - 1];
                draw_line_segment_mut(
                    canvas,
                    (start.x as f32, start.y as f32),
                    (end.x as f32, end.y as f32),
                    color,
                );
            }
            _ => {
                let poly: Vec<imageproc::point::Point<i32>> =
                    self.points.iter().map(|p| (*p).into()).collect();
                draw_polygon_mut(canvas, &poly, color);
            }
        }
    }
}
