use super::point::Point;

/// Axis aligned box, stored by its centerpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    // centerpoint
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn left(&self) -> u32 {
        self.x.saturating_sub(self.w / 2)
    }
    pub fn right(&self) -> u32 {
        self.left() + self.w
    }
    pub fn top(&self) -> u32 {
        self.y.saturating_sub(self.h / 2)
    }
    pub fn bottom(&self) -> u32 {
        self.top() + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn from_tl(x: u32, y: u32, w: u32, h: u32) -> Rect {
        Rect {
            x: x + w / 2,
            y: y + h / 2,
            w,
            h,
        }
    }

    /// Smallest box holding every point; negative coordinates clamp to the image edge.
    pub fn bounding(points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let clamp = |v: i32| v.max(0) as u32;
        Some(Rect::from_tl(
            clamp(min_x),
            clamp(min_y),
            clamp(max_x) - clamp(min_x),
            clamp(max_y) - clamp(min_y),
        ))
    }

    /// Intersection over union, as a percentage.
    pub fn overlap_pct(&self, other: &Rect) -> f32 {
        let w = self.right().min(other.right()).saturating_sub(self.left().max(other.left()));
        let h = self.bottom().min(other.bottom()).saturating_sub(self.top().max(other.top()));
        let overlap = w as u64 * h as u64;

        match self.area() + other.area() - overlap {
            0 => 0.,
            union => overlap as f32 / union as f32 * 100.,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding() {
        let r = Rect::bounding(&[Point::new(10, 20), Point::new(30, 60), Point::new(20, 40)])
            .unwrap();
        assert_eq!(r.left(), 10);
        assert_eq!(r.top(), 20);
        assert_eq!(r.right(), 30);
        assert_eq!(r.bottom(), 60);

        assert!(Rect::bounding(&[]).is_none());
    }

    #[test]
    fn test_bounding_clamps_negative() {
        let r = Rect::bounding(&[Point::new(-5, -5), Point::new(10, 10)]).unwrap();
        assert_eq!(r.left(), 0);
        assert_eq!(r.top(), 0);
        assert_eq!(r.w, 10);
    }

    #[test]
    fn test_bounding_odd_extent_is_exact() {
        let r = Rect::bounding(&[Point::new(3, 4), Point::new(10, 13)]).unwrap();
        assert_eq!((r.left(), r.right()), (3, 10));
        assert_eq!((r.top(), r.bottom()), (4, 13));
        assert_eq!((r.w, r.h), (7, 9));
    }

    #[test]
    fn test_overlap_of_huge_boxes() {
        let a = Rect::from_tl(0, 0, 100_500, 100_500);
        assert_eq!(a.area(), 100_500u64 * 100_500);
        assert_eq!(a.overlap_pct(&a), 100.);

        let b = Rect::from_tl(50_250, 0, 100_500, 100_500);
        let pct = a.overlap_pct(&b);
        assert!((pct - 100. / 3.).abs() < 0.01, "{pct}");
    }

    #[test]
    fn test_overlap_pct() {
        let a = Rect::from_tl(0, 0, 10, 10);
        assert_eq!(a.overlap_pct(&a), 100.);

        let b = Rect::from_tl(20, 20, 10, 10);
        assert_eq!(a.overlap_pct(&b), 0.);

        let c = Rect::from_tl(5, 0, 10, 10);
        let pct = a.overlap_pct(&c);
        assert!(pct > 30. && pct < 40.);
    }
}
