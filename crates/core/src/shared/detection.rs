/// Axis-aligned rectangle in pixel coordinates.
///
/// `x`/`y` is the top-left corner; the rectangle covers `x..x + width`
/// horizontally and `y..y + height` vertically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point using integer halving of the size.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn longest_side(&self) -> i32 {
        self.width.max(self.height)
    }

    /// Pulls the origin inside the frame, then trims the size so the far
    /// edges do not pass the frame bounds. The result may be empty or
    /// negative-sized when the box lies entirely outside.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let fw = frame_width as i32;
        let fh = frame_height as i32;
        let x = self.x.max(0);
        let y = self.y.max(0);
        BoundingBox {
            x,
            y,
            width: self.width.min(fw - x),
            height: self.height.min(fh - y),
        }
    }

    /// Whether `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

/// One changed region found between two consecutive frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub area: f64,
    pub center: (i32, i32),
}

impl Detection {
    pub fn new(bounding_box: BoundingBox, area: f64) -> Self {
        Self {
            bounding_box,
            area,
            center: bounding_box.center(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BoundingBox::new(10, 20, 30, 40), (25, 40))]
    #[case(BoundingBox::new(0, 0, 5, 7), (2, 3))]
    #[case(BoundingBox::new(3, 3, 1, 1), (3, 3))]
    fn test_center_uses_integer_halving(#[case] bbox: BoundingBox, #[case] expected: (i32, i32)) {
        assert_eq!(bbox.center(), expected);
        assert_eq!(Detection::new(bbox, 1.0).center, expected);
    }

    #[test]
    fn test_clamp_inside_frame_is_identity() {
        let bbox = BoundingBox::new(10, 10, 20, 20);
        assert_eq!(bbox.clamp_to(100, 100), bbox);
    }

    #[test]
    fn test_clamp_trims_far_edges() {
        let clamped = BoundingBox::new(90, 90, 20, 20).clamp_to(100, 100);
        assert_eq!(clamped, BoundingBox::new(90, 90, 10, 10));
    }

    #[test]
    fn test_clamp_moves_negative_origin() {
        let clamped = BoundingBox::new(-5, -3, 20, 20).clamp_to(100, 100);
        assert_eq!(clamped, BoundingBox::new(0, 0, 20, 20));
    }

    #[test]
    fn test_clamp_outside_frame_is_empty() {
        let clamped = BoundingBox::new(150, 10, 20, 20).clamp_to(100, 100);
        assert!(clamped.width <= 0);
    }

    #[rstest]
    #[case(BoundingBox::new(10, 10, 50, 50), true)]
    #[case(BoundingBox::new(20, 20, 10, 10), true)]
    #[case(BoundingBox::new(59, 59, 1, 1), true)]
    #[case(BoundingBox::new(5, 20, 10, 10), false)]
    #[case(BoundingBox::new(50, 50, 11, 5), false)]
    #[case(BoundingBox::new(60, 10, 1, 1), false)]
    fn test_contains(#[case] inner: BoundingBox, #[case] expected: bool) {
        let outer = BoundingBox::new(10, 10, 50, 50);
        assert_eq!(outer.contains(&inner), expected);
    }

    #[test]
    fn test_longest_side() {
        assert_eq!(BoundingBox::new(0, 0, 12, 40).longest_side(), 40);
    }
}
