use std::collections::VecDeque;

use ndarray::Array2;

use crate::shared::detection::BoundingBox;

/// Neighbour offsets `(dx, dy)` in clockwise order on screen (y grows down),
/// starting East.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const WEST: usize = 4;

/// Outer boundary of one connected foreground region, as a closed polygon
/// through boundary pixel centers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    points: Vec<(i32, i32)>,
}

impl Contour {
    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    /// Polygon area (shoelace). A filled `w x h` block encloses `(w-1)*(h-1)`.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.points[i];
                let (x1, y1) = self.points[(i + 1) % n];
                x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }

    /// Smallest upright rectangle containing every boundary pixel.
    pub fn bounding_rect(&self) -> BoundingBox {
        let Some(&(first_x, first_y)) = self.points.first() else {
            return BoundingBox::new(0, 0, 0, 0);
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first_x, first_y, first_x, first_y);
        for &(x, y) in &self.points[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }
}

/// Finds the outer contours of all 8-connected foreground (non-zero) regions.
///
/// Holes are ignored and regions nested inside a hole belong to the
/// enclosing contour. Contours are returned in raster order of their
/// top-left-most pixel, with collinear runs collapsed to their end points.
pub fn find_external_contours(mask: &Array2<u8>) -> Vec<Contour> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return Vec::new();
    }

    let filled = fill_holes(mask);
    let mut visited = Array2::<bool>::from_elem((h, w), false);
    let mut contours = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if !filled[[y, x]] || visited[[y, x]] {
                continue;
            }
            let boundary = trace_outer_border(&filled, (x as i32, y as i32));
            contours.push(Contour {
                points: compress_collinear(boundary),
            });
            mark_component(&filled, &mut visited, (x, y));
        }
    }

    contours
}

/// Foreground plus every background pixel not reachable from outside the
/// image through 4-connected background.
fn fill_holes(mask: &Array2<u8>) -> Array2<bool> {
    let (h, w) = mask.dim();
    // Padded by one pixel so the outside is a single connected region.
    let (ph, pw) = (h + 2, w + 2);
    let is_background = |py: usize, px: usize| {
        py == 0 || px == 0 || py == ph - 1 || px == pw - 1 || mask[[py - 1, px - 1]] == 0
    };

    let mut outside = Array2::<bool>::from_elem((ph, pw), false);
    let mut queue = VecDeque::from([(0usize, 0usize)]);
    outside[[0, 0]] = true;
    while let Some((py, px)) = queue.pop_front() {
        let neighbours = [
            (py.wrapping_sub(1), px),
            (py + 1, px),
            (py, px.wrapping_sub(1)),
            (py, px + 1),
        ];
        for (ny, nx) in neighbours {
            if ny >= ph || nx >= pw || outside[[ny, nx]] || !is_background(ny, nx) {
                continue;
            }
            outside[[ny, nx]] = true;
            queue.push_back((ny, nx));
        }
    }

    Array2::from_shape_fn((h, w), |(y, x)| !outside[[y + 1, x + 1]])
}

fn is_set(img: &Array2<bool>, x: i32, y: i32) -> bool {
    let (h, w) = img.dim();
    x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h && img[[y as usize, x as usize]]
}

fn direction_between(from: (i32, i32), to: (i32, i32)) -> usize {
    let delta = (to.0 - from.0, to.1 - from.1);
    DIRECTIONS
        .iter()
        .position(|&d| d == delta)
        .unwrap_or(WEST)
}

/// Border following (Suzuki & Abe, outer border case) from `start`, the
/// top-left-most pixel of its region, whose West neighbour is background.
fn trace_outer_border(img: &Array2<bool>, start: (i32, i32)) -> Vec<(i32, i32)> {
    let step = |p: (i32, i32), dir: usize| (p.0 + DIRECTIONS[dir].0, p.1 + DIRECTIONS[dir].1);

    // Clockwise search around the start, beginning just after West.
    let first = (1..=8)
        .map(|k| (WEST + k) % 8)
        .map(|dir| step(start, dir))
        .find(|&(x, y)| is_set(img, x, y));
    let Some(first) = first else {
        return vec![start];
    };

    let mut points = Vec::new();
    let mut previous = first;
    let mut current = start;
    loop {
        points.push(current);

        // Counter-clockwise search around `current`, starting after `previous`.
        let back = direction_between(current, previous);
        let next = (1..=8)
            .map(|k| (back + 8 - k) % 8)
            .map(|dir| step(current, dir))
            .find(|&(x, y)| is_set(img, x, y))
            .unwrap_or(previous);

        if next == start && current == first {
            break;
        }
        previous = current;
        current = next;
    }

    points
}

/// Keeps only points where the boundary changes direction.
fn compress_collinear(points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    let compressed: Vec<(i32, i32)> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            direction_between(prev, cur) != direction_between(cur, next)
        })
        .map(|i| points[i])
        .collect();
    if compressed.is_empty() {
        points
    } else {
        compressed
    }
}

fn mark_component(img: &Array2<bool>, visited: &mut Array2<bool>, seed: (usize, usize)) {
    let mut queue = VecDeque::from([seed]);
    visited[[seed.1, seed.0]] = true;
    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in DIRECTIONS {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if !is_set(img, nx, ny) || visited[[ny as usize, nx as usize]] {
                continue;
            }
            visited[[ny as usize, nx as usize]] = true;
            queue.push_back((nx as usize, ny as usize));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(h: usize, w: usize, rects: &[(usize, usize, usize, usize)]) -> Array2<u8> {
        let mut mask = Array2::<u8>::zeros((h, w));
        for &(x, y, rw, rh) in rects {
            for row in y..y + rh {
                for col in x..x + rw {
                    mask[[row, col]] = 255;
                }
            }
        }
        mask
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        assert!(find_external_contours(&Array2::<u8>::zeros((20, 20))).is_empty());
        assert!(find_external_contours(&Array2::<u8>::zeros((0, 0))).is_empty());
    }

    #[test]
    fn test_filled_rectangle_compresses_to_corners() {
        let mask = mask_with(50, 50, &[(10, 5, 20, 10)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);

        let contour = &contours[0];
        let mut corners = contour.points().to_vec();
        corners.sort();
        assert_eq!(corners, vec![(10, 5), (10, 14), (29, 5), (29, 14)]);
        assert_eq!(contour.bounding_rect(), BoundingBox::new(10, 5, 20, 10));
        assert_eq!(contour.area(), (19 * 9) as f64);
    }

    #[test]
    fn test_rectangle_touching_image_border() {
        let mask = mask_with(10, 10, &[(0, 0, 10, 4)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), BoundingBox::new(0, 0, 10, 4));
        assert_eq!(contours[0].area(), 27.0);
    }

    #[test]
    fn test_separate_regions_in_raster_order() {
        let mask = mask_with(60, 60, &[(40, 40, 10, 10), (5, 5, 8, 8)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].bounding_rect(), BoundingBox::new(5, 5, 8, 8));
        assert_eq!(contours[1].bounding_rect(), BoundingBox::new(40, 40, 10, 10));
    }

    #[test]
    fn test_diagonal_touch_is_one_region() {
        let mask = mask_with(20, 20, &[(2, 2, 3, 3), (5, 5, 3, 3)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), BoundingBox::new(2, 2, 6, 6));
    }

    #[test]
    fn test_ring_with_nested_blob_yields_only_outer_contour() {
        let mut mask = mask_with(40, 40, &[(5, 5, 30, 30)]);
        for row in 8..32 {
            for col in 8..32 {
                mask[[row, col]] = 0;
            }
        }
        // island inside the hole
        for row in 15..20 {
            for col in 15..20 {
                mask[[row, col]] = 255;
            }
        }

        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), BoundingBox::new(5, 5, 30, 30));
        assert_eq!(contours[0].area(), (29 * 29) as f64);
    }

    #[test]
    fn test_single_pixel_has_zero_area() {
        let mask = mask_with(5, 5, &[(2, 2, 1, 1)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points(), &[(2, 2)]);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(contours[0].bounding_rect(), BoundingBox::new(2, 2, 1, 1));
    }

    #[test]
    fn test_thin_line_has_zero_area_but_full_extent() {
        let mask = mask_with(10, 20, &[(3, 4, 10, 1)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(contours[0].bounding_rect(), BoundingBox::new(3, 4, 10, 1));
    }

    #[test]
    fn test_l_shape_cuts_inner_corner() {
        // 10x10 block with the top-right 5x5 quadrant removed
        let mask = mask_with(20, 20, &[(0, 0, 5, 10), (5, 5, 5, 5)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        // (0,0) (0,9) (9,9) (9,5) (5,5) (4,4) (4,0)
        assert_eq!(contours[0].points().len(), 7);
        assert!(contours[0].points().contains(&(4, 4)));
        assert_eq!(contours[0].area(), 56.5);
        assert_eq!(contours[0].bounding_rect(), BoundingBox::new(0, 0, 10, 10));
    }
}
