//! Mapping between client (screen) coordinates and surface backing pixels.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Placement of a surface on screen together with its backing resolution.
///
/// The backing buffer and the displayed element may have different sizes, so
/// client coordinates are offset by the element's top-left corner and then
/// scaled independently per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Top-left corner of the displayed element in client coordinates.
    pub origin: Point,
    /// Size the element is displayed at.
    pub display_size: Size,
    /// Size of the backing pixel buffer.
    pub backing_size: Size,
}

impl Viewport {
    /// Create a viewport from the element's client rectangle and backing size.
    pub fn new(display: Rect, backing_size: Size) -> Self {
        Self {
            origin: display.origin(),
            display_size: display.size(),
            backing_size,
        }
    }

    /// Backing pixels per displayed pixel on each axis.
    pub fn scale(&self) -> Vec2 {
        Vec2::new(
            axis_scale(self.backing_size.width, self.display_size.width),
            axis_scale(self.backing_size.height, self.display_size.height),
        )
    }

    /// Affine transform taking client coordinates to backing pixels.
    pub fn transform(&self) -> Affine {
        let scale = self.scale();
        Affine::scale_non_uniform(scale.x, scale.y) * Affine::translate(-self.origin.to_vec2())
    }

    /// Convert a client point to element-local coordinates (no scaling).
    pub fn client_to_local(&self, client: Point) -> Point {
        client - self.origin.to_vec2()
    }

    /// Convert a client point to backing pixel coordinates.
    pub fn client_to_backing(&self, client: Point) -> Point {
        let scale = self.scale();
        let local = self.client_to_local(client);
        Point::new(local.x * scale.x, local.y * scale.y)
    }

    /// Convert a backing pixel coordinate back to client space.
    pub fn backing_to_client(&self, backing: Point) -> Point {
        let scale = self.scale();
        Point::new(
            backing.x / scale.x + self.origin.x,
            backing.y / scale.y + self.origin.y,
        )
    }

    /// The whole backing buffer as a rectangle.
    pub fn backing_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.backing_size)
    }
}

/// A collapsed display or backing axis maps 1:1, keeping the mapping invertible.
fn axis_scale(backing: f64, display: f64) -> f64 {
    if display > 0.0 && backing > 0.0 {
        backing / display
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(left: f64, top: f64, dw: f64, dh: f64, bw: f64, bh: f64) -> Viewport {
        Viewport::new(
            Rect::from_origin_size(Point::new(left, top), Size::new(dw, dh)),
            Size::new(bw, bh),
        )
    }

    #[test]
    fn test_identity_when_sizes_match() {
        let vp = viewport(0.0, 0.0, 300.0, 200.0, 300.0, 200.0);
        let p = vp.client_to_backing(Point::new(120.0, 45.0));
        assert!((p.x - 120.0).abs() < f64::EPSILON);
        assert!((p.y - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_client_to_backing_formula() {
        let (left, top, dw, dh, bw, bh) = (15.0, 40.0, 400.0, 250.0, 800.0, 1000.0);
        let vp = viewport(left, top, dw, dh, bw, bh);
        let (cx, cy) = (215.0, 90.0);
        let p = vp.client_to_backing(Point::new(cx, cy));
        assert!((p.x - (cx - left) * bw / dw).abs() < 1e-10);
        assert!((p.y - (cy - top) * bh / dh).abs() < 1e-10);
    }

    #[test]
    fn test_client_to_local_ignores_scale() {
        let vp = viewport(10.0, 20.0, 100.0, 100.0, 200.0, 200.0);
        let p = vp.client_to_local(Point::new(60.0, 70.0));
        assert!((p.x - 50.0).abs() < f64::EPSILON);
        assert!((p.y - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let vp = viewport(33.0, -12.0, 320.0, 240.0, 640.0, 360.0);
        let original = Point::new(123.0, 456.0);
        let back = vp.backing_to_client(vp.client_to_backing(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_transform_matches_direct_mapping() {
        let vp = viewport(8.0, 16.0, 200.0, 100.0, 300.0, 400.0);
        let client = Point::new(58.0, 41.0);
        let direct = vp.client_to_backing(client);
        let affine = vp.transform() * client;
        assert!((direct.x - affine.x).abs() < 1e-9);
        assert!((direct.y - affine.y).abs() < 1e-9);
    }

    #[test]
    fn test_zero_display_size_maps_unscaled() {
        let vp = viewport(0.0, 0.0, 0.0, 0.0, 100.0, 100.0);
        let p = vp.client_to_backing(Point::new(5.0, 6.0));
        assert!((p.x - 5.0).abs() < f64::EPSILON);
        assert!((p.y - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_backing_size_stays_finite() {
        let vp = viewport(10.0, 20.0, 300.0, 150.0, 0.0, 0.0);
        let client = vp.backing_to_client(Point::new(4.0, 8.0));
        assert!(client.x.is_finite() && client.y.is_finite());
        assert!((client.x - 14.0).abs() < f64::EPSILON);
        assert!((client.y - 28.0).abs() < f64::EPSILON);

        let back = vp.client_to_backing(client);
        assert!((back.x - 4.0).abs() < f64::EPSILON);
        assert!((back.y - 8.0).abs() < f64::EPSILON);
    }
}
