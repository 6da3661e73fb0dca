//! A small orthographic triangle rasterizer with a depth buffer.

use image::{Rgba, RgbaImage};
use nalgebra::{Point3, Vector3};

use crate::orientation::Orientation;

/// Base color of the model before shading.
const MODEL_COLOR: [f64; 3] = [176.0, 184.0, 196.0];

/// Light that reaches faces seen edge-on.
const AMBIENT: f64 = 0.25;

/// An orthographic view onto the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub position: Point3<f64>,
    pub orientation: Orientation,
    /// Extent of the visible area along the shorter image side, in model units.
    pub view_size: f64,
}

pub fn rasterize(
    triangles: &[[Point3<f64>; 3]],
    projection: &Projection,
    width: u32,
    height: u32,
    background: [u8; 4],
) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, Rgba(background));
    let mut depth = vec![f64::INFINITY; width as usize * height as usize];

    let half_size = projection.view_size / 2.0;
    let (half_width, half_height) = if width >= height {
        (half_size * width as f64 / height as f64, half_size)
    } else {
        (half_size, half_size * height as f64 / width as f64)
    };
    let to_camera = projection.orientation.inverse();

    // Camera space to pixel space, keeping depth as the distance along -Z.
    let project = |p: &Point3<f64>| -> Vector3<f64> {
        let local = to_camera * (p - projection.position);
        Vector3::new(
            (local.x / half_width + 1.0) * 0.5 * width as f64,
            (1.0 - local.y / half_height) * 0.5 * height as f64,
            -local.z,
        )
    };

    for triangle in triangles {
        let normal = to_camera * (triangle[1] - triangle[0]).cross(&(triangle[2] - triangle[0]));
        let Some(normal) = normal.try_normalize(f64::EPSILON) else {
            continue;
        };
        let shade = AMBIENT + (1.0 - AMBIENT) * normal.z.abs();
        let color = Rgba([
            (MODEL_COLOR[0] * shade) as u8,
            (MODEL_COLOR[1] * shade) as u8,
            (MODEL_COLOR[2] * shade) as u8,
            255,
        ]);

        let [a, b, c] = triangle.map(|p| project(&p));
        let area = edge(&a, &b, &c);
        if area.abs() < f64::EPSILON {
            continue;
        }

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(width as f64) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(height as f64) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vector3::new(x as f64 + 0.5, y as f64 + 0.5, 0.0);
                let w0 = edge(&b, &c, &p) / area;
                let w1 = edge(&c, &a, &p) / area;
                let w2 = edge(&a, &b, &p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                let slot = &mut depth[y as usize * width as usize + x as usize];
                if z < *slot {
                    *slot = z;
                    image.put_pixel(x, y, color);
                }
            }
        }
    }

    image
}

/// Twice the signed area of the triangle `a`, `b`, `p` in the XY plane.
fn edge(a: &Vector3<f64>, b: &Vector3<f64>, p: &Vector3<f64>) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}
