//! Camera orientation math.
//!
//! Cameras look down their local -Z axis with +Y up. Every orientation here is
//! absolute: it replaces whatever rotation the camera had, it never composes
//! with it.

use std::f64::consts::{PI, TAU};

use nalgebra::{Unit, UnitQuaternion, Vector3};
use rand::Rng;

use crate::error::GeometryError;

/// A direction in model space. Normalized before it is used as a rotation target.
pub type Direction = Vector3<f64>;

/// An absolute camera rotation.
pub type Orientation = UnitQuaternion<f64>;

/// Shorter vectors than this are treated as zero length.
const MIN_NORM: f64 = 1e-12;

/// How close |cos| may get to 1 before two directions count as (anti-)parallel.
const PARALLEL_TOLERANCE: f64 = 1e-12;

/// The direction an unrotated camera looks along.
pub fn camera_forward() -> Direction {
    -Vector3::z()
}

fn unit_direction(v: &Direction) -> Result<Unit<Direction>, GeometryError> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(GeometryError::NonFinite(v.x, v.y, v.z));
    }
    Unit::try_new(*v, MIN_NORM).ok_or(GeometryError::ZeroLength(v.x, v.y, v.z))
}

/// The shortest-arc rotation taking `from` onto `to`.
///
/// Parallel inputs give the identity. Anti-parallel inputs give a half turn
/// about some axis orthogonal to `from`; which one is unspecified.
pub fn rotation_aligning(from: &Direction, to: &Direction) -> Result<Orientation, GeometryError> {
    let from = unit_direction(from)?;
    let to = unit_direction(to)?;
    let cos = from.dot(&to.into_inner()).clamp(-1.0, 1.0);

    if cos >= 1.0 - PARALLEL_TOLERANCE {
        return Ok(Orientation::identity());
    }
    if cos <= -1.0 + PARALLEL_TOLERANCE {
        return Ok(Orientation::from_axis_angle(&any_orthogonal(&from), PI));
    }

    let axis = Unit::new_normalize(from.cross(&to.into_inner()));
    Ok(Orientation::from_axis_angle(&axis, cos.acos()))
}

/// Crosses `v` with the basis axis it is least aligned with.
fn any_orthogonal(v: &Unit<Direction>) -> Unit<Direction> {
    let (x, y, z) = (v.x.abs(), v.y.abs(), v.z.abs());
    let basis = if x <= y && x <= z {
        Vector3::x()
    } else if y <= z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    Unit::new_normalize(v.cross(&basis))
}

/// The axonometric view used when a host has no isometric command of its own.
///
/// The eye sits in the (+X, -Y, +Z) octant looking at the origin, with +Z up.
pub fn isometric_orientation() -> Orientation {
    // face_towards maps local +Z onto the given direction, so local -Z (forward)
    // ends up pointing from the eye back at the model.
    Orientation::face_towards(&Vector3::new(1.0, -1.0, 1.0), &Vector3::z())
}

/// A rotation of `angle` radians about `axis`.
pub fn axis_angle_orientation(axis: &Direction, angle: f64) -> Result<Orientation, GeometryError> {
    let axis = unit_direction(axis)?;
    Ok(Orientation::from_axis_angle(&axis, angle))
}

/// A direction drawn uniformly from the unit sphere.
///
/// Points are drawn from the cube [-1, 1]^3 and kept only when they fall inside
/// the unit ball and away from the origin; the survivors are normalized. Keeping
/// the whole cube would over-weight directions toward its corners, and accepting
/// a near-zero draw would need a fallback direction, so both are redrawn.
pub fn sample_uniform_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    loop {
        let v = Vector3::<f64>::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let norm_squared = v.norm_squared();
        if norm_squared > MIN_NORM * MIN_NORM && norm_squared <= 1.0 {
            return v / norm_squared.sqrt();
        }
    }
}

/// An angle in `[0, 2π)` radians.
pub fn sample_uniform_angle<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..TAU)
}
