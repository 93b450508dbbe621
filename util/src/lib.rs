//! Assertions and geometric transformations shared by the test suites.
use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Entry-wise approximate equality of two `f64` slices, relative to the largest entry of
/// the right-hand side (or one, if all entries are smaller).
#[macro_export]
macro_rules! assert_approx_slice_eq {
    ($x:expr, $y:expr, reltol = $tol:expr) => {{
        let (x, y): (&[f64], &[f64]) = (&$x, &$y);
        assert_eq!(x.len(), y.len(), "Slices have different lengths");

        let scale = y.iter().fold(1.0f64, |scale, y_i| scale.max(y_i.abs()));
        let max_absdiff = x
            .iter()
            .zip(y)
            .map(|(x_i, y_i)| (x_i - y_i).abs())
            .fold(0.0f64, f64::max);
        let approx_eq = max_absdiff <= $tol * scale;

        if !approx_eq {
            println!("reltol: {:e}", $tol);
            println!("left: {:?}", x);
            println!("right: {:?}", y);
            println!("max absdiff: {:e}", max_absdiff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// A rigid motion of the plane, embedded in 3D as a rotation about the z axis.
pub fn planar_rigid_motion(angle: f64, translation: [f64; 2]) -> Isometry3<f64> {
    let [tx, ty] = translation;
    Isometry3::from_parts(
        Translation3::new(tx, ty, 0.0),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
    )
}

/// A rigid motion of space: rotation by `angle` about `axis`, followed by a translation.
pub fn rigid_motion(axis: [f64; 3], angle: f64, translation: [f64; 3]) -> Isometry3<f64> {
    let [tx, ty, tz] = translation;
    let rotation = Rotation3::new(Vector3::from(axis).normalize() * angle);
    Isometry3::from_parts(
        Translation3::new(tx, ty, tz),
        UnitQuaternion::from_rotation_matrix(&rotation),
    )
}

/// Uniform scaling about the origin.
pub fn scale(factor: f64) -> impl Fn(&Point3<f64>) -> Point3<f64> {
    move |x| Point3::from(factor * x.coords)
}
