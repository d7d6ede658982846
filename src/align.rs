//! Rigid point-set registration (Horn's closed-form method).
//!
//! Builds the 4×4 symmetric key matrix from the cross-covariance of the two
//! centered point sets; the eigenvector of its largest eigenvalue is the
//! optimal rotation quaternion. Degenerate inputs (empty sets, zero-norm key
//! matrix) fall back to identity rotation plus centroid-difference
//! translation.
//!
//! The weighted variant reproduces the decomposition's weighting convention
//! exactly: the model centroid is `Σw²p / Σw²` while the target centroid is
//! `Σwq / Σw²`. Uniform weights of 1 make it coincide with the unweighted
//! path; under non-uniform weights the two centroids deliberately diverge.

use nalgebra::{Matrix4, Quaternion, UnitQuaternion};

use crate::math::{Point3, Vector3d};
use crate::transform::RigidTransform;

/// Best rigid transform mapping `source` onto `dest` in the least-squares
/// sense, with uniform point weights.
pub fn align_points(source: &[Point3], dest: &[Point3]) -> RigidTransform {
    debug_assert_eq!(source.len(), dest.len());
    if source.is_empty() {
        return RigidTransform::identity();
    }

    // Centroids, accumulated in double precision.
    let mut cs = Vector3d::zeros();
    let mut cd = Vector3d::zeros();
    for (s, d) in source.iter().zip(dest) {
        cs += s.coords.cast::<f64>();
        cd += d.coords.cast::<f64>();
    }
    let n = source.len() as f64;
    cs /= n;
    cd /= n;

    // Cross-covariance of the centered sets.
    let (mut sxx, mut sxy, mut sxz) = (0.0f64, 0.0f64, 0.0f64);
    let (mut syx, mut syy, mut syz) = (0.0f64, 0.0f64, 0.0f64);
    let (mut szx, mut szy, mut szz) = (0.0f64, 0.0f64, 0.0f64);
    for (s, d) in source.iter().zip(dest) {
        let s = s.coords.cast::<f64>() - cs;
        let d = d.coords.cast::<f64>() - cd;
        sxx += s.x * d.x;
        sxy += s.x * d.y;
        sxz += s.x * d.z;
        syx += s.y * d.x;
        syy += s.y * d.y;
        syz += s.y * d.z;
        szx += s.z * d.x;
        szy += s.z * d.y;
        szz += s.z * d.z;
    }

    // Classical symmetric key matrix: trace at (0,0), skew differences along
    // the first row/column, symmetric sums elsewhere.
    #[rustfmt::skip]
    let key = Matrix4::new(
        sxx + syy + szz,  syz - szy,        szx - sxz,        sxy - syx,
        syz - szy,        sxx - syy - szz,  sxy + syx,        szx + sxz,
        szx - sxz,        sxy + syx,       -sxx + syy - szz,  syz + szy,
        sxy - syx,        szx + sxz,        syz + szy,       -sxx - syy + szz,
    );

    let rotation = if key.norm() > 0.0 {
        let eig = key.symmetric_eigen();
        // Strictly largest eigenvalue; ties keep the first occurrence.
        let mut maxi = 0;
        for i in 1..4 {
            if eig.eigenvalues[i] > eig.eigenvalues[maxi] {
                maxi = i;
            }
        }
        let q = eig.eigenvectors.column(maxi);
        // Eigenvector components are ordered (w, x, y, z).
        UnitQuaternion::new_normalize(Quaternion::new(
            q[0] as f32,
            q[1] as f32,
            q[2] as f32,
            q[3] as f32,
        ))
    } else {
        UnitQuaternion::identity()
    };

    // Translation maps the rotated source centroid onto the destination
    // centroid.
    let cs = Point3::new(cs.x as f32, cs.y as f32, cs.z as f32);
    let cd = Point3::new(cd.x as f32, cd.y as f32, cd.z as f32);
    let translation = cd - rotation.transform_point(&cs);
    RigidTransform::new(rotation, translation)
}

/// Weighted alignment between bind-pose `model` points and per-frame
/// `targets`, minimizing `Σ ‖w·R·p + t − q‖²` over rigid (R, t).
///
/// Centered model points are scaled by `w`; centered targets subtract `w`
/// times the target centroid. The Horn core then runs on the prepared
/// arrays (computing its own uniform centroids over them), and the returned
/// transform is corrected so it operates on the original un-centered model
/// coordinates. A zero weight sum degenerates to the identity.
pub fn align_points_weighted(
    model: &[Point3],
    targets: &[Point3],
    weights: &[f64],
) -> RigidTransform {
    debug_assert_eq!(model.len(), targets.len());
    debug_assert_eq!(model.len(), weights.len());

    let mut wsq_sum = 0.0f64;
    let mut cor_model = Vector3d::zeros();
    let mut cor_target = Vector3d::zeros();
    for v in 0..model.len() {
        let w = weights[v];
        cor_model += w * w * model[v].coords.cast::<f64>();
        cor_target += w * targets[v].coords.cast::<f64>();
        wsq_sum += w * w;
    }
    if wsq_sum <= 0.0 {
        return RigidTransform::identity();
    }
    cor_model /= wsq_sum;
    cor_target /= wsq_sum;
    let cm = Point3::new(cor_model.x as f32, cor_model.y as f32, cor_model.z as f32);
    let ct = Point3::new(cor_target.x as f32, cor_target.y as f32, cor_target.z as f32);

    // Center and weight the correspondence, then run the unweighted core.
    let mut m = Vec::with_capacity(model.len());
    let mut t = Vec::with_capacity(model.len());
    for v in 0..model.len() {
        let w = weights[v] as f32;
        m.push(Point3::from((model[v] - cm) * w));
        t.push(targets[v] - ct.coords * w);
    }
    let mut transform = align_points(&m, &t);

    // Corrective translation back to un-centered model coordinates (the
    // core's own translation cancels out of the composition).
    transform.translation = ct - transform.rotation.transform_point(&cm);
    transform
}
