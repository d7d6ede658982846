use approx::assert_relative_eq;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use ssdr::align::{align_points, align_points_weighted};
use ssdr::RigidTransform;

fn tetrahedron() -> Vec<Point3<f32>> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ]
}

#[test]
fn recovers_rotation_and_translation() {
    // 90° about Y plus translation (1, 2, 3); alignment must recover it.
    let src = tetrahedron();
    let rot = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
    let truth = RigidTransform::new(rot, Vector3::new(1.0, 2.0, 3.0));
    let dst: Vec<_> = src.iter().map(|p| truth.transform_coord(p)).collect();

    let rec = align_points(&src, &dst);
    assert!(rec.rotation.angle_to(&truth.rotation) < 1e-5);
    assert_relative_eq!(rec.translation.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(rec.translation.y, 2.0, epsilon = 1e-5);
    assert_relative_eq!(rec.translation.z, 3.0, epsilon = 1e-5);
    for (s, d) in src.iter().zip(&dst) {
        let r = rec.transform_coord(s);
        assert_relative_eq!(r.x, d.x, epsilon = 1e-5);
        assert_relative_eq!(r.y, d.y, epsilon = 1e-5);
        assert_relative_eq!(r.z, d.z, epsilon = 1e-5);
    }
}

#[test]
fn single_point_falls_back_to_translation() {
    // One point is rotationally degenerate: identity rotation, centroid
    // difference translation.
    let src = vec![Point3::new(1.0, 1.0, 1.0)];
    let dst = vec![Point3::new(4.0, -1.0, 2.0)];
    let rec = align_points(&src, &dst);
    assert_eq!(rec.rotation, UnitQuaternion::identity());
    assert_relative_eq!(rec.translation.x, 3.0, epsilon = 1e-6);
    assert_relative_eq!(rec.translation.y, -2.0, epsilon = 1e-6);
    assert_relative_eq!(rec.translation.z, 1.0, epsilon = 1e-6);
}

#[test]
fn coincident_points_fall_back_to_identity_rotation() {
    let src = vec![Point3::new(2.0, 0.0, 0.0); 5];
    let dst = vec![Point3::new(2.0, 5.0, 0.0); 5];
    let rec = align_points(&src, &dst);
    assert_eq!(rec.rotation, UnitQuaternion::identity());
    assert_relative_eq!(rec.translation.y, 5.0, epsilon = 1e-6);
}

#[test]
fn empty_input_is_identity() {
    let rec = align_points(&[], &[]);
    assert_eq!(rec.rotation, UnitQuaternion::identity());
    assert_eq!(rec.translation, Vector3::zeros());
}

#[test]
fn unit_weights_match_unweighted_alignment() {
    // With weights of 1 the squared-weight and linear-weight centroid
    // conventions coincide, so the weighted path must reproduce the
    // unweighted one — including on a non-rigid (noisy) correspondence.
    let src = tetrahedron();
    let dst = vec![
        Point3::new(0.1, 2.0, 0.3),
        Point3::new(1.2, 2.1, 0.1),
        Point3::new(-0.2, 3.0, 0.4),
        Point3::new(0.0, 2.2, 1.3),
    ];
    let plain = align_points(&src, &dst);
    let weighted = align_points_weighted(&src, &dst, &[1.0; 4]);
    assert!(weighted.rotation.angle_to(&plain.rotation) < 1e-5);
    assert_relative_eq!(weighted.translation.x, plain.translation.x, epsilon = 1e-5);
    assert_relative_eq!(weighted.translation.y, plain.translation.y, epsilon = 1e-5);
    assert_relative_eq!(weighted.translation.z, plain.translation.z, epsilon = 1e-5);
}

#[test]
fn non_uniform_weights_follow_reference_arithmetic() {
    // Pin the weighting convention: model centroid Σw²p/Σw², target
    // centroid Σwq/Σw², model points scaled by w after centering, target
    // points offset by w times the target centroid.
    let model = tetrahedron();
    let targets = vec![
        Point3::new(0.5, 0.1, 0.0),
        Point3::new(1.4, 0.2, -0.1),
        Point3::new(0.3, 1.2, 0.2),
        Point3::new(0.1, 0.0, 1.5),
    ];
    let weights = [0.7f64, 0.1, 0.9, 0.3];

    let mut wsq = 0.0f64;
    let mut cm = Vector3::<f64>::zeros();
    let mut ct = Vector3::<f64>::zeros();
    for v in 0..4 {
        let w = weights[v];
        cm += w * w * model[v].coords.cast::<f64>();
        ct += w * targets[v].coords.cast::<f64>();
        wsq += w * w;
    }
    cm /= wsq;
    ct /= wsq;
    let cm32 = Point3::new(cm.x as f32, cm.y as f32, cm.z as f32);
    let ct32 = Point3::new(ct.x as f32, ct.y as f32, ct.z as f32);

    let mut m = Vec::new();
    let mut t = Vec::new();
    for v in 0..4 {
        let w = weights[v] as f32;
        m.push(Point3::from((model[v] - cm32) * w));
        t.push(targets[v] - ct32.coords * w);
    }
    let core = align_points(&m, &t);
    let expected_translation = ct32 - core.rotation.transform_point(&cm32);

    let rec = align_points_weighted(&model, &targets, &weights);
    assert!(rec.rotation.angle_to(&core.rotation) < 1e-6);
    assert_relative_eq!(rec.translation.x, expected_translation.x, epsilon = 1e-6);
    assert_relative_eq!(rec.translation.y, expected_translation.y, epsilon = 1e-6);
    assert_relative_eq!(rec.translation.z, expected_translation.z, epsilon = 1e-6);
}

#[test]
fn zero_weight_sum_is_identity() {
    let model = tetrahedron();
    let rec = align_points_weighted(&model, &model, &[0.0; 4]);
    assert_eq!(rec.rotation, UnitQuaternion::identity());
    assert_eq!(rec.translation, Vector3::zeros());
}
