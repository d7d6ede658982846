use approx::assert_relative_eq;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use ssdr::weight::solve_weight_map;
use ssdr::{Input, Output, Parameter, RigidTransform};

/// Two bones with known translation tracks; the first four vertices follow
/// bone 0 and the rest follow bone 1.
fn rig() -> (Input, Output, Parameter) {
    let bind = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(11.0, 0.0, 0.0),
        Point3::new(10.0, 1.0, 0.0),
        Point3::new(10.0, 0.0, 1.0),
    ];
    let num_frames = 3;
    let track0 = |s: usize| Vector3::new(s as f32, 0.0, 0.0);
    let track1 = |s: usize| Vector3::new(0.0, 0.0, -2.0 * s as f32);

    let mut sample = Vec::new();
    for s in 0..num_frames {
        for (v, p) in bind.iter().enumerate() {
            sample.push(p + if v < 4 { track0(s) } else { track1(s) });
        }
    }
    let input = Input::new(bind, sample, num_frames).unwrap();

    let param = Parameter {
        num_indices: 2,
        num_min_bones: 2,
        num_max_iterations: 1,
    };
    let mut output = Output::new(input.num_vertices(), param.num_indices);
    output.num_bones = 2;
    for s in 0..num_frames {
        output.bone_trans.push(RigidTransform::new(UnitQuaternion::identity(), track0(s)));
        output.bone_trans.push(RigidTransform::new(UnitQuaternion::identity(), track1(s)));
    }
    (input, output, param)
}

#[test]
fn exact_rig_gets_exclusive_weights() {
    let (input, mut output, param) = rig();
    solve_weight_map(&mut output, &input, &param).unwrap();

    for v in 0..input.num_vertices() {
        let expected = if v < 4 { 0 } else { 1 };
        assert_eq!(output.bone(v, 0), expected);
        assert_relative_eq!(output.blend_weight(v, 0), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn weights_are_normalized_and_nonnegative() {
    let (input, mut output, param) = rig();
    solve_weight_map(&mut output, &input, &param).unwrap();

    for v in 0..input.num_vertices() {
        let mut sum = 0.0f64;
        for i in 0..param.num_indices {
            let w = output.blend_weight(v, i);
            assert!(w >= 0.0);
            assert!(output.bone(v, i) < output.num_bones);
            sum += w as f64;
        }
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
    }
}

#[test]
fn weight_pass_is_idempotent() {
    // The pass reads only the input and the transforms, so re-running it
    // with unchanged transforms must reproduce the assignment exactly.
    let (input, mut output, param) = rig();
    solve_weight_map(&mut output, &input, &param).unwrap();
    let index = output.index.clone();
    let weight = output.weight.clone();

    solve_weight_map(&mut output, &input, &param).unwrap();
    assert_eq!(output.index, index);
    assert_eq!(output.weight, weight);
}
