//! Per-(bone, frame) rigid transform refit under multi-bone influence.
//!
//! For a bone `b` and frame `s`, every vertex carrying weight on `b`
//! contributes a correspondence between its bind position and an
//! "explained-away" target: the sampled position minus every *other*
//! influencing bone's weighted contribution. The weighted alignment of that
//! correspondence yields the bone's new pose for the frame.
//!
//! All refits read the same pre-phase transform snapshot and write disjoint
//! slots, so the phase is computed in parallel and replaces the transform
//! array wholesale at the end.

use rayon::prelude::*;

use crate::align::align_points_weighted;
use crate::transform::RigidTransform;
use crate::types::{Input, Output, Parameter};

/// One full transform pass over all (bone, frame) pairs, replacing
/// `output.bone_trans`.
pub fn refit_bone_transforms(output: &mut Output, input: &Input, param: &Parameter) {
    let nv = input.num_vertices();
    let ns = input.num_examples();
    let nb = output.num_bones;
    let k = param.num_indices;

    // Per-bone vertex weights: the first slot naming the bone wins, vertices
    // not influenced by it get 0 and drop out of the fit.
    let bone_weights: Vec<Vec<f64>> = (0..nb)
        .map(|b| {
            (0..nv)
                .map(|v| {
                    for i in 0..k {
                        if output.bone(v, i) == b {
                            return output.blend_weight(v, i) as f64;
                        }
                    }
                    0.0
                })
                .collect()
        })
        .collect();

    // Every refit reads the pre-phase transforms; the array is only
    // replaced once the whole phase has been collected.
    let out: &Output = output;
    let new_trans: Vec<RigidTransform> = (0..ns * nb)
        .into_par_iter()
        .map(|id| {
            let s = id / nb;
            let b = id % nb;
            refit_one(s, b, &bone_weights[b], out, input, param)
        })
        .collect();
    output.bone_trans = new_trans;
}

/// Build the explained-away targets for (frame `s`, bone `b`) and solve the
/// weighted alignment. The correspondence is rebuilt from scratch for every
/// (bone, frame) pair.
fn refit_one(
    s: usize,
    b: usize,
    weights: &[f64],
    output: &Output,
    input: &Input,
    param: &Parameter,
) -> RigidTransform {
    let nv = input.num_vertices();
    let k = param.num_indices;

    let mut targets = Vec::with_capacity(nv);
    for v in 0..nv {
        let mut q = *input.sampled(s, v);
        let p = input.bind(v);
        for i in 0..k {
            let other = output.bone(v, i);
            if other != b {
                let w = output.blend_weight(v, i);
                q -= output.trans(s, other).transform_coord(p).coords * w;
            }
        }
        targets.push(q);
    }
    align_points_weighted(input.bind_model(), &targets, weights)
}
