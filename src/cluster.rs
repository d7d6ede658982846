//! Initial bone clustering by iterative splitting.
//!
//! Starts from a single cluster holding every vertex and repeatedly splits
//! off the worst vertex of each cluster — the one with the largest
//! reconstruction error scaled by its squared bind-pose distance from the
//! cluster centroid — then refits cluster transforms and rebinds every
//! vertex to whichever cluster reconstructs it best, pruning clusters that
//! end up empty. The loop terminates purely by cluster count, never by an
//! error threshold, so it makes progress even on perfectly rigid input.

use crate::align::align_points;
use crate::math::{Point3, Vector3d};
use crate::transform::RigidTransform;
use crate::types::{Input, Output, Parameter};

/// Produce the initial vertex→bone partition. On return, influence slot 0 of
/// every vertex holds its cluster id with weight 1. Returns the cluster
/// count, which becomes the decomposition's bone count.
pub fn cluster_initial_bones(output: &mut Output, input: &Input, param: &Parameter) -> usize {
    let nv = input.num_vertices();
    let ns = input.num_examples();
    let k = output.num_indices;

    // One cluster holding everything, uniform weight on slot 0.
    output.index.iter_mut().for_each(|i| *i = 0);
    output.weight.iter_mut().for_each(|w| *w = 0.0);
    for v in 0..nv {
        output.weight[v * k] = 1.0;
    }

    let mut num_clusters = 1usize;
    let mut bone_trans = vec![RigidTransform::identity(); ns];
    fit_cluster_transforms(&mut bone_trans, num_clusters, &output.index, k, input);

    let target = param.num_min_bones.min(nv);
    while num_clusters < target {
        // Bind-pose centroid of each cluster.
        let mut center = vec![Vector3d::zeros(); num_clusters];
        let mut counts = vec![0usize; num_clusters];
        for v in 0..nv {
            let c = output.bone(v, 0);
            center[c] += input.bind(v).coords.cast::<f64>();
            counts[c] += 1;
        }
        for c in 0..num_clusters {
            if counts[c] > 0 {
                center[c] /= counts[c] as f64;
            }
        }

        // Worst vertex per cluster: reconstruction error across all frames,
        // scaled by the squared distance from the cluster centroid so that
        // spatial outliers are preferred as split seeds.
        let mut max_score = vec![f64::MIN; num_clusters];
        let mut worst = vec![usize::MAX; num_clusters];
        for v in 0..nv {
            let c = output.bone(v, 0);
            let err = vertex_error_sq(v, &bone_trans, num_clusters, c, input);
            let d = input.bind(v).coords.cast::<f64>() - center[c];
            let score = err * d.norm_squared();
            if score > max_score[c] {
                max_score[c] = score;
                worst[c] = v;
            }
        }

        // Split the worst vertex of every cluster into a brand-new cluster.
        let prev = num_clusters;
        for c in 0..prev {
            if worst[c] != usize::MAX {
                output.index[worst[c] * k] = num_clusters as u32;
                num_clusters += 1;
            }
        }
        fit_cluster_transforms(&mut bone_trans, num_clusters, &output.index, k, input);

        // Rebind by reconstruction error. If the rebind collapses the new
        // clusters and stalls the count (perfectly rigid or coincident
        // vertices), keep the forced split partition instead so the count
        // still grows.
        let saved_index = output.index.clone();
        let saved_trans = bone_trans.clone();
        let rebound = bind_vertices_to_bones(output, &mut bone_trans, input);
        if rebound > prev {
            num_clusters = rebound;
        } else {
            output.index = saved_index;
            bone_trans = saved_trans;
            num_clusters = prune_empty_bones(output, &mut bone_trans, num_clusters, ns);
            fit_cluster_transforms(&mut bone_trans, num_clusters, &output.index, k, input);
        }
    }
    num_clusters
}

/// Fit each bone's per-frame transform from the vertices exclusively bound
/// to it (influence slot 0), with uniform weights.
pub(crate) fn fit_cluster_transforms(
    bone_trans: &mut Vec<RigidTransform>,
    num_bones: usize,
    index: &[u32],
    num_indices: usize,
    input: &Input,
) {
    let nv = input.num_vertices();
    let ns = input.num_examples();

    // Group vertices by owning bone (counting sort) so every (bone, frame)
    // alignment sees a contiguous slice.
    let mut counts = vec![0usize; num_bones];
    for v in 0..nv {
        counts[index[v * num_indices] as usize] += 1;
    }
    let mut starts = vec![0usize; num_bones];
    for b in 1..num_bones {
        starts[b] = starts[b - 1] + counts[b - 1];
    }

    let mut skin = vec![Point3::origin(); nv];
    let mut anim = vec![Point3::origin(); nv * ns];
    let mut cursor = starts.clone();
    for v in 0..nv {
        let b = index[v * num_indices] as usize;
        let dst = cursor[b];
        skin[dst] = *input.bind(v);
        for s in 0..ns {
            anim[s * nv + dst] = *input.sampled(s, v);
        }
        cursor[b] += 1;
    }

    bone_trans.clear();
    bone_trans.resize(ns * num_bones, RigidTransform::identity());
    for b in 0..num_bones {
        let lo = starts[b];
        let hi = lo + counts[b];
        for s in 0..ns {
            bone_trans[s * num_bones + b] =
                align_points(&skin[lo..hi], &anim[s * nv + lo..s * nv + hi]);
        }
    }
}

/// Rebind every vertex (influence slot 0) to the bone minimizing its summed
/// squared reconstruction error across all frames, ties going to the lowest
/// bone id, then prune empty bones. Returns the surviving bone count.
pub(crate) fn bind_vertices_to_bones(
    output: &mut Output,
    bone_trans: &mut Vec<RigidTransform>,
    input: &Input,
) -> usize {
    let nv = input.num_vertices();
    let num_bones = bone_trans.len() / input.num_examples();

    for v in 0..nv {
        let mut best = 0usize;
        let mut best_err = f64::MAX;
        for b in 0..num_bones {
            let err = vertex_error_sq(v, bone_trans, num_bones, b, input);
            if err < best_err {
                best = b;
                best_err = err;
            }
        }
        output.index[v * output.num_indices] = best as u32;
    }
    prune_empty_bones(output, bone_trans, num_bones, input.num_examples())
}

/// Delete bones with no exclusively-bound vertex, remapping the surviving
/// bone ids downward in a single pass. Returns the new bone count.
pub(crate) fn prune_empty_bones(
    output: &mut Output,
    bone_trans: &mut Vec<RigidTransform>,
    num_bones: usize,
    num_examples: usize,
) -> usize {
    let k = output.num_indices;
    let nv = output.index.len() / k;

    let mut counts = vec![0usize; num_bones];
    for v in 0..nv {
        counts[output.index[v * k] as usize] += 1;
    }

    let mut remap = vec![usize::MAX; num_bones];
    let mut kept = 0usize;
    for b in 0..num_bones {
        if counts[b] > 0 {
            remap[b] = kept;
            kept += 1;
        }
    }
    if kept == num_bones {
        return num_bones;
    }

    let mut trimmed = Vec::with_capacity(num_examples * kept);
    for s in 0..num_examples {
        for b in 0..num_bones {
            if remap[b] != usize::MAX {
                trimmed.push(bone_trans[s * num_bones + b]);
            }
        }
    }
    *bone_trans = trimmed;

    for v in 0..nv {
        let slot = v * k;
        output.index[slot] = remap[output.index[slot] as usize] as u32;
    }
    kept
}

/// Summed squared reconstruction error of vertex `v` across all frames under
/// bone `b`'s transform track.
fn vertex_error_sq(
    v: usize,
    bone_trans: &[RigidTransform],
    num_bones: usize,
    b: usize,
    input: &Input,
) -> f64 {
    let mut err = 0.0f64;
    for s in 0..input.num_examples() {
        let p = bone_trans[s * num_bones + b].transform_coord(input.bind(v));
        err += (input.sampled(s, v) - p).norm_squared() as f64;
    }
    err
}
