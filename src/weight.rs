//! Per-vertex sparse skinning-weight optimization.
//!
//! For fixed bone transforms, every vertex independently solves a convex QP
//! over all bones (weights sum to 1, weights non-negative), minimizing the
//! squared reconstruction error across all example frames. The dense
//! solution is then greedily sparsified to at most `num_indices` influences;
//! when sparsification drops probability mass, a reduced QP restricted to
//! the selected bones restores optimality, and if that reduced problem
//! fails the selected weights are simply renormalized.
//!
//! Vertices are independent, so the whole pass runs in parallel.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::qp::solve_qp;
use crate::types::{DecomposeError, Input, Output, Parameter};

/// One full weight pass over all vertices, updating `output.index` and
/// `output.weight` in place. Errors only on an infeasible unrestricted
/// solve, which is a fatal precondition violation.
pub fn solve_weight_map(
    output: &mut Output,
    input: &Input,
    param: &Parameter,
) -> Result<(), DecomposeError> {
    let ns = input.num_examples();
    let k = param.num_indices;
    let nb = output.num_bones;
    debug_assert_eq!(k, output.num_indices);

    // Shared constraint blocks: Σw = 1 and w ≥ 0.
    let ce_full = DMatrix::<f64>::repeat(1, nb, 1.0);
    let ce0 = DVector::<f64>::from_element(1, -1.0);
    let ci_full = DMatrix::<f64>::identity(nb, nb);
    let ci0_full = DVector::<f64>::zeros(nb);

    let Output {
        ref bone_trans,
        ref mut index,
        ref mut weight,
        ..
    } = *output;

    index
        .par_chunks_mut(k)
        .zip(weight.par_chunks_mut(k))
        .enumerate()
        .try_for_each(|(v, (idx, wgt))| {
            // Row b of A: bone b's transformed bind position across all
            // frames, flattened as (frame, x, y, z).
            let p = input.bind(v);
            let mut am = DMatrix::<f64>::zeros(nb, ns * 3);
            for s in 0..ns {
                for b in 0..nb {
                    let tv = bone_trans[s * nb + b].transform_coord(p);
                    am[(b, s * 3)] = tv.x as f64;
                    am[(b, s * 3 + 1)] = tv.y as f64;
                    am[(b, s * 3 + 2)] = tv.z as f64;
                }
            }
            let mut bv = DVector::<f64>::zeros(ns * 3);
            for s in 0..ns {
                let q = input.sampled(s, v);
                bv[s * 3] = q.x as f64;
                bv[s * 3 + 1] = q.y as f64;
                bv[s * 3 + 2] = q.z as f64;
            }

            // G = A·Aᵀ, g = -A·b.
            let gm = &am * am.transpose();
            let gv = -(&am * &bv);

            let mut dense = DVector::<f64>::zeros(nb);
            let obj = solve_qp(&gm, &gv, &ce_full, &ce0, &ci_full, &ci0_full, &mut dense);
            if obj.is_infinite() {
                return Err(DecomposeError::InfeasibleWeights { vertex: v });
            }

            // Greedy top-K sparsification; unfilled slots become weight-0
            // sentinels on bone 0.
            let mut picked = 0usize;
            let mut weight_sum = 0.0f64;
            for i in 0..k {
                let mut best = 0usize;
                let mut maxw = -f64::MAX;
                for b in 0..nb {
                    if dense[b] > maxw {
                        maxw = dense[b];
                        best = b;
                    }
                }
                if maxw <= 0.0 {
                    break;
                }
                idx[i] = best as u32;
                wgt[i] = maxw as f32;
                weight_sum += maxw;
                dense[best] = 0.0;
                picked += 1;
            }
            for i in picked..k {
                idx[i] = 0;
                wgt[i] = 0.0;
            }

            // Mass was dropped on excluded bones: re-solve restricted to the
            // selected ones, falling back to renormalization if the reduced
            // problem is infeasible.
            if picked > 0 && weight_sum < 1.0 {
                let mut sam = DMatrix::<f64>::zeros(picked, ns * 3);
                for i in 0..picked {
                    sam.row_mut(i).copy_from(&am.row(idx[i] as usize));
                }
                let sgm = &sam * sam.transpose();
                let sgv = -(&sam * &bv);
                let ce = DMatrix::<f64>::repeat(1, picked, 1.0);
                let ci = DMatrix::<f64>::identity(picked, picked);
                let ci0 = DVector::<f64>::zeros(picked);

                let mut sparse = DVector::<f64>::zeros(picked);
                let sobj = solve_qp(&sgm, &sgv, &ce, &ce0, &ci, &ci0, &mut sparse);
                if sobj.is_finite() {
                    for i in 0..picked {
                        wgt[i] = sparse[i] as f32;
                    }
                } else {
                    for i in 0..picked {
                        wgt[i] /= weight_sum as f32;
                    }
                }
            }
            Ok(())
        })
}
