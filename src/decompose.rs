//! Block-coordinate-descent driver.
//!
//! Pipeline: validate parameters → initial clustering (fixes the bone
//! count) → dominant-bone transform fit → a fixed budget of alternating
//! weight and transform passes. The approximation error is recorded after
//! every half-step for diagnostics only; no convergence check cuts the loop
//! short of its budget.

use log::debug;

use crate::cluster::{cluster_initial_bones, fit_cluster_transforms};
use crate::refit::refit_bone_transforms;
use crate::types::{DecomposeError, Input, Output, Parameter};
use crate::weight::solve_weight_map;

/// Decompose an animated vertex cache into per-frame rigid bone transforms
/// and sparse per-vertex skinning weights.
///
/// This is the primary entry point. The returned [`Output`] holds the final
/// bone count, the `index`/`weight` influence arrays, and the frame-major
/// transform array.
pub fn decompose(input: &Input, param: &Parameter) -> Result<Output, DecomposeError> {
    param.validate()?;

    let mut output = Output::new(input.num_vertices(), param.num_indices);

    // Cluster-splitting initialization fixes the bone count and the
    // exclusive vertex assignment in influence slot 0.
    output.num_bones = cluster_initial_bones(&mut output, input, param);

    // Initial per-frame transforms from the exclusive assignment.
    let mut bone_trans = std::mem::take(&mut output.bone_trans);
    fit_cluster_transforms(
        &mut bone_trans,
        output.num_bones,
        &output.index,
        param.num_indices,
        input,
    );
    output.bone_trans = bone_trans;
    debug!(
        "clustered {} bones, initial error {:.6}",
        output.num_bones,
        approximation_error_sq(&output, input)
    );

    for iteration in 0..param.num_max_iterations {
        solve_weight_map(&mut output, input, param)?;
        debug!(
            "iteration {iteration} weight pass, error {:.6}",
            approximation_error_sq(&output, input)
        );
        refit_bone_transforms(&mut output, input, param);
        debug!(
            "iteration {iteration} transform pass, error {:.6}",
            approximation_error_sq(&output, input)
        );
    }
    Ok(output)
}

/// Total squared distance between the linear-blend reconstruction and the
/// true samples, over all frames and vertices. Diagnostic only; the
/// optimization never branches on it.
pub fn approximation_error_sq(output: &Output, input: &Input) -> f64 {
    let mut sum = 0.0f64;
    for s in 0..input.num_examples() {
        for v in 0..input.num_vertices() {
            let rec = output.skin(s, v, input.bind(v));
            sum += (input.sampled(s, v) - rec).norm_squared() as f64;
        }
    }
    sum
}
