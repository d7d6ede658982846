//! Smooth Skinning Decomposition with Rigid bones (SSDR).
//!
//! Decomposes an animated vertex cache — a bind pose plus per-frame vertex
//! positions — into a compact skeletal representation: a small set of rigid
//! bone transforms per frame and sparse per-vertex blend weights, such that
//! linear-blend skinning reconstructs the original animation with minimal
//! error.
//!
//! ## Pipeline
//!
//! 1. **Clustering** — iterative splitting partitions the vertices into
//!    rigid clusters and fixes the bone count.
//! 2. **Block coordinate descent** — alternates a per-vertex convex QP for
//!    sparse blend weights with a per-(bone, frame) weighted rigid refit
//!    (Horn's closed-form alignment), for a fixed iteration budget.
//!
//! The core consumes plain point arrays and produces plain transform and
//! weight arrays; it has no dependency on any graphics API. The caller
//! uploads `index`/`weight` as skinning attributes and expands `bone_trans`
//! into a per-frame matrix palette.
//!
//! ```no_run
//! use ssdr::{decompose, Input, Parameter};
//!
//! # let (bind, frames, num_frames) = (vec![], vec![], 0);
//! let input = Input::new(bind, frames, num_frames)?;
//! let out = decompose(&input, &Parameter::default())?;
//! for frame in 0..num_frames {
//!     let _palette = out.matrix_palette(frame);
//! }
//! # Ok::<(), ssdr::DecomposeError>(())
//! ```

pub mod align;
pub mod cluster;
pub mod decompose;
pub mod math;
pub mod qp;
pub mod refit;
pub mod transform;
pub mod types;
pub mod weight;

pub use crate::decompose::{approximation_error_sq, decompose};
pub use crate::transform::RigidTransform;
pub use crate::types::{DecomposeError, Input, Output, Parameter};
