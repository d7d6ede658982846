//! Decomposition input/output containers, parameters, and the error type.

use nalgebra::Matrix4;

use crate::math::{Point3, Vector3};
use crate::transform::RigidTransform;

/// Errors surfaced by [`decompose`](crate::decompose::decompose).
#[derive(Debug)]
pub enum DecomposeError {
    /// The sample array length is not `num_examples * num_vertices`.
    SampleLengthMismatch { expected: usize, actual: usize },
    /// The bind model has no vertices, or there are no example frames.
    EmptyInput,
    /// A parameter is zero where a positive count is required.
    InvalidParameter(&'static str),
    /// The unrestricted per-vertex weight QP reported infeasibility. The
    /// simplex constraint set is never empty, so this indicates a broken
    /// invariant upstream rather than a recoverable condition.
    InfeasibleWeights { vertex: usize },
}

impl std::fmt::Display for DecomposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecomposeError::SampleLengthMismatch { expected, actual } => {
                write!(f, "sample array has {actual} points, expected {expected}")
            }
            DecomposeError::EmptyInput => {
                write!(f, "input needs at least one vertex and one example frame")
            }
            DecomposeError::InvalidParameter(name) => {
                write!(f, "parameter {name} must be positive")
            }
            DecomposeError::InfeasibleWeights { vertex } => {
                write!(f, "weight QP for vertex {vertex} reported infeasible")
            }
        }
    }
}

impl std::error::Error for DecomposeError {}

/// Read-only decomposition input: a bind pose plus a complete set of example
/// frames sampled from the animated vertex cache.
///
/// The sample array is frame-major: `sample[s * num_vertices + v]` is vertex
/// `v` in example frame `s`.
pub struct Input {
    bind_model: Vec<Point3>,
    sample: Vec<Point3>,
    num_vertices: usize,
    num_examples: usize,
}

impl Input {
    /// Validate array lengths up front; no computation happens on malformed
    /// input.
    pub fn new(
        bind_model: Vec<Point3>,
        sample: Vec<Point3>,
        num_examples: usize,
    ) -> Result<Self, DecomposeError> {
        if bind_model.is_empty() || num_examples == 0 {
            return Err(DecomposeError::EmptyInput);
        }
        let expected = bind_model.len() * num_examples;
        if sample.len() != expected {
            return Err(DecomposeError::SampleLengthMismatch {
                expected,
                actual: sample.len(),
            });
        }
        Ok(Self {
            num_vertices: bind_model.len(),
            num_examples,
            bind_model,
            sample,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_examples(&self) -> usize {
        self.num_examples
    }

    pub fn bind_model(&self) -> &[Point3] {
        &self.bind_model
    }

    /// Bind-pose position of vertex `v`.
    pub fn bind(&self, v: usize) -> &Point3 {
        &self.bind_model[v]
    }

    /// Position of vertex `v` in example frame `s`.
    pub fn sampled(&self, s: usize, v: usize) -> &Point3 {
        &self.sample[s * self.num_vertices + v]
    }
}

/// Decomposition parameters.
#[derive(Clone, Copy, Debug)]
pub struct Parameter {
    /// Maximum number of bones influencing a single vertex (K).
    pub num_indices: usize,
    /// Lower bound on the bone count produced by the initial clustering.
    pub num_min_bones: usize,
    /// Fixed iteration budget for the block-coordinate-descent loop.
    pub num_max_iterations: usize,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            num_indices: 4,
            num_min_bones: 16,
            num_max_iterations: 30,
        }
    }
}

impl Parameter {
    pub(crate) fn validate(&self) -> Result<(), DecomposeError> {
        if self.num_indices == 0 {
            return Err(DecomposeError::InvalidParameter("num_indices"));
        }
        if self.num_min_bones == 0 {
            return Err(DecomposeError::InvalidParameter("num_min_bones"));
        }
        Ok(())
    }
}

/// The decomposition result (and, during optimization, its mutable state).
///
/// `index` and `weight` are parallel `num_vertices * num_indices` arrays;
/// slot `i`'s weight belongs to slot `i`'s bone id. `bone_trans` is
/// frame-major with `num_examples * num_bones` entries. Unoccupied slots
/// carry weight 0 and point at bone 0 as a no-op sentinel.
pub struct Output {
    /// Bone count; fixed by the initial clustering.
    pub num_bones: usize,
    /// Influence slots per vertex.
    pub num_indices: usize,
    /// Per-slot bone ids.
    pub index: Vec<u32>,
    /// Per-slot blend weights; each vertex's occupied slots sum to 1.
    pub weight: Vec<f32>,
    /// Per-(frame, bone) rigid transforms, frame-major.
    pub bone_trans: Vec<RigidTransform>,
}

impl Output {
    /// Empty state: every slot on the sentinel bone with weight 0, no
    /// transforms yet.
    pub fn new(num_vertices: usize, num_indices: usize) -> Self {
        Self {
            num_bones: 0,
            num_indices,
            index: vec![0; num_vertices * num_indices],
            weight: vec![0.0; num_vertices * num_indices],
            bone_trans: Vec::new(),
        }
    }

    /// Bone id in influence slot `i` of vertex `v`.
    pub fn bone(&self, v: usize, i: usize) -> usize {
        self.index[v * self.num_indices + i] as usize
    }

    /// Blend weight in influence slot `i` of vertex `v`.
    pub fn blend_weight(&self, v: usize, i: usize) -> f32 {
        self.weight[v * self.num_indices + i]
    }

    /// Bone `b`'s rigid transform in example frame `s`.
    pub fn trans(&self, s: usize, b: usize) -> &RigidTransform {
        &self.bone_trans[s * self.num_bones + b]
    }

    /// Expand frame `s` into a matrix palette for linear-blend skinning.
    pub fn matrix_palette(&self, s: usize) -> Vec<Matrix4<f32>> {
        (0..self.num_bones).map(|b| self.trans(s, b).to_matrix()).collect()
    }

    /// Linear-blend reconstruction of a bind-pose point under vertex `v`'s
    /// influences in frame `s`.
    pub fn skin(&self, s: usize, v: usize, bind: &Point3) -> Point3 {
        let mut acc = Vector3::zeros();
        for i in 0..self.num_indices {
            let w = self.blend_weight(v, i);
            if w != 0.0 {
                acc += self.trans(s, self.bone(v, i)).transform_coord(bind).coords * w;
            }
        }
        Point3::from(acc)
    }
}
