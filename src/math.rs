//! Linear algebra type aliases and numeric tolerances.

/// Stored point type: single precision, matching typical vertex data.
pub type Point3 = nalgebra::Point3<f32>;

/// Stored vector type (translations, residuals).
pub type Vector3 = nalgebra::Vector3<f32>;

/// Double-precision accumulator vector for optimization arithmetic.
pub type Vector3d = nalgebra::Vector3<f64>;

/// Convergence and feasibility tolerance for the QP active-set solver.
pub const QP_TOL: f64 = 1e-10;
