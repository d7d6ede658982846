//! Dense convex quadratic programming via a primal active-set method.
//!
//! Solves `min ½·xᵀGx + g0ᵀx` subject to `CE·x + ce0 = 0` (equalities) and
//! `CI·x + ci0 ≥ 0` (inequalities). The working set always contains every
//! equality row; inequality rows enter when they become binding during a
//! ratio-tested step and leave when their multiplier turns negative at a
//! subproblem stationary point.
//!
//! Infeasibility, or failure to converge, is reported through the returned
//! objective value being `f64::INFINITY`, in the manner of classic
//! Goldfarb–Idnani style interfaces. The initial iterate is the minimum-norm
//! solution of the equality system; for simplex-style constraint sets this
//! is the uniform interior point, so a sentinel result on such a problem
//! means the problem itself is malformed.

use nalgebra::{DMatrix, DVector};

use crate::math::QP_TOL;

/// Objective value reported when no feasible minimizer was found.
pub const INFEASIBLE: f64 = f64::INFINITY;

/// Solve the QP, writing the minimizer into `x`. Returns the objective value
/// at the solution, or [`INFEASIBLE`].
pub fn solve_qp(
    g: &DMatrix<f64>,
    g0: &DVector<f64>,
    ce: &DMatrix<f64>,
    ce0: &DVector<f64>,
    ci: &DMatrix<f64>,
    ci0: &DVector<f64>,
    x: &mut DVector<f64>,
) -> f64 {
    let n = g0.len();
    let m_eq = ce.nrows();
    let m_in = ci.nrows();

    // Start from the minimum-norm solution of CE·x = -ce0.
    if m_eq > 0 {
        match (ce * ce.transpose()).lu().solve(&-ce0) {
            Some(y) => *x = ce.transpose() * y,
            None => return INFEASIBLE,
        }
    } else {
        *x = DVector::zeros(n);
    }
    if m_in > 0 {
        let r = ci * &*x + ci0;
        for i in 0..m_in {
            if r[i] < -QP_TOL {
                return INFEASIBLE;
            }
        }
    }

    let mut active = vec![false; m_in];
    let max_iter = 10 * (n + m_in) + 10;

    for _ in 0..max_iter {
        let grad = g * &*x + g0;
        let active_rows: Vec<usize> = (0..m_in).filter(|&i| active[i]).collect();
        let mw = m_eq + active_rows.len();

        // KKT system for the step direction and working-set multipliers:
        //   [G  Aᵀ][d]   [-grad]
        //   [A  0 ][ν] = [ 0   ]
        let size = n + mw;
        let mut kkt = DMatrix::<f64>::zeros(size, size);
        kkt.view_mut((0, 0), (n, n)).copy_from(g);
        for r in 0..m_eq {
            for j in 0..n {
                let a = ce[(r, j)];
                kkt[(n + r, j)] = a;
                kkt[(j, n + r)] = a;
            }
        }
        for (k, &row) in active_rows.iter().enumerate() {
            for j in 0..n {
                let a = ci[(row, j)];
                kkt[(n + m_eq + k, j)] = a;
                kkt[(j, n + m_eq + k)] = a;
            }
        }
        let mut rhs = DVector::<f64>::zeros(size);
        for j in 0..n {
            rhs[j] = -grad[j];
        }

        let sol = match kkt.lu().solve(&rhs) {
            Some(s) => s,
            None => return INFEASIBLE,
        };
        let d = sol.rows(0, n).into_owned();

        if d.norm() < QP_TOL {
            // Stationary for the working set. Stationarity reads
            // grad = -Aᵀν, so the multiplier of a `≥` row is -ν; the row
            // with the most positive ν (most negative multiplier) leaves.
            let mut worst = None;
            let mut worst_nu = QP_TOL;
            for (k, &row) in active_rows.iter().enumerate() {
                let nu = sol[n + m_eq + k];
                if nu > worst_nu {
                    worst_nu = nu;
                    worst = Some(row);
                }
            }
            match worst {
                Some(row) => active[row] = false,
                None => return qp_objective(g, g0, x),
            }
        } else {
            // Ratio test against the inactive inequalities.
            let mut alpha = 1.0;
            let mut blocking = None;
            if m_in > 0 {
                let ad = ci * &d;
                let ax = ci * &*x;
                for i in 0..m_in {
                    if active[i] || ad[i] >= -QP_TOL {
                        continue;
                    }
                    let limit = -(ax[i] + ci0[i]) / ad[i];
                    if limit < alpha {
                        alpha = limit;
                        blocking = Some(i);
                    }
                }
            }
            if alpha < 0.0 {
                alpha = 0.0;
            }
            *x += &d * alpha;
            if let Some(i) = blocking {
                active[i] = true;
            }
        }
    }
    INFEASIBLE
}

fn qp_objective(g: &DMatrix<f64>, g0: &DVector<f64>, x: &DVector<f64>) -> f64 {
    0.5 * x.dot(&(g * x)) + g0.dot(x)
}
