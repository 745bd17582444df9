//! Clarabel backend for [`QuadraticProgram`].

use std::time::Duration;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use tracing::{debug, warn};

use super::{ConstraintSense, QpSettings, QpSolution, QpSolver, QpStatus, QuadraticProgram};
use crate::error::{MathError, MathResult};

/// Interior-point QP solver backed by Clarabel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelSolver {
    settings: QpSettings,
}

impl ClarabelSolver {
    /// Creates a solver with the given settings.
    #[must_use]
    pub fn new(settings: QpSettings) -> Self {
        Self { settings }
    }

    /// The solver settings.
    pub fn settings(&self) -> &QpSettings {
        &self.settings
    }
}

/// Constraint rows in Clarabel's `Ax + s = b` form, equality rows first.
struct ConicRows {
    rows: Vec<Vec<(usize, f64)>>,
    b: Vec<f64>,
    zero: usize,
    nonneg: usize,
}

fn conic_rows(problem: &QuadraticProgram) -> ConicRows {
    let mut eq_rows = Vec::new();
    let mut eq_b = Vec::new();
    let mut ineq_rows = Vec::new();
    let mut ineq_b = Vec::new();

    for c in problem.constraints() {
        match c.sense {
            ConstraintSense::Equal => {
                eq_rows.push(c.terms.clone());
                eq_b.push(c.rhs);
            }
            ConstraintSense::LessEqual => {
                ineq_rows.push(c.terms.clone());
                ineq_b.push(c.rhs);
            }
            ConstraintSense::GreaterEqual => {
                ineq_rows.push(c.terms.iter().map(|&(i, v)| (i, -v)).collect());
                ineq_b.push(-c.rhs);
            }
        }
    }

    for (i, v) in problem.variables().iter().enumerate() {
        if v.upper.is_finite() {
            ineq_rows.push(vec![(i, 1.0)]);
            ineq_b.push(v.upper);
        }
        if v.lower.is_finite() {
            ineq_rows.push(vec![(i, -1.0)]);
            ineq_b.push(-v.lower);
        }
    }

    let zero = eq_rows.len();
    let nonneg = ineq_rows.len();
    eq_rows.extend(ineq_rows);
    eq_b.extend(ineq_b);

    ConicRows {
        rows: eq_rows,
        b: eq_b,
        zero,
        nonneg,
    }
}

/// Converts sparse rows to compressed-sparse-column form.
fn rows_to_csc(rows: &[Vec<(usize, f64)>], ncols: usize) -> CscMatrix<f64> {
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); ncols];
    for (r, row) in rows.iter().enumerate() {
        for &(c, v) in row {
            if v != 0.0 {
                columns[c].push((r, v));
            }
        }
    }

    let mut colptr = Vec::with_capacity(ncols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for mut col in columns {
        col.sort_by_key(|&(r, _)| r);
        // Duplicate terms for the same variable are summed.
        for (r, v) in col {
            if rowval.last() == Some(&r) && rowval.len() > colptr[colptr.len() - 1] {
                if let Some(last) = nzval.last_mut() {
                    *last += v;
                }
            } else {
                rowval.push(r);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }

    CscMatrix::new(rows.len(), ncols, colptr, rowval, nzval)
}

/// Upper triangle of `2 Q`, since Clarabel minimizes `½ xᵀ P x`.
fn objective_to_csc(problem: &QuadraticProgram) -> CscMatrix<f64> {
    let n = problem.num_variables();
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);

    if let Some(q) = problem.objective() {
        for j in 0..n {
            for i in 0..=j {
                let v = 2.0 * q[(i, j)];
                if v != 0.0 {
                    rowval.push(i);
                    nzval.push(v);
                }
            }
            colptr.push(rowval.len());
        }
    } else {
        colptr.extend(std::iter::repeat(0).take(n));
    }

    CscMatrix::new(n, n, colptr, rowval, nzval)
}

/// Maps a terminal Clarabel status onto an accepted status or an error.
pub(crate) fn classify_status(
    status: SolverStatus,
    iterations: u32,
    time_limit: Option<Duration>,
) -> MathResult<QpStatus> {
    match status {
        SolverStatus::Solved => Ok(QpStatus::Optimal),
        SolverStatus::AlmostSolved => Ok(QpStatus::AlmostOptimal),
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => Err(
            MathError::infeasible("solver certified the constraint set as primal infeasible"),
        ),
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => Err(
            MathError::numerical("objective is unbounded below; quadratic form is not PSD"),
        ),
        SolverStatus::MaxTime => Err(MathError::Timeout {
            limit: time_limit.unwrap_or_default(),
        }),
        SolverStatus::MaxIterations => Err(MathError::ConvergenceFailed { iterations }),
        other => Err(MathError::numerical(format!(
            "solver terminated with status {other:?}"
        ))),
    }
}

impl QpSolver for ClarabelSolver {
    fn solve(&self, problem: &QuadraticProgram) -> MathResult<QpSolution> {
        problem.validate()?;
        let n = problem.num_variables();

        let p = objective_to_csc(problem);
        let q = vec![0.0; n];
        let ConicRows {
            rows,
            b,
            zero,
            nonneg,
        } = conic_rows(problem);
        let a = rows_to_csc(&rows, n);

        let mut cones: Vec<SupportedConeT<f64>> = Vec::with_capacity(2);
        if zero > 0 {
            cones.push(SupportedConeT::ZeroConeT(zero));
        }
        if nonneg > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(nonneg));
        }

        let time_limit = self
            .settings
            .time_limit
            .map_or(f64::INFINITY, |d| d.as_secs_f64());
        let tol = self.settings.tolerance;
        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.settings.max_iterations)
            .time_limit(time_limit)
            .tol_gap_abs(tol)
            .tol_gap_rel(tol)
            .tol_feas(tol)
            .verbose(self.settings.verbose)
            .build()
            .map_err(|e| MathError::solver_failed(format!("invalid settings: {}", e)))?;

        debug!(
            variables = n,
            equalities = zero,
            inequalities = nonneg,
            "solving quadratic program"
        );

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
            .map_err(|e| MathError::solver_failed(format!("failed to create solver: {:?}", e)))?;
        solver.solve();

        let solution = &solver.solution;
        let status =
            classify_status(solution.status, solution.iterations, self.settings.time_limit)?;
        if status == QpStatus::AlmostOptimal {
            warn!(
                iterations = solution.iterations,
                "quadratic program solved to reduced accuracy"
            );
        }

        let values = solution.x.clone();
        if values.len() != n || values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::numerical("solver returned a non-finite solution"));
        }
        let objective_value = problem.objective_value(&values)?;

        Ok(QpSolution {
            values,
            objective_value,
            iterations: solution.iterations,
            solve_time: Duration::from_secs_f64(solution.solve_time.max(0.0)),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(SolverStatus::Solved, 10, None).unwrap(),
            QpStatus::Optimal
        );
        assert_eq!(
            classify_status(SolverStatus::AlmostSolved, 10, None).unwrap(),
            QpStatus::AlmostOptimal
        );
        assert!(matches!(
            classify_status(SolverStatus::PrimalInfeasible, 10, None),
            Err(MathError::Infeasible { .. })
        ));
        assert_eq!(
            classify_status(SolverStatus::MaxTime, 10, Some(Duration::from_secs(2))),
            Err(MathError::Timeout {
                limit: Duration::from_secs(2)
            })
        );
        assert_eq!(
            classify_status(SolverStatus::MaxIterations, 50, None),
            Err(MathError::ConvergenceFailed { iterations: 50 })
        );
        assert!(matches!(
            classify_status(SolverStatus::NumericalError, 3, None),
            Err(MathError::NumericalInstability { .. })
        ));
    }

    #[test]
    fn test_rows_to_csc_sums_duplicates() {
        let rows = vec![vec![(0, 1.0), (1, 2.0), (0, 3.0)], vec![(1, -1.0)]];
        let m = rows_to_csc(&rows, 2);
        assert_eq!(m.colptr, vec![0, 1, 3]);
        assert_eq!(m.rowval, vec![0, 0, 1]);
        assert_eq!(m.nzval, vec![4.0, 2.0, -1.0]);
    }

    #[test]
    fn test_conic_rows_layout() {
        let mut qp = QuadraticProgram::new();
        qp.add_variables(["a", "b"], -1.0, f64::INFINITY);
        qp.add_linear_constraint("ge", vec![(0, 1.0)], ConstraintSense::GreaterEqual, 0.2)
            .unwrap();
        qp.add_linear_constraint("eq", vec![(0, 1.0), (1, 1.0)], ConstraintSense::Equal, 0.0)
            .unwrap();

        let rows = conic_rows(&qp);
        assert_eq!(rows.zero, 1);
        // one GE row plus two finite lower bounds
        assert_eq!(rows.nonneg, 3);
        assert_eq!(rows.b, vec![0.0, -0.2, 1.0, 1.0]);
    }

    #[test]
    fn test_solve_equality_constrained() {
        // min a² + 2b² st a + b = 1  =>  a = 2/3, b = 1/3
        let mut qp = QuadraticProgram::new();
        let vars = qp.add_variables(["a", "b"], -10.0, 10.0);
        qp.add_linear_constraint(
            "sum",
            vars.map(|i| (i, 1.0)).collect(),
            ConstraintSense::Equal,
            1.0,
        )
        .unwrap();
        qp.set_quadratic_objective(DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]))
            .unwrap();

        let sol = ClarabelSolver::default().solve(&qp).unwrap();
        assert_relative_eq!(sol.values()[0], 2.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(sol.values()[1], 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(sol.objective_value, 2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_solve_active_bound() {
        // min a² + b² st a + b = 1, a <= 0.2  =>  a = 0.2, b = 0.8
        let mut qp = QuadraticProgram::new();
        qp.add_variables(["a", "b"], 0.0, 1.0);
        qp.set_bounds(0, 0.0, 0.2).unwrap();
        qp.add_linear_constraint("sum", vec![(0, 1.0), (1, 1.0)], ConstraintSense::Equal, 1.0)
            .unwrap();
        qp.set_quadratic_objective(DMatrix::identity(2, 2)).unwrap();

        let sol = ClarabelSolver::default().solve(&qp).unwrap();
        assert_relative_eq!(sol.values()[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(sol.values()[1], 0.8, epsilon = 1e-6);
        assert!(qp.max_violation(sol.values()) < 1e-6);
    }

    #[test]
    fn test_solve_infeasible() {
        let mut qp = QuadraticProgram::new();
        qp.add_variables(["a", "b"], -0.1, 0.1);
        qp.add_linear_constraint("sum", vec![(0, 1.0), (1, 1.0)], ConstraintSense::Equal, 1.0)
            .unwrap();
        qp.set_quadratic_objective(DMatrix::identity(2, 2)).unwrap();

        let err = ClarabelSolver::default().solve(&qp).unwrap_err();
        assert!(matches!(err, MathError::Infeasible { .. }));
    }
}
