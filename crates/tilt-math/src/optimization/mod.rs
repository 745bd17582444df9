//! Quadratic programming.
//!
//! Problems are described with [`QuadraticProgram`], which is independent
//! of any solver, and handed to a [`QpSolver`]. The default backend is
//! [`ClarabelSolver`], an interior-point conic solver.
//!
//! The objective is always `minimize xᵀ Q x` subject to bounded variables
//! and linear constraints.

mod clarabel_solver;

use std::ops::Range;
use std::time::Duration;

use nalgebra::DMatrix;

use crate::error::{MathError, MathResult};
use crate::linear_algebra::quadratic_form;

pub use clarabel_solver::ClarabelSolver;

/// Direction of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// `aᵀx <= rhs`
    LessEqual,
    /// `aᵀx >= rhs`
    GreaterEqual,
    /// `aᵀx == rhs`
    Equal,
}

/// A decision variable with box bounds.
///
/// Infinite bounds mean the side is free.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Name used in diagnostics.
    pub name: String,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// A sparse linear constraint over the problem's variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Name used in diagnostics.
    pub name: String,
    /// `(variable index, coefficient)` terms.
    pub terms: Vec<(usize, f64)>,
    /// Constraint direction.
    pub sense: ConstraintSense,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Evaluates `aᵀx`.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.terms.iter().map(|&(i, c)| c * x[i]).sum()
    }

    /// Amount by which `x` violates this constraint (0 when satisfied).
    pub fn violation(&self, x: &[f64]) -> f64 {
        let lhs = self.evaluate(x);
        match self.sense {
            ConstraintSense::LessEqual => (lhs - self.rhs).max(0.0),
            ConstraintSense::GreaterEqual => (self.rhs - lhs).max(0.0),
            ConstraintSense::Equal => (lhs - self.rhs).abs(),
        }
    }
}

/// A quadratic program `minimize xᵀ Q x` over bounded variables subject to
/// linear constraints.
///
/// # Example
///
/// ```rust
/// use nalgebra::DMatrix;
/// use tilt_math::optimization::{ConstraintSense, QuadraticProgram};
///
/// let mut qp = QuadraticProgram::new();
/// let vars = qp.add_variables(["x", "y"], -1.0, 1.0);
/// qp.add_linear_constraint(
///     "sum",
///     vars.map(|i| (i, 1.0)).collect(),
///     ConstraintSense::Equal,
///     0.0,
/// )
/// .unwrap();
/// qp.set_quadratic_objective(DMatrix::identity(2, 2)).unwrap();
/// assert_eq!(qp.num_variables(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuadraticProgram {
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: Option<DMatrix<f64>>,
}

impl QuadraticProgram {
    /// Creates an empty problem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one variable per name, all sharing the same bounds, and returns
    /// their index range.
    pub fn add_variables<I, S>(&mut self, names: I, lower: f64, upper: f64) -> Range<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = self.variables.len();
        self.variables
            .extend(names.into_iter().map(|name| Variable {
                name: name.into(),
                lower,
                upper,
            }));
        start..self.variables.len()
    }

    /// Overrides the bounds of an existing variable.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the index is out of range.
    pub fn set_bounds(&mut self, index: usize, lower: f64, upper: f64) -> MathResult<()> {
        let var = self
            .variables
            .get_mut(index)
            .ok_or_else(|| MathError::invalid_input(format!("no variable at index {index}")))?;
        var.lower = lower;
        var.upper = upper;
        Ok(())
    }

    /// Adds a linear constraint.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when a term refers to an unknown variable or a value
    /// is not finite.
    pub fn add_linear_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> MathResult<()> {
        let name = name.into();
        if let Some(&(i, _)) = terms.iter().find(|(i, _)| *i >= self.variables.len()) {
            return Err(MathError::invalid_input(format!(
                "constraint '{name}' references unknown variable {i}"
            )));
        }
        if !rhs.is_finite() || terms.iter().any(|(_, c)| !c.is_finite()) {
            return Err(MathError::invalid_input(format!(
                "constraint '{name}' has non-finite coefficients"
            )));
        }
        self.constraints.push(LinearConstraint {
            name,
            terms,
            sense,
            rhs,
        });
        Ok(())
    }

    /// Sets the objective matrix `Q` of `xᵀ Q x`.
    ///
    /// The matrix is symmetrized as `(Q + Qᵀ) / 2`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `Q` is not `n x n`, `InvalidInput` when it
    /// holds non-finite values.
    pub fn set_quadratic_objective(&mut self, q: DMatrix<f64>) -> MathResult<()> {
        let n = self.variables.len();
        if q.nrows() != n || q.ncols() != n {
            return Err(MathError::DimensionMismatch {
                rows1: q.nrows(),
                cols1: q.ncols(),
                rows2: n,
                cols2: n,
            });
        }
        if q.iter().any(|v| !v.is_finite()) {
            return Err(MathError::invalid_input("objective contains non-finite values"));
        }
        let symmetric = (&q + q.transpose()) * 0.5;
        self.objective = Some(symmetric);
        Ok(())
    }

    /// Number of decision variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// The decision variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The linear constraints.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// The objective matrix, if set.
    pub fn objective(&self) -> Option<&DMatrix<f64>> {
        self.objective.as_ref()
    }

    /// Evaluates `xᵀ Q x`, or 0 when no objective is set.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `x` has the wrong length.
    pub fn objective_value(&self, x: &[f64]) -> MathResult<f64> {
        match &self.objective {
            Some(q) => quadratic_form(x, q),
            None => Ok(0.0),
        }
    }

    /// Largest bound or constraint violation of `x`.
    pub fn max_violation(&self, x: &[f64]) -> f64 {
        let bounds = self
            .variables
            .iter()
            .zip(x)
            .map(|(v, &xi)| (v.lower - xi).max(xi - v.upper).max(0.0));
        let rows = self.constraints.iter().map(|c| c.violation(x));
        bounds.chain(rows).fold(0.0, f64::max)
    }

    /// Basic consistency checks run by solvers before building their own
    /// representation.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty problem, a missing objective, or a
    /// variable whose lower bound exceeds its upper bound.
    pub fn validate(&self) -> MathResult<()> {
        if self.variables.is_empty() {
            return Err(MathError::invalid_input("problem has no variables"));
        }
        if self.objective.is_none() {
            return Err(MathError::invalid_input("quadratic objective not set"));
        }
        if let Some(v) = self
            .variables
            .iter()
            .find(|v| v.lower > v.upper || v.lower.is_nan() || v.upper.is_nan())
        {
            return Err(MathError::infeasible(format!(
                "variable '{}' has bounds [{}, {}]",
                v.name, v.lower, v.upper
            )));
        }
        Ok(())
    }
}

/// Solver settings shared by backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QpSettings {
    /// Wall-clock limit; `None` means unlimited.
    pub time_limit: Option<Duration>,
    /// Maximum solver iterations.
    pub max_iterations: u32,
    /// Feasibility and optimality-gap tolerance.
    pub tolerance: f64,
    /// Print solver progress to stdout.
    pub verbose: bool,
}

impl Default for QpSettings {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_iterations: 200,
            tolerance: 1e-8,
            verbose: false,
        }
    }
}

impl QpSettings {
    /// Sets the time limit.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Quality of an accepted solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpStatus {
    /// Solved to the requested tolerance.
    Optimal,
    /// Solved to a reduced tolerance.
    AlmostOptimal,
}

/// Solution of a [`QuadraticProgram`].
#[derive(Debug, Clone, PartialEq)]
pub struct QpSolution {
    /// Optimal decision vector, in variable order.
    pub values: Vec<f64>,
    /// `xᵀ Q x` at the solution.
    pub objective_value: f64,
    /// Solver iterations.
    pub iterations: u32,
    /// Wall-clock solve time.
    pub solve_time: Duration,
    /// Solution quality.
    pub status: QpStatus,
}

impl QpSolution {
    /// The solution vector.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// A quadratic-program solver.
///
/// Implementations report failures through distinct error kinds:
/// `Infeasible`, `Timeout`, `ConvergenceFailed`, and `NumericalInstability`.
pub trait QpSolver {
    /// Solves the problem.
    fn solve(&self, problem: &QuadraticProgram) -> MathResult<QpSolution>;
}

impl<T: QpSolver + ?Sized> QpSolver for &T {
    fn solve(&self, problem: &QuadraticProgram) -> MathResult<QpSolution> {
        (**self).solve(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_var_problem() -> QuadraticProgram {
        let mut qp = QuadraticProgram::new();
        let vars = qp.add_variables(["a", "b"], -0.5, 0.5);
        qp.add_linear_constraint(
            "sum",
            vars.map(|i| (i, 1.0)).collect(),
            ConstraintSense::Equal,
            0.0,
        )
        .unwrap();
        qp.set_quadratic_objective(DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]))
            .unwrap();
        qp
    }

    #[test]
    fn test_build_problem() {
        let qp = two_var_problem();
        assert_eq!(qp.num_variables(), 2);
        assert_eq!(qp.constraints().len(), 1);
        assert!(qp.validate().is_ok());
        assert_relative_eq!(qp.objective_value(&[0.1, -0.1]).unwrap(), 0.03, epsilon = 1e-15);
    }

    #[test]
    fn test_objective_is_symmetrized() {
        let mut qp = QuadraticProgram::new();
        qp.add_variables(["a", "b"], 0.0, 1.0);
        qp.set_quadratic_objective(DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]))
            .unwrap();
        let q = qp.objective().unwrap();
        assert_relative_eq!(q[(0, 1)], 1.0);
        assert_relative_eq!(q[(1, 0)], 1.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut qp = QuadraticProgram::new();
        qp.add_variables(["a"], 0.0, 1.0);
        assert!(qp
            .add_linear_constraint("bad", vec![(3, 1.0)], ConstraintSense::Equal, 0.0)
            .is_err());
        assert!(qp.set_quadratic_objective(DMatrix::identity(2, 2)).is_err());
        assert!(qp.validate().is_err());

        qp.set_quadratic_objective(DMatrix::identity(1, 1)).unwrap();
        qp.set_bounds(0, 1.0, 0.0).unwrap();
        assert!(matches!(qp.validate(), Err(MathError::Infeasible { .. })));
    }

    #[test]
    fn test_max_violation() {
        let qp = two_var_problem();
        assert_relative_eq!(qp.max_violation(&[0.1, -0.1]), 0.0);
        // sum = 0.2 and a above its 0.5 bound by 0.2
        assert_relative_eq!(qp.max_violation(&[0.7, -0.5]), 0.2, epsilon = 1e-15);
    }
}
