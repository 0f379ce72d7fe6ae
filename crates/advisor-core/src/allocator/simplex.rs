//! Dense Two-Phase Simplex
//!
//! A small tableau simplex for the allocator's linear program: maximize
//! `c . x` subject to equality and `<=` constraints with `x >= 0`. Sized
//! for dozens of variables and a handful of constraints; no sparsity, no
//! presolve. Bland's rule keeps the pivot sequence finite.

const EPS: f64 = 1e-9;
const FEASIBILITY_TOL: f64 = 1e-7;
const MAX_ITERATIONS: usize = 1_000;

/// Direction of a single constraint row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `coefficients . x == rhs`
    Eq,
    /// `coefficients . x <= rhs`
    Le,
}

/// One constraint row of the program.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

/// A linear program in `maximize` form over non-negative variables.
#[derive(Clone, Debug)]
pub struct LinearProgram {
    pub objective: Vec<f64>,
    pub constraints: Vec<Constraint>,
}

/// An optimal vertex of the feasible region.
#[derive(Clone, Debug)]
pub struct Solution {
    pub variables: Vec<f64>,
    pub objective: f64,
}

/// Terminal state of the solve.
#[derive(Clone, Debug)]
pub enum SolveOutcome {
    Optimal(Solution),
    Infeasible,
    Unbounded,
    IterationLimit,
}

/// Row kind after normalizing every right-hand side to be non-negative.
#[derive(Clone, Copy, PartialEq, Eq)]
enum RowKind {
    /// `<=` with rhs >= 0: slack column enters the initial basis
    Slack,
    /// `>=` with rhs >= 0 (a flipped `<=`): surplus plus artificial
    SurplusArtificial,
    /// equality: artificial only
    Artificial,
}

struct Tableau {
    /// m rows of length ncols + 1; the last entry is the rhs
    rows: Vec<Vec<f64>>,
    /// basic variable index per row
    basis: Vec<usize>,
    /// marks artificial columns, which phase 2 must never re-enter
    artificial: Vec<bool>,
    ncols: usize,
}

enum PhaseEnd {
    Optimal,
    Unbounded,
    IterationLimit,
}

/// Maximize the program. Variable count must match every constraint row.
pub fn maximize(lp: &LinearProgram) -> SolveOutcome {
    let n = lp.objective.len();

    // Normalize rows so every rhs is non-negative.
    let mut normalized: Vec<(Vec<f64>, RowKind, f64)> = Vec::with_capacity(lp.constraints.len());
    for constraint in &lp.constraints {
        debug_assert_eq!(constraint.coefficients.len(), n);
        let mut coefficients = constraint.coefficients.clone();
        let mut rhs = constraint.rhs;
        let flipped = rhs < 0.0;
        if flipped {
            for c in &mut coefficients {
                *c = -*c;
            }
            rhs = -rhs;
        }
        let kind = match (constraint.op, flipped) {
            (ConstraintOp::Eq, _) => RowKind::Artificial,
            (ConstraintOp::Le, false) => RowKind::Slack,
            (ConstraintOp::Le, true) => RowKind::SurplusArtificial,
        };
        normalized.push((coefficients, kind, rhs));
    }

    let m = normalized.len();
    let slack_count = normalized
        .iter()
        .filter(|(_, kind, _)| *kind != RowKind::Artificial)
        .count();
    let art_count = normalized
        .iter()
        .filter(|(_, kind, _)| *kind != RowKind::Slack)
        .count();
    let ncols = n + slack_count + art_count;

    let mut tableau = Tableau {
        rows: Vec::with_capacity(m),
        basis: Vec::with_capacity(m),
        artificial: vec![false; ncols],
        ncols,
    };

    let mut next_slack = n;
    let mut next_art = n + slack_count;
    for (coefficients, kind, rhs) in &normalized {
        let mut row = vec![0.0; ncols + 1];
        row[..n].copy_from_slice(coefficients);
        row[ncols] = *rhs;
        match kind {
            RowKind::Slack => {
                row[next_slack] = 1.0;
                tableau.basis.push(next_slack);
                next_slack += 1;
            }
            RowKind::SurplusArtificial => {
                row[next_slack] = -1.0;
                next_slack += 1;
                row[next_art] = 1.0;
                tableau.artificial[next_art] = true;
                tableau.basis.push(next_art);
                next_art += 1;
            }
            RowKind::Artificial => {
                row[next_art] = 1.0;
                tableau.artificial[next_art] = true;
                tableau.basis.push(next_art);
                next_art += 1;
            }
        }
        tableau.rows.push(row);
    }

    // Phase 1: drive the artificial variables to zero.
    if art_count > 0 {
        let phase1_costs: Vec<f64> = (0..ncols)
            .map(|j| if tableau.artificial[j] { -1.0 } else { 0.0 })
            .collect();
        match run_phase(&mut tableau, &phase1_costs, true) {
            PhaseEnd::Optimal => {}
            // The phase-1 objective is bounded above by zero, but report
            // faithfully if numerics say otherwise.
            PhaseEnd::Unbounded => return SolveOutcome::Unbounded,
            PhaseEnd::IterationLimit => return SolveOutcome::IterationLimit,
        }

        let residual: f64 = tableau
            .basis
            .iter()
            .enumerate()
            .filter(|&(_, &b)| tableau.artificial[b])
            .map(|(i, _)| tableau.rows[i][ncols])
            .sum();
        if residual > FEASIBILITY_TOL {
            return SolveOutcome::Infeasible;
        }

        drive_out_artificials(&mut tableau);
    }

    // Phase 2: the real objective, artificial columns barred.
    let mut phase2_costs = vec![0.0; ncols];
    phase2_costs[..n].copy_from_slice(&lp.objective);
    match run_phase(&mut tableau, &phase2_costs, false) {
        PhaseEnd::Optimal => {}
        PhaseEnd::Unbounded => return SolveOutcome::Unbounded,
        PhaseEnd::IterationLimit => return SolveOutcome::IterationLimit,
    }

    let mut variables = vec![0.0; n];
    for (i, &b) in tableau.basis.iter().enumerate() {
        if b < n {
            variables[b] = tableau.rows[i][ncols].max(0.0);
        }
    }
    let objective = lp
        .objective
        .iter()
        .zip(&variables)
        .map(|(c, x)| c * x)
        .sum();

    SolveOutcome::Optimal(Solution { variables, objective })
}

/// Simplex iterations with Bland's rule until no reduced cost is positive.
fn run_phase(tableau: &mut Tableau, costs: &[f64], allow_artificial: bool) -> PhaseEnd {
    for _ in 0..MAX_ITERATIONS {
        let Some(entering) = entering_column(tableau, costs, allow_artificial) else {
            return PhaseEnd::Optimal;
        };
        let Some(leaving) = leaving_row(tableau, entering) else {
            return PhaseEnd::Unbounded;
        };
        pivot(tableau, leaving, entering);
    }
    PhaseEnd::IterationLimit
}

/// First column (Bland) with a positive reduced cost.
fn entering_column(tableau: &Tableau, costs: &[f64], allow_artificial: bool) -> Option<usize> {
    for j in 0..tableau.ncols {
        if !allow_artificial && tableau.artificial[j] {
            continue;
        }
        let mut reduced = costs[j];
        for (i, row) in tableau.rows.iter().enumerate() {
            reduced -= costs[tableau.basis[i]] * row[j];
        }
        if reduced > EPS {
            return Some(j);
        }
    }
    None
}

/// Minimum-ratio row, ties broken by the smallest basis index (Bland).
fn leaving_row(tableau: &Tableau, entering: usize) -> Option<usize> {
    let rhs_col = tableau.ncols;
    let mut leaving: Option<usize> = None;
    let mut best_ratio = f64::INFINITY;
    for (i, row) in tableau.rows.iter().enumerate() {
        let a = row[entering];
        if a > EPS {
            let ratio = row[rhs_col] / a;
            let tie = (ratio - best_ratio).abs() <= EPS
                && leaving.is_some_and(|l| tableau.basis[i] < tableau.basis[l]);
            if ratio < best_ratio - EPS || tie {
                best_ratio = ratio;
                leaving = Some(i);
            }
        }
    }
    leaving
}

fn pivot(tableau: &mut Tableau, leaving: usize, entering: usize) {
    let pivot_value = tableau.rows[leaving][entering];
    for value in &mut tableau.rows[leaving] {
        *value /= pivot_value;
    }
    let pivot_row = tableau.rows[leaving].clone();
    for (i, row) in tableau.rows.iter_mut().enumerate() {
        if i == leaving {
            continue;
        }
        let factor = row[entering];
        if factor.abs() > EPS {
            for (value, &p) in row.iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
        }
    }
    tableau.basis[leaving] = entering;
}

/// Pivot zero-valued basic artificials onto structural columns where
/// possible; a row with no such column is redundant and stays put.
fn drive_out_artificials(tableau: &mut Tableau) {
    for i in 0..tableau.rows.len() {
        if !tableau.artificial[tableau.basis[i]] {
            continue;
        }
        let replacement = (0..tableau.ncols)
            .find(|&j| !tableau.artificial[j] && tableau.rows[i][j].abs() > EPS);
        if let Some(j) = replacement {
            pivot(tableau, i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(objective: Vec<f64>, constraints: Vec<Constraint>) -> SolveOutcome {
        maximize(&LinearProgram { objective, constraints })
    }

    #[test]
    fn test_textbook_inequalities() {
        // max 3x + 2y s.t. x + y <= 4, x <= 2 -> x = 2, y = 2, obj 10
        let outcome = solve(
            vec![3.0, 2.0],
            vec![
                Constraint {
                    coefficients: vec![1.0, 1.0],
                    op: ConstraintOp::Le,
                    rhs: 4.0,
                },
                Constraint {
                    coefficients: vec![1.0, 0.0],
                    op: ConstraintOp::Le,
                    rhs: 2.0,
                },
            ],
        );
        let SolveOutcome::Optimal(solution) = outcome else {
            panic!("expected optimum");
        };
        assert!((solution.objective - 10.0).abs() < 1e-6);
        assert!((solution.variables[0] - 2.0).abs() < 1e-6);
        assert!((solution.variables[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_budget_equality_slack_risk() {
        // Allocation shape: weights sum to 1, risk cap not binding.
        let outcome = solve(
            vec![90.0, 60.0, 30.0],
            vec![
                Constraint {
                    coefficients: vec![1.0, 1.0, 1.0],
                    op: ConstraintOp::Eq,
                    rhs: 1.0,
                },
                Constraint {
                    coefficients: vec![10.0, 10.0, 10.0],
                    op: ConstraintOp::Le,
                    rhs: 60.0,
                },
            ],
        );
        let SolveOutcome::Optimal(solution) = outcome else {
            panic!("expected optimum");
        };
        assert!((solution.variables[0] - 1.0).abs() < 1e-6);
        assert!(solution.variables[1].abs() < 1e-6);
        assert!((solution.objective - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_binding_risk_constraint_splits_weights() {
        // max 100a + 10b, a + b = 1, 80a + 10b <= 45 -> a = b = 0.5
        let outcome = solve(
            vec![100.0, 10.0],
            vec![
                Constraint {
                    coefficients: vec![1.0, 1.0],
                    op: ConstraintOp::Eq,
                    rhs: 1.0,
                },
                Constraint {
                    coefficients: vec![80.0, 10.0],
                    op: ConstraintOp::Le,
                    rhs: 45.0,
                },
            ],
        );
        let SolveOutcome::Optimal(solution) = outcome else {
            panic!("expected optimum");
        };
        assert!((solution.variables[0] - 0.5).abs() < 1e-6);
        assert!((solution.variables[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_risk_ceiling() {
        // x = 1 forced, but 50x <= 30 cannot hold.
        let outcome = solve(
            vec![5.0],
            vec![
                Constraint {
                    coefficients: vec![1.0],
                    op: ConstraintOp::Eq,
                    rhs: 1.0,
                },
                Constraint {
                    coefficients: vec![50.0],
                    op: ConstraintOp::Le,
                    rhs: 30.0,
                },
            ],
        );
        assert!(matches!(outcome, SolveOutcome::Infeasible));
    }

    #[test]
    fn test_unbounded_program() {
        let outcome = solve(
            vec![1.0, 0.0],
            vec![Constraint {
                coefficients: vec![0.0, 1.0],
                op: ConstraintOp::Le,
                rhs: 1.0,
            }],
        );
        assert!(matches!(outcome, SolveOutcome::Unbounded));
    }

    #[test]
    fn test_negative_rhs_is_normalized() {
        // -x <= -2 is x >= 2; with x <= 5 the maximum of -x sits at x = 2.
        let outcome = solve(
            vec![-1.0],
            vec![
                Constraint {
                    coefficients: vec![-1.0],
                    op: ConstraintOp::Le,
                    rhs: -2.0,
                },
                Constraint {
                    coefficients: vec![1.0],
                    op: ConstraintOp::Le,
                    rhs: 5.0,
                },
            ],
        );
        let SolveOutcome::Optimal(solution) = outcome else {
            panic!("expected optimum");
        };
        assert!((solution.variables[0] - 2.0).abs() < 1e-6);
    }
}
