//! Constraint model construction.
//!
//! Turns a [`RotationIndex`] into a 0-1 linear program over decision
//! variables `x[e, d, s, w]`, meaning employee `e` works duty `d` on shift
//! category `s` in week `w`:
//!
//! - maximise the sum of `bid_weight(e, d, s) * x[e, d, s, w]`
//! - `sum over d, s of x[e, d, s, w] = 1` for every employee and week
//! - `sum over d, w of x[e, d, s, w] = 1` for every employee and shift
//! - `sum over e of x[e, d, s, w] <= 1` for every duty, shift and week
//!
//! When the employees exactly fill every slot, the last family is tight and
//! is emitted as an equality.

use rust_decimal::Decimal;
use thiserror::Error;

use super::validation::RotationIndex;

/// Why a rotation can never be filled, detected before solving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralMismatch {
    /// Employee count differs from duty/shift slots per week.
    #[error("{employees} employees cannot fill {slots} duty/shift slots per week exactly")]
    SlotCount {
        /// Number of employees.
        employees: usize,
        /// Duties times shift categories.
        slots: usize,
    },
    /// Week count differs from the number of shift categories.
    #[error("{weeks} rotation weeks cannot cover {shifts} shift categories once each")]
    WeekCount {
        /// Number of rotation weeks.
        weeks: usize,
        /// Number of active shift categories.
        shifts: usize,
    },
}

/// Dimensions of the variable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    /// Employees.
    pub employees: usize,
    /// Duties.
    pub duties: usize,
    /// Shift categories.
    pub shifts: usize,
    /// Weeks.
    pub weeks: usize,
}

/// Dense coordinates of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarKey {
    /// Employee position.
    pub employee: usize,
    /// Duty position.
    pub duty: usize,
    /// Shift position.
    pub shift: usize,
    /// Week position.
    pub week: usize,
}

impl ModelShape {
    /// Total number of decision variables.
    pub fn variable_count(&self) -> usize {
        self.employees * self.duties * self.shifts * self.weeks
    }

    /// Duty/shift slots available in each week.
    pub fn slots_per_week(&self) -> usize {
        self.duties * self.shifts
    }

    /// Flat index of `x[employee, duty, shift, week]`.
    pub fn var_index(&self, employee: usize, duty: usize, shift: usize, week: usize) -> usize {
        ((employee * self.duties + duty) * self.shifts + shift) * self.weeks + week
    }

    /// Inverse of [`ModelShape::var_index`].
    pub fn decode(&self, index: usize) -> VarKey {
        let week = index % self.weeks;
        let rest = index / self.weeks;
        let shift = rest % self.shifts;
        let rest = rest / self.shifts;
        VarKey {
            employee: rest / self.duties,
            duty: rest % self.duties,
            shift,
            week,
        }
    }

    /// Checks the slot counts a rotation needs.
    ///
    /// Each employee works exactly one slot per week and each shift exactly
    /// once, so weeks must equal shift categories. A rotation also staffs
    /// every duty slot in every week, so employees must equal duties times
    /// shift categories.
    pub fn check_compatible(&self) -> Result<(), StructuralMismatch> {
        if self.weeks != self.shifts {
            return Err(StructuralMismatch::WeekCount {
                weeks: self.weeks,
                shifts: self.shifts,
            });
        }
        if self.employees != self.slots_per_week() {
            return Err(StructuralMismatch::SlotCount {
                employees: self.employees,
                slots: self.slots_per_week(),
            });
        }
        Ok(())
    }
}

/// The three hard constraint families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintFamily {
    /// One slot per employee per week.
    EmployeeWeek,
    /// Each shift category once per employee.
    EmployeeShift,
    /// At most one employee per duty, shift and week.
    SlotOccupancy,
}

/// Comparison of a constraint's left-hand side with its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// `lhs == rhs`
    Equal,
    /// `lhs <= rhs`
    AtMost,
}

/// A constraint `sum of x[terms] (sense) rhs` with unit coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    /// Readable name, e.g. `employee_emp_001_week_1`.
    pub name: String,
    /// The family it belongs to.
    pub family: ConstraintFamily,
    /// Indices of the variables summed.
    pub terms: Vec<usize>,
    /// Comparison sense.
    pub sense: ConstraintSense,
    /// Right-hand side.
    pub rhs: u32,
}

impl LinearConstraint {
    /// Left-hand side under an assignment.
    pub fn lhs(&self, assignment: &[bool]) -> u32 {
        self.terms.iter().filter(|&&t| assignment[t]).count() as u32
    }

    /// True when the assignment meets this constraint.
    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        let lhs = self.lhs(assignment);
        match self.sense {
            ConstraintSense::Equal => lhs == self.rhs,
            ConstraintSense::AtMost => lhs <= self.rhs,
        }
    }
}

/// A built 0-1 allocation model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationModel {
    name: String,
    shape: ModelShape,
    objective: Vec<Decimal>,
    constraints: Vec<LinearConstraint>,
}

impl AllocationModel {
    /// Assembles a model from parts. Solver tests use this to feed shapes
    /// the builder would never produce.
    pub fn from_parts(
        name: impl Into<String>,
        shape: ModelShape,
        objective: Vec<Decimal>,
        constraints: Vec<LinearConstraint>,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            objective,
            constraints,
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variable grid dimensions.
    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    /// Number of decision variables.
    pub fn variable_count(&self) -> usize {
        self.objective.len()
    }

    /// Objective coefficients, indexed by variable.
    pub fn objective(&self) -> &[Decimal] {
        &self.objective
    }

    /// All constraints.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Constraints of one family.
    pub fn constraints_of(
        &self,
        family: ConstraintFamily,
    ) -> impl Iterator<Item = &LinearConstraint> + '_ {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    /// Objective value of an assignment.
    pub fn objective_value(&self, assignment: &[bool]) -> Decimal {
        self.objective
            .iter()
            .zip(assignment)
            .filter(|(_, on)| **on)
            .map(|(c, _)| *c)
            .sum()
    }

    /// Constraints the assignment breaks.
    pub fn violated_constraints<'a>(&'a self, assignment: &[bool]) -> Vec<&'a LinearConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied_by(assignment))
            .collect()
    }
}

/// Builds an [`AllocationModel`] from a validated index.
///
/// # Example
///
/// ```
/// use rota_engine::allocation::{ModelBuilder, validate_input};
/// use rota_engine::config::BidWeights;
/// use rota_engine::models::*;
///
/// let input = AllocationInput {
///     employees: vec![Employee::new("emp_001", "Samuel Brown")],
///     duties: vec![Duty::new("sorting", "Mail Sorting")],
///     shifts: vec![Shift::new(ShiftCategory::Early)],
///     weeks: RotationWeek::sequence(1),
///     bids: vec![Bid::new("emp_001", ShiftCategory::Early, "sorting")],
/// };
/// let index = validate_input(&input, &BidWeights::default()).unwrap();
///
/// let model = ModelBuilder::new(&index).build().unwrap();
/// assert_eq!(model.variable_count(), 1);
/// assert_eq!(model.constraints().len(), 3);
/// ```
#[derive(Debug)]
pub struct ModelBuilder<'a> {
    index: &'a RotationIndex,
    name: String,
}

impl<'a> ModelBuilder<'a> {
    /// Creates a builder over a validated index.
    pub fn new(index: &'a RotationIndex) -> Self {
        Self {
            index,
            name: "rota_allocation".to_string(),
        }
    }

    /// Sets the model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the model, or reports why no rotation can fit.
    pub fn build(&self) -> Result<AllocationModel, StructuralMismatch> {
        let index = self.index;
        let shape = ModelShape {
            employees: index.employee_count(),
            duties: index.duty_count(),
            shifts: index.shift_count(),
            weeks: index.week_count(),
        };
        shape.check_compatible()?;

        Ok(AllocationModel {
            name: self.name.clone(),
            shape,
            objective: self.objective(shape),
            constraints: self.constraints(shape),
        })
    }

    fn objective(&self, shape: ModelShape) -> Vec<Decimal> {
        let mut objective = vec![Decimal::ZERO; shape.variable_count()];
        for e in 0..shape.employees {
            for s in 0..shape.shifts {
                for pref in self.index.preferences(e, s) {
                    for w in 0..shape.weeks {
                        objective[shape.var_index(e, pref.duty, s, w)] = pref.weight;
                    }
                }
            }
        }
        objective
    }

    fn constraints(&self, shape: ModelShape) -> Vec<LinearConstraint> {
        let index = self.index;
        let mut constraints = Vec::with_capacity(
            shape.employees * (shape.weeks + shape.shifts)
                + shape.duties * shape.shifts * shape.weeks,
        );

        for e in 0..shape.employees {
            for w in 0..shape.weeks {
                let terms = (0..shape.duties)
                    .flat_map(|d| (0..shape.shifts).map(move |s| shape.var_index(e, d, s, w)))
                    .collect();
                constraints.push(LinearConstraint {
                    name: format!("employee_{}_week_{}", index.employee_id(e), index.week(w)),
                    family: ConstraintFamily::EmployeeWeek,
                    terms,
                    sense: ConstraintSense::Equal,
                    rhs: 1,
                });
            }
        }

        for e in 0..shape.employees {
            for s in 0..shape.shifts {
                let terms = (0..shape.duties)
                    .flat_map(|d| (0..shape.weeks).map(move |w| shape.var_index(e, d, s, w)))
                    .collect();
                constraints.push(LinearConstraint {
                    name: format!("employee_{}_shift_{}", index.employee_id(e), index.shift(s)),
                    family: ConstraintFamily::EmployeeShift,
                    terms,
                    sense: ConstraintSense::Equal,
                    rhs: 1,
                });
            }
        }

        // check_compatible has ensured E == D·S: every slot is filled.
        for d in 0..shape.duties {
            for s in 0..shape.shifts {
                for w in 0..shape.weeks {
                    let terms = (0..shape.employees)
                        .map(|e| shape.var_index(e, d, s, w))
                        .collect();
                    constraints.push(LinearConstraint {
                        name: format!(
                            "duty_{}_shift_{}_week_{}",
                            index.duty_id(d),
                            index.shift(s),
                            index.week(w)
                        ),
                        family: ConstraintFamily::SlotOccupancy,
                        terms,
                        sense: ConstraintSense::Equal,
                        rhs: 1,
                    });
                }
            }
        }

        constraints
    }
}

/// Builds the model with default settings.
pub fn build_model(index: &RotationIndex) -> Result<AllocationModel, StructuralMismatch> {
    ModelBuilder::new(index).build()
}

/// Rotation constraints over a bare shape, for solver tests that need
/// models the builder refuses to produce.
#[cfg(test)]
pub(crate) fn rotation_model(
    shape: ModelShape,
    objective: Vec<Decimal>,
    occupancy: ConstraintSense,
) -> AllocationModel {
    let row = |name: String, family, terms: Vec<usize>, sense| LinearConstraint {
        name,
        family,
        terms,
        sense,
        rhs: 1,
    };
    let mut constraints = Vec::new();
    for e in 0..shape.employees {
        for w in 0..shape.weeks {
            let terms = (0..shape.duties)
                .flat_map(|d| (0..shape.shifts).map(move |s| shape.var_index(e, d, s, w)))
                .collect();
            constraints.push(row(
                format!("ew_{}_{}", e, w),
                ConstraintFamily::EmployeeWeek,
                terms,
                ConstraintSense::Equal,
            ));
        }
        for s in 0..shape.shifts {
            let terms = (0..shape.duties)
                .flat_map(|d| (0..shape.weeks).map(move |w| shape.var_index(e, d, s, w)))
                .collect();
            constraints.push(row(
                format!("es_{}_{}", e, s),
                ConstraintFamily::EmployeeShift,
                terms,
                ConstraintSense::Equal,
            ));
        }
    }
    for d in 0..shape.duties {
        for s in 0..shape.shifts {
            for w in 0..shape.weeks {
                let terms = (0..shape.employees)
                    .map(|e| shape.var_index(e, d, s, w))
                    .collect();
                constraints.push(row(
                    format!("dsw_{}_{}_{}", d, s, w),
                    ConstraintFamily::SlotOccupancy,
                    terms,
                    occupancy,
                ));
            }
        }
    }
    AllocationModel::from_parts("rotation", shape, objective, constraints)
}
