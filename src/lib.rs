//! Duty rota allocation engine
//!
//! Employees bid on the duties they would like to work on each shift
//! category (early, late, night). Over a rotation of as many weeks as there
//! are shift categories, every employee works one duty/shift slot per week
//! and every shift category exactly once. The engine finds the assignment
//! that honours the greatest total bid weight, re-checks it, and reports
//! each employee's bid satisfaction with an audit trace of the run.
//!
//! [`allocation::allocate`] runs the whole pipeline; [`api::create_router`]
//! serves it over HTTP.

#![warn(missing_docs)]

pub mod allocation;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod solver;
