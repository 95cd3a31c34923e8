//! hwatm: FMECA / ATM coverage reconciliation
//!
//! Boards carry two uploaded sheets, a failure-mode analysis (FMECA) and a
//! test-coverage sheet. The [`analysis`] pipelines cross-reference their
//! reference designators; [`core`] holds the tables, the document store and
//! user accounts; [`cli`] is the `hwatm` command line.

pub mod analysis;
pub mod cli;
pub mod core;
