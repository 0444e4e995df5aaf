//! # gavel-core
//!
//! Core types shared across the gavel workspace:
//!
//! - [`ChatMessage`] / [`Role`]: role-tagged turns sent to the grader
//! - [`EvalRow`]: one dataset record (question, answer, context, covariates)
//! - [`ScoreRecord`] / [`PairStatus`]: the per-(row, metric) evaluation outcome
//! - [`stats`]: fairness and calibration statistics used as prompt covariates

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod messages;
pub mod record;
pub mod row;
pub mod stats;

pub use messages::{ChatMessage, Role};
pub use record::{PairStatus, ScoreRecord};
pub use row::EvalRow;
