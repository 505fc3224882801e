//! # Engine Module
//!
//! This module implements the conformer generation machinery of mkite-conformer:
//! configuration, error handling, progress reporting, the numerical optimizer,
//! distance-geometry embedding and the individual pipeline tasks.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Generation parameters, defaults and validation
//! - **Error Handling** ([`error`]) - Engine-level error taxonomy
//! - **Progress Monitoring** ([`progress`]) - Progress events and reporting callbacks
//! - **Optimization** ([`minimize`]) - BFGS minimizer shared by embedding and force-field refinement
//! - **Embedding** ([`embedding`]) - Distance bounds and 3D coordinate generation
//! - **Tasks** ([`tasks`]) - Embed, optimize, align, cluster and down-select steps
//!
//! The tasks are deterministic for a given seed: every conformer draws from its
//! own seeded generator, so the thread count does not change the result.

pub mod config;
pub mod embedding;
pub mod error;
pub mod minimize;
pub mod progress;
pub mod tasks;
