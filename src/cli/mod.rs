//! CLI infrastructure for the chronoroute toolkit
//!
//! This module provides the command-line interface for running episodes,
//! batching simulations, and generating random duration matrices.

pub mod commands;
pub mod output;
