//! Library module for sqlstage
//!
//! This module exposes the CLI definitions and command implementations for
//! testing. The binary entry point is in main.rs.

pub mod cli;
pub mod commands;

pub use cli::{CheckArgs, Cli, Command, ConfigArgs, CopyArgs, GlobalArgs};
pub use commands::{
    CheckOutcome, CheckReport, CheckStatus, CopyPlan, assemble_request, check, copy,
    fill_missing_passwords,
};
