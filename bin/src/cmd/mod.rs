//! CLI subcommand modules.
//!
//! This module contains the implementations for all faro CLI subcommands.

pub(crate) mod decompose;
pub(crate) mod report;
pub(crate) mod run;
pub(crate) mod simulate;
