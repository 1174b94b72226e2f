//! CLI Commands

pub mod inbox;
pub mod run;
