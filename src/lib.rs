#![forbid(unsafe_code)]

pub mod cli;
pub mod client_rb;
pub mod commands;
pub mod error;
pub mod hints;
pub mod install;
pub mod knife;
