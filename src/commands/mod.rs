pub mod config;
pub mod hints;
pub mod install;
pub mod nodes;
