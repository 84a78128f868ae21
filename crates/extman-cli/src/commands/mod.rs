//! Command implementations for extman-cli

pub mod lifecycle;
pub mod registry;

pub use lifecycle::{run_disable, run_enable, run_install, run_move, run_uninstall};
pub use registry::{run_check, run_list, run_load_order};
