//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod list;
mod process;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use list::run_list;
pub use process::run_process;
pub use serve::run_serve;
