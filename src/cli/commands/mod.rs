//! CLI command implementations.

mod code;
mod config;
mod doctor;
mod generate;
mod index;
mod init;
mod prompt;
mod search;
mod serve;

pub use code::run_code;
pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::run_generate;
pub use index::run_index;
pub use init::run_init;
pub use search::run_search;
pub use serve::run_serve;
