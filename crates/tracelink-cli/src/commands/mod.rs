//! Command implementations.

pub mod analyze;
pub mod config;
pub mod decompose;
pub mod link;
pub mod run;

pub use self::analyze::execute_analyze;
pub use self::config::execute_config;
pub use self::decompose::execute_decompose;
pub use self::link::execute_link;
pub use self::run::execute_run;
