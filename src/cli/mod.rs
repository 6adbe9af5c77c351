pub mod app;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod format;
pub mod inspect;
pub mod output;
pub mod report;

pub use app::run;
pub use env::CliArgs;
