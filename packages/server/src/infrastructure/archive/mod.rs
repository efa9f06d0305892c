//! DocumentArchiver 実装

mod logging;

pub use logging::LoggingArchiver;
