// The shell's side: configuration and the board file that owns every record

pub mod board;
pub mod config;

pub use board::*;
pub use config::*;
