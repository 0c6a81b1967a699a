//! Command-line front end

pub mod args;
pub mod output;

pub use args::{parse_address, Args, MissingTarget};
pub use output::{format_line, FrameReport};
