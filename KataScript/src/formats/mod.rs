//! File format handlers
//!
//! Only the bytecode script format is handled so far.

pub mod script;

pub use script::{Command, decode_script, dump_script, inject_script};
