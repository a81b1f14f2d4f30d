pub mod cli;
pub mod common;
pub mod console;
pub mod task;
