pub mod artifact;
pub mod cli;
pub mod deployment;
pub mod node;
mod run;

pub use self::run::{run, start};
