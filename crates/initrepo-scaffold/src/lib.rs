pub mod git_ops;
pub mod scaffold;
pub mod templates;

pub use git_ops::{CommandOutput, CommandRunner, SystemRunner};
pub use scaffold::{ScaffoldReport, ScaffoldStep, Scaffolder};
