pub mod orchestrator;
pub mod selftest;

pub use orchestrator::{InitFlow, InitOutcome};
pub use selftest::{CheckResult, SelfTest, SelfTestReport};
