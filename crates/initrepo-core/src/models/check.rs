/// Result of a single self-test check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass(String),
    /// Inconclusive; counted as passed but worth a look.
    Warn(String),
    Fail(String),
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        !matches!(self, CheckOutcome::Fail(_))
    }

    pub fn detail(&self) -> &str {
        match self {
            CheckOutcome::Pass(d) | CheckOutcome::Warn(d) | CheckOutcome::Fail(d) => d,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Pass(_) => "pass",
            CheckOutcome::Warn(_) => "warn",
            CheckOutcome::Fail(_) => "fail",
        }
    }
}
