use std::path::Path;
use std::process::ExitCode;

use comfy_table::{Cell, Color, Table};
use console::style;
use initrepo_core::config::Config;
use initrepo_core::models::check::CheckOutcome;
use initrepo_flow::SelfTest;
use initrepo_scaffold::SystemRunner;

pub async fn run(config_path: &Path) -> anyhow::Result<ExitCode> {
    let config = Config::load(config_path);
    let report = SelfTest::new(config, Box::new(SystemRunner::new()))
        .run()
        .await;

    let mut table = Table::new();
    table.set_header(vec!["CHECK", "RESULT", "DETAIL"]);
    for result in &report.results {
        let color = match result.outcome {
            CheckOutcome::Pass(_) => Color::Green,
            CheckOutcome::Warn(_) => Color::Yellow,
            CheckOutcome::Fail(_) => Color::Red,
        };
        table.add_row(vec![
            Cell::new(result.name),
            Cell::new(result.outcome.label()).fg(color),
            Cell::new(result.outcome.detail()),
        ]);
    }
    println!("{table}");

    let summary = format!("{}/{} checks passed", report.passed(), report.total());
    if report.all_passed() {
        println!("{} {summary}", style("✓").green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        let failed = report.total() - report.passed();
        println!("{} {summary} ({failed} failed)", style("✗").red().bold());
        Ok(ExitCode::FAILURE)
    }
}
