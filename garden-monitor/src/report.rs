//! Report rendering. Pure functions of a [`HealthReport`].

use crate::error::MonitorError;
use crate::models::HealthReport;

const BANNER_WIDTH: usize = 60;
const TITLE: &str = "GARDEN AUTOMATION SYSTEM HEALTH REPORT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub fn render(report: &HealthReport, format: ReportFormat) -> Result<String, MonitorError> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Fixed-width banner, one `NAME: STATUS` line per category and one indented
/// line per item.
pub fn render_text(report: &HealthReport) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut lines = vec![
        banner.clone(),
        TITLE.to_string(),
        banner.clone(),
        format!("Timestamp: {}", report.timestamp.to_rfc3339()),
        format!("Overall Status: {}", report.overall_status),
        String::new(),
    ];

    for check in &report.checks {
        lines.push(format!("{}: {}", check.category.as_str().to_uppercase(), check.status));
        lines.extend(check.items.iter().map(|(id, item)| format!("  - {}: {}", id, item.status)));
        lines.push(String::new());
    }

    lines.push(banner);
    lines.join("\n")
}
