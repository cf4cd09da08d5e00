//! Text (terminal) reporter

use super::EngineReport;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Render reports as one line per engine, with a timing line when measured
pub fn render(reports: &[EngineReport], color: bool) -> String {
    let (bold, dim, reset) = if color {
        (BOLD, DIM, RESET)
    } else {
        ("", "", "")
    };

    let mut out = String::new();
    for report in reports {
        let vertices: Vec<String> = report.vertices.iter().map(|v| v.to_string()).collect();
        out.push_str(&format!(
            "{bold}[{}]{reset} density {bold}{:.6}{reset} vertices [{}]\n",
            report.engine.to_uppercase(),
            report.score,
            vertices.join(", ")
        ));
        if let Some(ms) = report.elapsed_ms {
            out.push_str(&format!(
                "{dim}  {} took {:.3} ms ({} vertices){reset}\n",
                report.engine,
                ms,
                report.vertices.len()
            ));
        }
    }
    out
}
