use labeler_core::analyzer::LabelCount;
use labeler_core::pipeline::RunSummary;

pub fn summary_json(summary: &RunSummary, output: &str) -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "output": output,
        "discovered": summary.discovered,
        "written": summary.written,
        "failed": summary.failed,
        "write_failed": summary.write_failed,
    })
}

pub fn summary_text(summary: &RunSummary, output: &str) -> String {
    let mut line = format!(
        "label: discovered {}, written {}, failed {} -> {}",
        summary.discovered, summary.written, summary.failed, output
    );
    if summary.write_failed > 0 {
        line.push_str(&format!(" ({} write errors)", summary.write_failed));
    }
    line
}

/// Keeps the first `top` entries; `None` keeps all.
pub fn limit(counts: &[LabelCount], top: Option<usize>) -> &[LabelCount] {
    match top {
        Some(n) if n < counts.len() => &counts[..n],
        _ => counts,
    }
}

pub fn counts_text(counts: &[LabelCount]) -> String {
    let width = counts.iter().map(|c| c.label.len()).max().unwrap_or(0);
    counts
        .iter()
        .map(|c| format!("{:<width$}  {}", c.label, c.count, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn counts_json(counts: &[LabelCount]) -> serde_json::Value {
    serde_json::json!(counts)
}
