//! Formatted terminal output.
//!
//! Formatting lives here so the selectors stay free of presentation code and
//! output changes stay local.

use crate::report::SelectionReport;
use crate::select::CandidateScore;

/// Header plus one row per label.
pub fn format_run_summary(report: &SelectionReport) -> String {
    let mut out = String::new();
    let config = &report.config;

    out.push_str("=== hmmsel - HMM model-order selection ===\n");
    out.push_str(&format!("Selector: {}\n", report.selector.display_name()));
    out.push_str(&format!(
        "Candidates: {}..{} | constant={} | folds={} | seed={}\n",
        config.min_n_components, config.max_n_components, config.n_constant, config.fold_count, config.seed
    ));
    out.push('\n');

    out.push_str(&format!(
        "{:<16} {:>6} {:>8} {:>6} {:>14} {:<6}",
        "label", "seqs", "frames", "best", "score", "refit"
    ));
    out.push('\n');
    out.push_str(&format!("{:-<16} {:-<6} {:-<8} {:-<6} {:-<14} {:-<6}", "", "", "", "", "", ""));
    out.push('\n');

    for label in &report.labels {
        let best = if label.best_components == 0 {
            "-".to_string()
        } else {
            label.best_components.to_string()
        };
        let refit = if label.refit_ok { "ok" } else { "none" };
        let row = format!(
            "{:<16} {:>6} {:>8} {:>6} {:>14} {:<6}",
            truncate(&label.label, 16),
            label.n_sequences,
            label.n_frames,
            best,
            fmt_score(label.best_score),
            refit,
        );
        out.push_str(row.trim_end());
        out.push('\n');
    }

    let failed = report.no_valid_candidate_count();
    if failed > 0 {
        out.push_str(&format!("\n{failed} label(s) had no valid candidate.\n"));
    }
    out
}

/// Per-candidate scores of one label, best marked with `*`.
pub fn format_candidates(label: &str, best_components: usize, candidates: &[CandidateScore]) -> String {
    let mut out = format!("{label}:\n");
    for c in candidates {
        let chosen = if c.components == best_components { "*" } else { " " };
        out.push_str(&format!("{chosen} n={:<3} {}\n", c.components, fmt_score(c.score)));
    }
    out
}

fn fmt_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{s:.3}"),
        None => "invalid".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}
