use std::collections::HashMap;
use std::path::{Path, PathBuf};

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use crate::license::restrictiveness::{restrictiveness, Restrictiveness};
use crate::models::LicenseResult;
use crate::rules::{Evaluation, Policy};

/// Render scan results as a summary box plus a full table.
pub fn render(results: &[LicenseResult], path: &Path, quiet: bool) {
    let total = results.len();
    let identified = results.iter().filter(|r| !r.findings.is_empty()).count();
    let missing = results.iter().filter(|r| r.license_path.is_none()).count();
    let unidentified = total - identified - missing;

    if quiet {
        println!(
            "Total: {}  Identified: {}  Unidentified: {}  Missing: {}",
            total,
            identified.to_string().green(),
            unidentified.to_string().yellow(),
            missing.to_string().red(),
        );
        return;
    }

    println!(
        "\n {} v{}",
        "license-bouncer".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Scanning: {}\n", path.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total dependencies : {}", total));
    println!(
        " │  {:<48} │",
        format!(
            "{}  Identified      : {:>4}  {}",
            "✓".green(),
            identified,
            summarize_licenses(results)
        )
    );
    println!(
        " │  {:<48} │",
        format!("{}  Unidentified    : {:>4}", "⚠".yellow(), unidentified)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Missing         : {:>4}", "✗".red(), missing)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if total > 0 {
        println!("{}", results_table(results.iter()));
    }
}

/// Print the active policy and, on failure, the results that broke it.
pub fn render_evaluation(policy: &Policy, evaluation: &Evaluation<'_>) {
    eprintln!("  {} {}", "→".cyan(), policy);
    eprintln!(
        "  {} {} matched, {} did not",
        "→".cyan(),
        evaluation.matched.len(),
        evaluation.mismatched.len()
    );
    if !evaluation.ignored.is_empty() {
        eprintln!(
            "  {} ignoring {} libraries",
            "→".cyan(),
            evaluation.ignored.len()
        );
    }

    if evaluation.passed {
        println!("{}", "Passed!".green().bold());
        return;
    }

    println!(
        " {} Dependencies violating the license policy:\n",
        "[ERROR]".red().bold()
    );
    println!("{}", results_table(evaluation.offending.iter().copied()));
}

/// Print license file candidates, closest first.
pub fn render_candidates(candidates: &[PathBuf]) {
    for (i, path) in candidates.iter().enumerate() {
        let marker = if i == 0 { "→".green() } else { " ".normal() };
        println!(" {} {}", marker, path.display());
    }
}

fn results_table<'a>(results: impl Iterator<Item = &'a LicenseResult>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Library").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Restrictiveness").add_attribute(Attribute::Bold),
            Cell::new("Location").add_attribute(Attribute::Bold),
        ]);

    for result in results {
        let license = if result.findings.is_empty() {
            "unknown".to_string()
        } else {
            result.license()
        };
        let level = restrictiveness(&result.license_types());
        let location = match (&result.url, &result.license_path) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => result
                .errors
                .first()
                .map(|e| e.kind.to_string())
                .unwrap_or_default(),
        };

        table.add_row(vec![
            Cell::new(&result.library),
            Cell::new(&result.version),
            Cell::new(license),
            Cell::new(level.to_string()).fg(level_color(level)),
            Cell::new(location),
        ]);
    }
    table
}

fn level_color(level: Restrictiveness) -> comfy_table::Color {
    use comfy_table::Color;
    match level {
        Restrictiveness::None => Color::DarkGrey,
        Restrictiveness::ShareLicense => Color::Green,
        Restrictiveness::ShareCode => Color::Yellow,
        Restrictiveness::Unknown => Color::Magenta,
        Restrictiveness::NotAllowed => Color::Red,
    }
}

/// The three most common licenses, e.g. `[MIT (12), Apache-2.0 (4)]`.
fn summarize_licenses(results: &[LicenseResult]) -> String {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for result in results.iter().filter(|r| !r.findings.is_empty()) {
        *counts.entry(result.license()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(String, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{} ({})", lic, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}
