use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::model::{Forestry, IndicatorKind, Period, SectionId};
use crate::scoring::ScoreClass;
use crate::store::{IndicatorScore, RankedForestry};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Two decimals, never "-0.00".
pub fn format_score(score: f64) -> String {
    if score == 0.0 {
        "0.00".to_string()
    } else {
        format!("{:.2}", score)
    }
}

fn paint_score(text: &str, class: ScoreClass, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match class {
        ScoreClass::Penalty => text.red().to_string(),
        ScoreClass::Positive => text.green().to_string(),
        ScoreClass::Neutral => text.dimmed().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format the ranking as a table with columns: Index, Total, Name, Id
/// Index column: 3 chars (fits "99."), right-aligned
/// Total column is right-aligned, 9 chars wide (fits "-99999.99")
pub fn format_ranking_table(ranked: &[RankedForestry], period: Period, use_colors: bool) -> String {
    if ranked.is_empty() {
        return format!("No forestries to rate for {}.", period);
    }

    let term_width = get_terminal_width();
    let index_width = 3;
    let total_width = 9;
    let separator = "  ";

    ranked
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let index_str = format!("{:>2}.", idx + 1);
            let total_str = format!("{:>width$}", format_score(entry.total), width = total_width);
            let id_str = format!("#{}", entry.forestry.id);

            let fixed_width = index_width + 1 + total_width + separator.len() * 2 + id_str.len();
            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&entry.forestry.name, width - fixed_width)
                }
                Some(_) => truncate_name(&entry.forestry.name, 20),
                None => entry.forestry.name.clone(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    paint_score(&total_str, ScoreClass::of(entry.total), true).bold(),
                    separator,
                    name,
                    separator,
                    id_str.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, total_str, separator, name, separator, id_str
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a forestry's per-indicator scores grouped by section, with the
/// total on the last line.
pub fn format_breakdown(
    forestry: &Forestry,
    period: Period,
    rows: &[IndicatorScore],
    total: &str,
    use_colors: bool,
) -> String {
    let mut lines = Vec::new();
    let header = format!("{} (#{}), {}", forestry.name, forestry.id, period);
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    if rows.is_empty() {
        lines.push("  No active indicators.".to_string());
    }

    let mut current_section: Option<SectionId> = None;
    for row in rows {
        if current_section != Some(row.indicator.section_id) {
            current_section = Some(row.indicator.section_id);
            let section_name = row
                .section
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("Section {}", row.indicator.section_id));
            lines.push(String::new());
            lines.push(if use_colors {
                section_name.underline().to_string()
            } else {
                section_name
            });
        }

        let unit = row.indicator.unit.as_deref().unwrap_or("");
        let value = format!("{} {}", row.value, unit);
        let score = format!("{:>9}", format_score(row.score));
        let name = match row.indicator.kind {
            IndicatorKind::Normal => row.indicator.name.clone(),
            kind => format!("{} [{}]", row.indicator.name, kind.as_str()),
        };
        lines.push(format!(
            "  {:>4}  {}  {:<16}{}",
            row.indicator.id,
            paint_score(&score, row.class, use_colors),
            value.trim_end(),
            name
        ));
    }

    lines.push(String::new());
    lines.push(format!("Total: {}", total));
    lines.join("\n")
}

/// Format the ranking as tab-separated values for scripting
/// Columns: rank, id, name, total (no headers, no colors)
pub fn format_tsv(ranked: &[RankedForestry]) -> String {
    ranked
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            format!(
                "{}\t{}\t{}\t{}",
                idx + 1,
                entry.forestry.id,
                entry.forestry.name,
                format_score(entry.total)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Indicator, Section};

    fn forestry(id: i64, name: &str) -> Forestry {
        Forestry {
            id,
            name: name.to_string(),
        }
    }

    fn period() -> Period {
        Period::new(2024, 1).unwrap()
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(10.0), "10.00");
        assert_eq!(format_score(-3.0), "-3.00");
        assert_eq!(format_score(3.333), "3.33");
        assert_eq!(format_score(-0.0), "0.00");
    }

    #[test]
    fn test_truncate_name_short() {
        assert_eq!(truncate_name("Short name", 20), "Short name");
    }

    #[test]
    fn test_truncate_name_long() {
        assert_eq!(truncate_name("Northern District Forestry", 15), "Northern Dis...");
    }

    #[test]
    fn test_truncate_name_unicode() {
        assert_eq!(truncate_name("Лесничество Северное", 10), "Лесниче...");
    }

    #[test]
    fn test_truncate_name_very_narrow() {
        assert_eq!(truncate_name("Hello world", 3), "Hel");
    }

    #[test]
    fn test_ranking_table_empty() {
        assert_eq!(format_ranking_table(&[], period(), false), "No forestries to rate for 2024-01.");
    }

    #[test]
    fn test_ranking_table_rows() {
        let a = forestry(1, "Northern");
        let b = forestry(2, "Southern");
        let ranked = vec![
            RankedForestry { forestry: &b, total: 10.0 },
            RankedForestry { forestry: &a, total: -2.5 },
        ];
        let result = format_ranking_table(&ranked, period(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 1."));
        assert!(lines[0].contains("10.00"));
        assert!(lines[0].contains("Southern"));
        assert!(lines[0].ends_with("#2"));
        assert!(lines[1].contains("-2.50"));
    }

    #[test]
    fn test_tsv() {
        let a = forestry(1, "Northern");
        let ranked = vec![RankedForestry { forestry: &a, total: 5.0 }];
        assert_eq!(format_tsv(&ranked), "1\t1\tNorthern\t5.00");
        assert_eq!(format_tsv(&[]), "");
    }

    #[test]
    fn test_breakdown_groups_by_section() {
        let f = forestry(1, "Northern");
        let section = Section {
            id: 3,
            name: "Silviculture".to_string(),
            description: None,
            sort_order: 1,
        };
        let indicator = Indicator {
            id: 11,
            section_id: 3,
            name: "Reforestation".to_string(),
            max_weight: 10.0,
            unit: Some("ha".to_string()),
            description: None,
            kind: IndicatorKind::Normal,
            is_active: true,
        };
        let rows = vec![IndicatorScore {
            section: Some(&section),
            indicator: &indicator,
            value: 50.0,
            score: 5.0,
            class: ScoreClass::Positive,
        }];

        let result = format_breakdown(&f, period(), &rows, "5.00", false);
        assert!(result.starts_with("Northern (#1), 2024-01"));
        assert!(result.contains("Silviculture"));
        assert!(result.contains("50 ha"));
        assert!(result.contains("5.00"));
        assert!(result.contains("Reforestation"));
        assert!(!result.contains("[normal]"));
        assert!(result.ends_with("Total: 5.00"));
    }

    #[test]
    fn test_breakdown_marks_penalty_indicators() {
        let f = forestry(1, "Northern");
        let indicator = Indicator {
            id: 12,
            section_id: 3,
            name: "Fire violations".to_string(),
            max_weight: 5.0,
            unit: None,
            description: None,
            kind: IndicatorKind::Penalty,
            is_active: true,
        };
        let rows = vec![IndicatorScore {
            section: None,
            indicator: &indicator,
            value: 2.0,
            score: -2.0,
            class: ScoreClass::Penalty,
        }];

        let result = format_breakdown(&f, period(), &rows, "-2.00", false);
        assert!(result.contains("Section 3"));
        assert!(result.contains("Fire violations [penalty]"));
    }

    #[test]
    fn test_breakdown_empty() {
        let f = forestry(1, "Northern");
        let result = format_breakdown(&f, period(), &[], "0.00", false);
        assert!(result.contains("No active indicators."));
    }
}
