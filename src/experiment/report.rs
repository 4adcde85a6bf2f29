//! Rendering of experiment result tables.

use std::fmt::Write;

use serde::Serialize;

use super::arl::{EwmaArlRow, ShewhartArlRow};

/// Fixed-width text table of Shewhart results.
pub fn shewhart_table(rows: &[ShewhartArlRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>8} {:>14} {:>16} {:>20} {:>9}",
        "Delta", "Empirical ARL", "Theoretical ARL", "Theoretical RL Stdev", "Censored"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>8.2} {:>14} {:>16.4} {:>20.4} {:>9}",
            row.delta,
            format_arl(row.empirical_arl),
            row.theoretical_arl,
            row.theoretical_rl_stdev,
            row.censored_trials
        );
    }
    out
}

/// Fixed-width text table of EWMA results.
pub fn ewma_table(rows: &[EwmaArlRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>8} {:>7} {:>7} {:>14} {:>9}",
        "Delta", "L", "Lambda", "Empirical ARL", "Censored"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>8.2} {:>7.3} {:>7.2} {:>14} {:>9}",
            row.delta,
            row.l_factor,
            row.lambda,
            format_arl(row.empirical_arl),
            row.censored_trials
        );
    }
    out
}

/// Pretty-printed JSON array of result rows.
pub fn to_json<T: Serialize>(rows: &[T]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}

/// Empirical ARL cell; `-` when every trial was censored.
fn format_arl(arl: Option<f64>) -> String {
    arl.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shewhart_rows() -> Vec<ShewhartArlRow> {
        vec![
            ShewhartArlRow {
                delta: 0.0,
                empirical_arl: None,
                theoretical_arl: 370.398,
                theoretical_rl_stdev: 369.898,
                censored_trials: 10,
            },
            ShewhartArlRow {
                delta: 2.0,
                empirical_arl: Some(6.25),
                theoretical_arl: 6.3,
                theoretical_rl_stdev: 5.78,
                censored_trials: 0,
            },
        ]
    }

    #[test]
    fn test_shewhart_table_layout() {
        let table = shewhart_table(&shewhart_rows());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Theoretical RL Stdev"));
        assert!(lines[1].contains(" - "), "censored row shows a dash: {}", lines[1]);
        assert!(lines[1].contains("370.3980"));
        assert!(lines[2].contains("6.2500"));
        assert_eq!(lines[1].len(), lines[0].len());
    }

    #[test]
    fn test_ewma_table_layout() {
        let rows = vec![EwmaArlRow {
            delta: 0.5,
            l_factor: 3.054,
            lambda: 0.4,
            empirical_arl: Some(-3.5),
            censored_trials: 2,
        }];
        let table = ewma_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("3.054"));
        assert!(lines[1].contains("0.40"));
        assert!(lines[1].contains("-3.5000"));
    }

    #[test]
    fn test_unbounded_theoretical_arl_rendered_as_inf() {
        let rows = vec![ShewhartArlRow {
            delta: 0.0,
            empirical_arl: None,
            theoretical_arl: f64::INFINITY,
            theoretical_rl_stdev: f64::INFINITY,
            censored_trials: 3,
        }];
        let table = shewhart_table(&rows);
        let line = table.lines().nth(1).expect("data row");
        assert!(line.contains("inf"), "{line}");

        let json = to_json(&rows).expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(value[0]["empirical_arl"].is_null());
        assert_eq!(value[0]["theoretical_arl"], "inf");
        assert_eq!(value[0]["theoretical_rl_stdev"], "inf");
    }

    #[test]
    fn test_json_marks_censored_as_null() {
        let json = to_json(&shewhart_rows()).expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(value[0]["empirical_arl"].is_null());
        assert_eq!(value[1]["empirical_arl"], 6.25);
        assert_eq!(value[0]["censored_trials"], 10);
    }
}
