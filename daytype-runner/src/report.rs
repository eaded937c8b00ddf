//! Distribution reports: CSV pivots per index and one Markdown summary.
//!
//! For each index two pivots are written, `<index>_year_daytype.csv` and
//! `<index>_month_daytype.csv`, with one column per day type holding the
//! percentage of sessions (one decimal) and a trailing `days` column. The
//! Markdown report shows the same tables for every index.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use daytype_core::DayType;

use crate::aggregate::{DistributionRow, DistributionTable, Grouping, IndexDistribution};

pub const REPORT_FILENAME: &str = "daytype_report.md";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn row_label(grouping: Grouping, key: i32) -> String {
    match grouping {
        Grouping::Year => key.to_string(),
        Grouping::Month => usize::try_from(key - 1)
            .ok()
            .and_then(|i| MONTH_NAMES.get(i))
            .map_or_else(|| key.to_string(), |name| name.to_string()),
    }
}

/// File name of a pivot CSV, e.g. `NIFTY_50_year_daytype.csv`.
///
/// Characters outside `[A-Za-z0-9_.-]` in the index name become `_`, so the
/// name never contains a path separator.
pub fn pivot_filename(table: &DistributionTable) -> String {
    let index: String = table
        .index
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}_daytype.csv", index, table.grouping.label())
}

// ─── CSV pivots ─────────────────────────────────────────────────────

/// Render a distribution table as a percentage pivot.
pub fn export_pivot_csv(table: &DistributionTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![table.grouping.label().to_string()];
    header.extend(DayType::ALL.iter().map(|dt| dt.label().to_string()));
    header.push("days".into());
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut fields = vec![row.key.to_string()];
        fields.extend(row.percentages().iter().map(|p| format!("{p:.1}")));
        fields.push(row.total().to_string());
        wtr.write_record(&fields)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown ───────────────────────────────────────────────────────

fn markdown_table(out: &mut String, table: &DistributionTable) {
    let heading = match table.grouping {
        Grouping::Year => "Year",
        Grouping::Month => "Month",
    };
    out.push_str(&format!("| {} |", heading));
    for dt in DayType::ALL {
        out.push_str(&format!(" {} |", dt.label()));
    }
    out.push_str(" Days |\n|---|");
    for _ in DayType::ALL {
        out.push_str("---:|");
    }
    out.push_str("---:|\n");

    for row in &table.rows {
        markdown_row(out, &row_label(table.grouping, row.key), row);
    }
    out.push('\n');
}

fn markdown_row(out: &mut String, label: &str, row: &DistributionRow) {
    out.push_str(&format!("| {} |", label));
    for pct in row.percentages() {
        out.push_str(&format!(" {:.1}% |", pct));
    }
    out.push_str(&format!(" {} |\n", row.total()));
}

/// Build the Markdown report for every index.
pub fn generate_report(distributions: &[IndexDistribution]) -> String {
    let mut report = String::new();
    report.push_str("# Market Profile Day-Type Distribution\n\n");

    if distributions.is_empty() {
        report.push_str("No classified sessions.\n");
        return report;
    }

    let sessions: usize = distributions.iter().map(IndexDistribution::sessions).sum();
    report.push_str(&format!(
        "{} classified sessions across {} indices.\n\n",
        sessions,
        distributions.len()
    ));

    for dist in distributions {
        let overall = dist.by_month.overall();
        report.push_str(&format!("## {}\n\n", dist.index));
        report.push_str(&format!(
            "{} sessions, {} to {}.\n\n",
            overall.total(),
            dist.first_date,
            dist.last_date
        ));

        report.push_str("| Day type | Days | Share |\n|---|---:|---:|\n");
        for dt in DayType::ALL {
            report.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                dt.label(),
                overall.count(dt),
                overall.percent(dt)
            ));
        }
        report.push('\n');

        report.push_str("### By year\n\n");
        markdown_table(&mut report, &dist.by_year);
        report.push_str("### By month (all years)\n\n");
        markdown_table(&mut report, &dist.by_month);
    }
    report
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write both pivots for every index plus `daytype_report.md` into
/// `output_dir`. Returns the written paths, report last.
pub fn save_reports(distributions: &[IndexDistribution], output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create report dir: {}", output_dir.display()))?;

    let mut written = Vec::new();
    for dist in distributions {
        for table in [&dist.by_year, &dist.by_month] {
            let path = output_dir.join(pivot_filename(table));
            let csv = export_pivot_csv(table)?;
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }
    }

    let path = output_dir.join(REPORT_FILENAME);
    std::fs::write(&path, generate_report(distributions))
        .with_context(|| format!("failed to write {}", path.display()))?;
    written.push(path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::distributions;
    use chrono::NaiveDate;
    use daytype_core::{ClassificationRecord, IbSize};

    fn rec(index: &str, y: i32, m: u32, d: u32, day_type: DayType) -> ClassificationRecord {
        ClassificationRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            index: index.into(),
            day_type,
            ib_size: IbSize::Small,
            ib_pct: 0.2,
            ib_ratio: 0.3,
            day_range: 90.0,
        }
    }

    fn sample() -> Vec<IndexDistribution> {
        distributions(&[
            rec("NIFTY_50", 2024, 1, 2, DayType::Trend),
            rec("NIFTY_50", 2024, 1, 3, DayType::Normal),
            rec("NIFTY_50", 2024, 1, 4, DayType::Normal),
        ])
    }

    #[test]
    fn pivot_header_and_rounding() {
        let dists = sample();
        let csv = export_pivot_csv(&dists[0].by_year).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("year,Non-trend Day,Normal Day,Normal Variation Day,Neutral Center Day,Neutral Extreme Day,Trend Day,days")
        );
        assert_eq!(lines.next(), Some("2024,0.0,66.7,0.0,0.0,0.0,33.3,3"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn month_pivot_lists_all_months() {
        let dists = sample();
        let csv = export_pivot_csv(&dists[0].by_month).unwrap();
        assert_eq!(csv.lines().count(), 13);
        assert!(csv.lines().nth(12).unwrap().starts_with("12,0.0,"));
    }

    #[test]
    fn pivot_filenames() {
        let dists = sample();
        assert_eq!(pivot_filename(&dists[0].by_year), "NIFTY_50_year_daytype.csv");
        assert_eq!(pivot_filename(&dists[0].by_month), "NIFTY_50_month_daytype.csv");
    }

    #[test]
    fn pivot_filename_stays_inside_output_dir() {
        let dists = distributions(&[rec("../NIFTY 50/x\\y", 2024, 1, 2, DayType::Trend)]);
        let name = pivot_filename(&dists[0].by_year);
        assert_eq!(name, ".._NIFTY_50_x_y_year_daytype.csv");
        assert_eq!(Path::new(&name).components().count(), 1);

        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("reports");
        let written = save_reports(&dists, &out).unwrap();
        assert!(written.iter().all(|p| p.parent() == Some(out.as_path())));
    }

    #[test]
    fn markdown_report_has_every_section() {
        let md = generate_report(&sample());
        assert!(md.starts_with("# Market Profile Day-Type Distribution"));
        assert!(md.contains("## NIFTY_50"));
        assert!(md.contains("3 sessions, 2024-01-02 to 2024-01-04."));
        assert!(md.contains("| Normal Day | 2 | 66.7% |"));
        assert!(md.contains("### By year"));
        assert!(md.contains("| Jan | 0.0% | 66.7% |"));
        assert!(md.contains("| Dec | 0.0% |"));
    }

    #[test]
    fn empty_report_says_so() {
        let md = generate_report(&[]);
        assert!(md.contains("No classified sessions."));
    }

    #[test]
    fn month_labels() {
        assert_eq!(row_label(Grouping::Month, 1), "Jan");
        assert_eq!(row_label(Grouping::Month, 12), "Dec");
        assert_eq!(row_label(Grouping::Month, 13), "13");
        assert_eq!(row_label(Grouping::Year, 2024), "2024");
    }
}
