//! # CLI Command Implementations

use super::FilterArgs;
use crate::api;
use crate::assessor::Assessor;
use posture_core::{
    AnnotatedAssessment, AssessmentRecord, InsightLimits, Insights, PostureError, RiskWeight,
    RowFilter, insights::format_centi, read_records, remediation_suggestions, render_summary,
    write_annotated,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Maximum input table size (50 MB).
pub const MAX_INPUT_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Reject files larger than `max_size` bytes.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PostureError> {
    let size = std::fs::metadata(path)
        .map_err(|e| PostureError::IoError(format!("Cannot read file metadata: {}", e)))?
        .len();

    if size > max_size {
        return Err(PostureError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            size, max_size
        )));
    }
    Ok(())
}

/// Canonical path of an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PostureError> {
    let canonical = path.canonicalize().map_err(|e| {
        PostureError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PostureError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Output path with a canonical, existing parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, PostureError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        PostureError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    let filename = path
        .file_name()
        .ok_or_else(|| PostureError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read and parse an assessment table from disk.
pub fn read_table(path: &Path) -> Result<Vec<AssessmentRecord>, PostureError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_INPUT_FILE_SIZE)?;

    let file = std::fs::File::open(&path)
        .map_err(|e| PostureError::IoError(format!("Cannot open '{}': {}", path.display(), e)))?;
    let records = read_records(std::io::BufReader::new(file))?;

    tracing::debug!(rows = records.len(), path = %path.display(), "Table loaded");
    Ok(records)
}

/// Write to `output`, or stdout when absent.
fn emit(output: Option<&Path>, content: &[u8]) -> Result<(), PostureError> {
    match output {
        Some(path) => {
            let path = validate_output_path(path)?;
            std::fs::write(&path, content).map_err(|e| {
                PostureError::IoError(format!("Cannot write '{}': {}", path.display(), e))
            })?;
            tracing::info!(path = %path.display(), "Output written");
            Ok(())
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content)
                .and_then(|()| stdout.flush())
                .map_err(|e| PostureError::IoError(e.to_string()))
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, PostureError> {
    serde_json::to_string_pretty(value).map_err(|e| PostureError::SerializationError(e.to_string()))
}

fn row_filter(filter: &FilterArgs) -> RowFilter {
    RowFilter::new(filter.framework.as_deref(), filter.domain.as_deref())
}

async fn assess_file(
    assessor: &Assessor,
    file: &Path,
    filter: &FilterArgs,
    generative: bool,
) -> Result<Vec<AnnotatedAssessment>, PostureError> {
    let records = read_table(file)?;
    assessor
        .assess(&records, &row_filter(filter), generative)
        .await
}

/// The whole table, for insights, and the rows `filter` selects.
///
/// Generation runs for the selected rows only; with a filter the whole table
/// keeps rule-based remediation.
async fn assess_scoped(
    assessor: &Assessor,
    file: &Path,
    filter: &RowFilter,
    generative: bool,
) -> Result<(Vec<AnnotatedAssessment>, Vec<AnnotatedAssessment>), PostureError> {
    let records = read_table(file)?;

    if filter.is_empty() {
        let rows = assessor.assess(&records, filter, generative).await?;
        return Ok((rows.clone(), rows));
    }

    let table = assessor
        .assess(&records, &RowFilter::default(), false)
        .await?;
    let rows = if generative {
        assessor.assess(&records, filter, true).await?
    } else {
        table
            .iter()
            .filter(|r| filter.matches(&r.framework, &r.domain))
            .cloned()
            .collect()
    };
    Ok((table, rows))
}

// =============================================================================
// ASSESS COMMAND
// =============================================================================

/// Annotate a table and write it as CSV or JSON.
pub async fn cmd_assess(
    assessor: &Assessor,
    file: &Path,
    output: Option<&Path>,
    format: &str,
    filter: &FilterArgs,
    generative: bool,
) -> Result<(), PostureError> {
    let rows = assess_file(assessor, file, filter, generative).await?;

    let content = match format {
        "csv" => {
            let mut buffer = Vec::new();
            write_annotated(&mut buffer, &rows)?;
            buffer
        }
        "json" => {
            let mut json = to_json(&rows)?;
            json.push('\n');
            json.into_bytes()
        }
        other => {
            return Err(PostureError::SerializationError(format!(
                "Unknown output format '{}'; expected csv or json",
                other
            )));
        }
    };

    emit(output, &content)
}

// =============================================================================
// REPORT COMMAND
// =============================================================================

/// Print the text summary, or rows plus insights as JSON.
pub async fn cmd_report(
    assessor: &Assessor,
    file: &Path,
    output: Option<&Path>,
    filter: &FilterArgs,
    generative: bool,
    json_mode: bool,
) -> Result<(), PostureError> {
    let filter = row_filter(filter);
    let (table, rows) = assess_scoped(assessor, file, &filter, generative).await?;
    let insights = Insights::with_selection(&table, &filter, InsightLimits::default());

    let content = if json_mode {
        let report = serde_json::json!({
            "rows": rows,
            "insights": insights,
        });
        let mut json = to_json(&report)?;
        json.push('\n');
        json
    } else {
        render_summary(&rows, &insights)
    };

    emit(output, content.as_bytes())
}

// =============================================================================
// INSIGHTS COMMAND
// =============================================================================

/// Show aggregate insights.
pub async fn cmd_insights(
    assessor: &Assessor,
    file: &Path,
    top: Option<usize>,
    filter: &FilterArgs,
    json_mode: bool,
) -> Result<(), PostureError> {
    let filter = row_filter(filter);
    let (table, rows) = assess_scoped(assessor, file, &filter, false).await?;

    let defaults = InsightLimits::default();
    let limits = InsightLimits {
        risky_controls: top.unwrap_or(defaults.risky_controls),
        weakest_domains: top.unwrap_or(defaults.weakest_domains),
    };
    let insights = Insights::with_selection(&table, &filter, limits);

    if json_mode {
        println!("{}", to_json(&insights)?);
        return Ok(());
    }

    println!("Posture Insights");
    println!("================");
    println!("Rows:          {}", insights.row_count);
    println!(
        "Average score: {}",
        insights
            .average_centi
            .map_or_else(|| "n/a".to_string(), format_centi)
    );
    if let Some(selection) = &insights.selection {
        println!(
            "Selected:      {} rows, average {}",
            selection.row_count,
            selection
                .average_centi
                .map_or_else(|| "n/a".to_string(), format_centi)
        );
    }

    println!();
    println!("Domain means:");
    for mean in &insights.domain_means {
        println!(
            "  {:<32} {:>7}  ({} rows)",
            mean.domain,
            format_centi(mean.mean_centi),
            mean.count
        );
    }

    println!();
    println!("Framework x domain:");
    for cell in &insights.heatmap {
        println!(
            "  {:<16} {:<32} {:>7}",
            cell.framework,
            cell.domain,
            format_centi(cell.mean_centi)
        );
    }

    println!();
    println!("Weakest domains:");
    for mean in &insights.weakest_domains {
        println!("  {} ({})", mean.domain, format_centi(mean.mean_centi));
    }

    println!();
    println!("Riskiest controls:");
    for risky in &insights.risky_controls {
        println!(
            "  {} ({}, {}): {}",
            risky.control, risky.domain, risky.framework, risky.score
        );
    }

    let suggestions = remediation_suggestions(&rows);
    if !suggestions.is_empty() {
        println!();
        println!("Remediation suggestions:");
        for row in suggestions {
            println!("  {}: {}", row.control, row.remediation);
        }
    }

    let counts = &insights.priority_counts;
    println!();
    println!(
        "Priorities: Do First {}, Schedule {}, Delegate {}, Eliminate {}",
        counts.do_first, counts.schedule, counts.delegate, counts.eliminate
    );

    Ok(())
}

// =============================================================================
// WEIGHTS COMMAND
// =============================================================================

/// Show the effective weight table.
pub fn cmd_weights(assessor: &Assessor, json_mode: bool) -> Result<(), PostureError> {
    let engine = assessor.pipeline().engine();

    if json_mode {
        println!("{}", to_json(&api::WeightsResponse::from(engine))?);
        return Ok(());
    }

    println!("Risk Weights");
    println!("============");
    for (domain, weight) in engine.weights().iter() {
        println!("  {:<32} {}", domain, weight);
    }
    println!();
    println!("Unlisted domains: {}", RiskWeight::DEFAULT);
    println!(
        "Clamp to 100:     {}",
        if engine.clamps() { "yes" } else { "no" }
    );

    Ok(())
}

// =============================================================================
// CLASSIFY COMMAND
// =============================================================================

/// Annotate one row from the command line.
pub async fn cmd_classify(
    assessor: &Assessor,
    record: &AssessmentRecord,
    generative: bool,
    json_mode: bool,
) -> Result<(), PostureError> {
    let row = assessor.classify(record, generative).await?;

    if json_mode {
        println!("{}", to_json(&row)?);
        return Ok(());
    }

    println!("Control:     {}", row.control);
    println!("Domain:      {}", row.domain);
    println!("Framework:   {}", row.framework);
    println!("Value:       {}", row.value);
    println!("Urgency:     {}", row.urgency);
    println!("Score:       {}", row.score);
    println!("Priority:    {}", row.priority);
    println!("Remediation: {}", row.remediation);

    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(assessor: Assessor, host: &str, port: u16) -> Result<(), PostureError> {
    println!("Posture Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!(
        "  Weights:  {} domains",
        assessor.pipeline().engine().weights().len()
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /health   - Health check");
    println!("  GET  /weights  - Effective risk weights");
    println!("  POST /assess   - Annotate a table");
    println!("  POST /insights - Aggregate insights");
    println!("  POST /classify - Annotate one row");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, api::AppState::new(assessor)).await
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::Pipeline;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TABLE: &str = "Control,Domain,Framework,Value,Urgency\n\
                         AC-1,Access Control,NIST,0.40,High\n\
                         PC-1,Policy Compliance,ISO,0.75,Low\n";

    fn table_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(TABLE.as_bytes()).expect("write");
        file
    }

    fn assessor() -> Assessor {
        Assessor::new(Pipeline::default())
    }

    #[test]
    fn read_table_parses_rows() {
        let file = table_file();
        let records = read_table(file.path()).expect("read");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].control.as_deref(), Some("AC-1"));
    }

    #[test]
    fn read_table_rejects_missing_and_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(read_table(&dir.path().join("absent.csv")).is_err());
        assert!(read_table(dir.path()).is_err());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let file = table_file();
        assert!(validate_file_size(file.path(), 10).is_err());
        assert!(validate_file_size(file.path(), MAX_INPUT_FILE_SIZE).is_ok());
    }

    #[test]
    fn output_path_requires_existing_parent() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(validate_output_path(&dir.path().join("out.csv")).is_ok());
        assert!(validate_output_path(&dir.path().join("missing/out.csv")).is_err());
    }

    #[tokio::test]
    async fn assess_writes_annotated_csv() {
        let input = table_file();
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("annotated.csv");

        cmd_assess(
            &assessor(),
            input.path(),
            Some(&out),
            "csv",
            &FilterArgs::default(),
            false,
        )
        .await
        .expect("assess");

        let written = std::fs::read_to_string(&out).expect("read back");
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("Control,Domain,Framework,Value,Urgency,Score,Remediation,Priority")
        );
        assert!(written.contains("AC-1,Access Control,NIST"));
        assert!(written.contains(",48,"));
        assert!(written.contains("Do First"));
    }

    #[tokio::test]
    async fn assess_json_honours_filter() {
        let input = table_file();
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("annotated.json");
        let filter = FilterArgs {
            framework: Some("ISO".to_string()),
            domain: None,
        };

        cmd_assess(&assessor(), input.path(), Some(&out), "json", &filter, false)
            .await
            .expect("assess");

        let written = std::fs::read_to_string(&out).expect("read back");
        let rows: Vec<serde_json::Value> = serde_json::from_str(&written).expect("json");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Control"], "PC-1");
    }

    #[tokio::test]
    async fn unknown_format_is_an_error() {
        let input = table_file();
        let result = cmd_assess(
            &assessor(),
            input.path(),
            None,
            "xml",
            &FilterArgs::default(),
            false,
        )
        .await;
        assert!(matches!(result, Err(PostureError::SerializationError(_))));
    }

    #[tokio::test]
    async fn report_writes_summary() {
        let input = table_file();
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("summary.txt");

        cmd_report(
            &assessor(),
            input.path(),
            Some(&out),
            &FilterArgs::default(),
            false,
            false,
        )
        .await
        .expect("report");

        let written = std::fs::read_to_string(&out).expect("read back");
        assert!(written.starts_with("Compliance Summary"));
        assert!(written.contains("AC-1: Score 48 - "));
    }

    #[tokio::test]
    async fn filtered_report_ranks_the_whole_table() {
        let input = table_file();
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("summary.txt");
        let filter = FilterArgs {
            framework: Some("iso".to_string()),
            domain: None,
        };

        cmd_report(&assessor(), input.path(), Some(&out), &filter, false, false)
            .await
            .expect("report");

        let written = std::fs::read_to_string(&out).expect("read back");
        assert!(written.contains("PC-1: Score 75 - "));
        assert!(!written.contains("AC-1: Score"));
        assert!(written.contains("Average score: 75.0"));
        assert!(written.contains("  AC-1 (Access Control, NIST): 48"));
        assert!(written.contains("  Access Control: 48.0"));
    }

    #[tokio::test]
    async fn filtered_json_report_carries_selection() {
        let input = table_file();
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("report.json");
        let filter = FilterArgs {
            framework: None,
            domain: Some("policy compliance".to_string()),
        };

        cmd_report(&assessor(), input.path(), Some(&out), &filter, false, true)
            .await
            .expect("report");

        let written = std::fs::read_to_string(&out).expect("read back");
        let report: serde_json::Value = serde_json::from_str(&written).expect("json");
        assert_eq!(report["rows"].as_array().map(Vec::len), Some(1));
        assert_eq!(report["insights"]["row_count"], 2);
        assert_eq!(report["insights"]["domain_means"].as_array().map(Vec::len), Some(2));
        assert_eq!(report["insights"]["selection"]["row_count"], 1);
        assert_eq!(report["insights"]["selection"]["average_centi"], 7500);
    }

    #[tokio::test]
    async fn invalid_row_fails_the_command() {
        let mut input = NamedTempFile::new().expect("temp file");
        input
            .write_all(b"Control,Domain,Framework,Value\nAC-1,Access Control,NIST,1.5\n")
            .expect("write");

        let result = cmd_assess(
            &assessor(),
            input.path(),
            None,
            "csv",
            &FilterArgs::default(),
            false,
        )
        .await;
        assert!(matches!(result, Err(PostureError::InvalidRow { row: 1, .. })));
    }
}
