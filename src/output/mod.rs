//! Output formatters for engine results.

use std::io::Write;

use colored::{ColoredString, Colorize};
use serde::Serialize;
use serde_json::Value;

use crate::analytics::AnalyticsStateResult;
use crate::config::OutputFormat;
use crate::core::{Result, Severity, ValidationIssue};
use crate::graph::QuestionGraph;
use crate::report::SurveyValidationResult;
use crate::score::{ContributionStatus, ScoreTrace};

/// A result that knows how to present itself.
pub trait Report: Serialize {
    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()>;
}

/// Write a report in the requested format.
pub fn write_report<R: Report, W: Write>(
    report: &R,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => format_json(report, writer),
        OutputFormat::Markdown => report.write_markdown(writer),
        OutputFormat::Text => report.write_text(writer),
    }
}

fn format_json<T: Serialize, W: Write>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

impl Report for SurveyValidationResult {
    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        let summary = &self.summary;
        writeln!(writer, "# Survey Validation\n")?;
        writeln!(
            writer,
            "**Status**: {}\n",
            if self.can_publish { "Publishable" } else { "Blocked" }
        )?;
        writeln!(
            writer,
            "**Errors**: {} | **Warnings**: {} | **Info**: {}\n",
            summary.error_count, summary.warning_count, summary.info_count
        )?;

        writeln!(writer, "## Flow\n")?;
        let flow = serde_json::to_value(&summary.flow)?;
        format_as_table(std::slice::from_ref(&flow), writer)?;

        writeln!(writer, "## Issues\n")?;
        if self.issues.is_empty() {
            writeln!(writer, "_No issues found_\n")?;
            return Ok(());
        }
        let rows: Vec<Value> = self.issues.iter().map(issue_row).collect();
        format_as_table(&rows, writer)
    }

    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        let verdict = if self.can_publish {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        writeln!(writer, "Survey validation: {}", verdict)?;
        writeln!(
            writer,
            "  {} errors, {} warnings, {} info",
            self.summary.error_count, self.summary.warning_count, self.summary.info_count
        )?;
        let flow = &self.summary.flow;
        writeln!(
            writer,
            "  {} questions, {} reachable, {} backwards jumps, {} loops",
            flow.question_count, flow.reachable_count, flow.backwards_jump_count, flow.loop_count
        )?;
        for issue in &self.issues {
            writeln!(
                writer,
                "  {:<7} {:<28} {:<10} {}",
                severity_label(issue.severity),
                issue.code.as_str(),
                issue.question_id.as_deref().unwrap_or("-"),
                issue.message
            )?;
        }
        Ok(())
    }
}

fn issue_row(issue: &ValidationIssue) -> Value {
    serde_json::json!({
        "severity": issue.severity,
        "domain": issue.domain,
        "code": issue.code,
        "question": issue.question_id,
        "message": issue.message,
    })
}

impl Report for ScoreTrace {
    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Score Trace\n")?;
        writeln!(
            writer,
            "**Scorable**: {} | **Answered**: {} | **Rollup**: {}\n",
            self.meta.scorable_count, self.meta.answered_count, self.overall.rule
        )?;

        writeln!(writer, "## Categories\n")?;
        let categories: Vec<Value> = self
            .categories
            .iter()
            .map(|c| {
                serde_json::json!({
                    "category": c.category_id,
                    "raw": c.raw_score,
                    "max": c.max_possible_score,
                    "score": c.normalized_score,
                    "band": c.band.as_ref().map(|b| b.label.clone()),
                })
            })
            .collect();
        format_value_as_markdown(&Value::Array(categories), writer, 1)?;

        writeln!(writer, "## Questions\n")?;
        let questions: Vec<Value> = self
            .questions
            .iter()
            .map(|q| {
                serde_json::json!({
                    "question": q.question_id,
                    "category": q.category_id,
                    "status": q.status,
                    "selected": q.selected_score,
                    "weight": q.weight,
                    "contribution": q.contribution,
                })
            })
            .collect();
        format_value_as_markdown(&Value::Array(questions), writer, 1)?;

        writeln!(writer, "## Overall\n")?;
        match (self.overall.score, &self.overall.band) {
            (Some(score), Some(band)) => writeln!(writer, "**Score**: {} ({})\n", score, band.label)?,
            (Some(score), None) => writeln!(writer, "**Score**: {}\n", score)?,
            _ => writeln!(writer, "_No overall score under {}_\n", self.overall.rule)?,
        }

        if !self.errors.is_empty() {
            writeln!(writer, "## Errors\n")?;
            for error in &self.errors {
                writeln!(writer, "- `{}` {}", error.code, error.message)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(
            writer,
            "Score trace: {} scorable, {} answered",
            self.meta.scorable_count, self.meta.answered_count
        )?;
        for category in &self.categories {
            let band = category
                .band
                .as_ref()
                .map(|b| b.label.as_str())
                .unwrap_or("no band");
            writeln!(
                writer,
                "  {:<16} {:>3}  {}  ({}/{})",
                category.category_id,
                category.normalized_score.to_string().bold(),
                band,
                format_scalar(&Value::from(category.raw_score)),
                format_scalar(&Value::from(category.max_possible_score)),
            )?;
        }
        for question in &self.questions {
            if question.status == ContributionStatus::Answered {
                continue;
            }
            writeln!(
                writer,
                "  {} {}",
                question.question_id.dimmed(),
                status_label(question.status).dimmed()
            )?;
        }
        if let Some(score) = self.overall.score {
            writeln!(writer, "  overall ({}): {}", self.overall.rule, score)?;
        }
        for error in &self.errors {
            writeln!(writer, "  {} {}", error.code.as_str().red(), error.message)?;
        }
        Ok(())
    }
}

impl Report for QuestionGraph {
    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Question Graph\n")?;
        writeln!(
            writer,
            "**Entry**: {} | **Exits**: {}\n",
            self.entry_node.as_deref().unwrap_or("-"),
            if self.exit_nodes.is_empty() {
                "-".to_string()
            } else {
                self.exit_nodes.join(", ")
            }
        )?;

        writeln!(writer, "## Nodes\n")?;
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|n| {
                serde_json::json!({
                    "position": n.position,
                    "id": n.id,
                    "order": n.order,
                    "reachable": n.reachable,
                    "rules": n.rules.len(),
                })
            })
            .collect();
        format_value_as_markdown(&Value::Array(nodes), writer, 1)?;

        writeln!(writer, "## Edges\n")?;
        let edges: Vec<Value> = self
            .edges
            .iter()
            .map(|e| {
                serde_json::json!({
                    "from": e.from,
                    "to": e.to,
                    "type": e.kind,
                    "rule": e.rule.label,
                })
            })
            .collect();
        format_value_as_markdown(&Value::Array(edges), writer, 1)
    }

    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        for node in &self.nodes {
            let marker = if node.reachable {
                "+".green()
            } else {
                "x".red()
            };
            writeln!(writer, "{} {} {}", marker, node.id.bold(), node.text.dimmed())?;
            for (_, edge) in self.edges_from(node.position) {
                writeln!(writer, "    -> {:<12} {}", edge.to, edge.rule.label)?;
            }
        }
        Ok(())
    }
}

impl Report for AnalyticsStateResult {
    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Analytics State\n")?;
        let value = serde_json::to_value(self)?;
        format_value_as_markdown(&value, writer, 1)
    }

    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(
            writer,
            "{} {} ({})",
            severity_label(self.severity),
            self.state.as_str().bold(),
            self.reason
        )?;
        writeln!(writer, "  {}", self.message)?;
        let views = [
            ("scoring", self.show_scoring),
            ("trends", self.show_trends),
            ("participation", self.show_participation),
            ("question summary", self.show_question_summary),
        ];
        for (name, shown) in views {
            let flag = if shown { "show".green() } else { "hide".dimmed() };
            writeln!(writer, "  {:<17} {}", name, flag)?;
        }
        Ok(())
    }
}

fn status_label(status: ContributionStatus) -> &'static str {
    match status {
        ContributionStatus::Answered => "answered",
        ContributionStatus::Unanswered => "unanswered",
        ContributionStatus::Unmapped => "answer not mapped to a score",
        ContributionStatus::InvalidWeight => "invalid weight",
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

fn format_value_as_markdown<W: Write>(value: &Value, writer: &mut W, depth: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let header_level = "#".repeat((depth + 1).min(6));
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{} {}\n", header_level, format_key(key))?;
                        format_value_as_markdown(val, writer, depth + 1)?;
                    }
                    _ => {
                        writeln!(writer, "**{}**: {}\n", format_key(key), format_scalar(val))?;
                    }
                }
            }
        }
        Value::Array(arr) => {
            if arr.is_empty() {
                writeln!(writer, "_No items_\n")?;
            } else if is_table_compatible(arr) {
                format_as_table(arr, writer)?;
            } else {
                for item in arr {
                    writeln!(writer, "---\n")?;
                    format_value_as_markdown(item, writer, depth)?;
                }
            }
        }
        _ => {
            writeln!(writer, "{}\n", format_scalar(value))?;
        }
    }
    Ok(())
}

/// `questionId` / `question_id` to `Question Id`.
fn format_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch == '_' || ch == '-' {
            spaced.push(' ');
        } else {
            if ch.is_uppercase() && i > 0 {
                spaced.push(' ');
            }
            spaced.push(ch);
        }
    }
    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.replace('|', "\\|"),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 {
                    format!("{}", f as i64)
                } else {
                    format!("{:.2}", f)
                }
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
        Value::Null => "-".to_string(),
        _ => value.to_string(),
    }
}

fn is_table_compatible(arr: &[Value]) -> bool {
    if arr.is_empty() {
        return false;
    }
    arr.iter().all(|v| {
        if let Value::Object(map) = v {
            map.values()
                .all(|v| !matches!(v, Value::Object(_) | Value::Array(_)))
        } else {
            false
        }
    })
}

fn format_as_table<W: Write>(arr: &[Value], writer: &mut W) -> Result<()> {
    let headers: Vec<&str> = match arr.first() {
        Some(Value::Object(map)) => map.keys().map(|s| s.as_str()).collect(),
        _ => return Ok(()),
    };

    write!(writer, "|")?;
    for header in &headers {
        write!(writer, " {} |", format_key(header))?;
    }
    writeln!(writer)?;

    write!(writer, "|")?;
    for _ in &headers {
        write!(writer, " --- |")?;
    }
    writeln!(writer)?;

    for item in arr {
        if let Value::Object(map) = item {
            write!(writer, "|")?;
            for header in &headers {
                let value = map.get(*header).unwrap_or(&Value::Null);
                write!(writer, " {} |", format_scalar(value))?;
            }
            writeln!(writer)?;
        }
    }

    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{classify_analytics_state, AnalyticsInput};
    use crate::graph::build_graph;
    use crate::model::{LogicRule, Question};
    use crate::report::validate_survey;

    fn render<R: Report>(report: &R, format: OutputFormat) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_report(report, format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn survey() -> Vec<Question> {
        vec![
            Question::new("q1", 0, "First").with_rule(LogicRule::skip("r1", None, "q3")),
            Question::new("q2", 1, "Second"),
            Question::new("q3", 2, "Third"),
        ]
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key("questionId"), "Question Id");
        assert_eq!(format_key("backwards_jump_count"), "Backwards Jump Count");
        assert_eq!(format_key("a"), "A");
    }

    #[test]
    fn test_format_scalar() {
        assert_eq!(format_scalar(&Value::from(3.0)), "3");
        assert_eq!(format_scalar(&Value::from(2.5)), "2.50");
        assert_eq!(format_scalar(&Value::Null), "-");
        assert_eq!(format_scalar(&Value::from("a|b")), "a\\|b");
    }

    #[test]
    fn test_validation_markdown() {
        let out = render(&validate_survey(&survey(), None), OutputFormat::Markdown);
        assert!(out.starts_with("# Survey Validation"));
        assert!(out.contains("**Status**: Publishable"));
        assert!(out.contains("UNREACHABLE_QUESTION"));
        assert!(out.contains("| Code | Domain | Message | Question | Severity |"));
    }

    #[test]
    fn test_validation_json_round_trips_to_value() {
        let out = render(&validate_survey(&survey(), None), OutputFormat::Json);
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["canPublish"], true);
        assert_eq!(value["summary"]["flow"]["unreachableCount"], 1);
    }

    #[test]
    fn test_validation_text() {
        let out = render(&validate_survey(&[], None), OutputFormat::Text);
        assert!(out.contains("Survey validation: FAIL"));
        assert!(out.contains("NO_QUESTIONS"));
    }

    #[test]
    fn test_graph_text_lists_edges() {
        let out = render(&build_graph(&survey()), OutputFormat::Text);
        assert!(out.contains("x q2"));
        assert!(out.contains("-> q3"));
    }

    #[test]
    fn test_analytics_text() {
        let out = render(&classify_analytics_state(&AnalyticsInput::default()), OutputFormat::Text);
        assert!(out.contains("no-responses"));
        assert!(out.contains("hide"));
    }
}
