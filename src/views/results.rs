use std::fmt::{self, Write as _};

use crate::core::time::display_timestamp;
use crate::schemas::{BatchGradingResponse, GradingResponse};

const FEEDBACK_PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's line in the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub student: String,
    pub score: Option<f64>,
    pub band: Option<ScoreBand>,
    pub feedback: String,
    pub graded_at: String,
    pub error: Option<String>,
}

impl ResultRow {
    fn from_result(result: &GradingResponse) -> Self {
        let student = result
            .student_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&result.student_id)
            .to_string();
        let graded_at = result.graded_at.as_deref().map(display_timestamp).unwrap_or_default();

        match &result.error {
            Some(error) => Self {
                student,
                score: None,
                band: None,
                feedback: String::new(),
                graded_at,
                error: Some(error.clone()),
            },
            None => Self {
                student,
                score: Some(result.score),
                band: Some(ScoreBand::for_score(result.score)),
                feedback: result.feedback.clone(),
                graded_at,
                error: None,
            },
        }
    }
}

/// Per-student scores of a finished batch plus the class average.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub batch_id: String,
    pub rows: Vec<ResultRow>,
    pub average_score: u32,
}

impl ResultsView {
    pub fn from_response(response: &BatchGradingResponse) -> Self {
        let rows: Vec<ResultRow> = response.results.iter().map(ResultRow::from_result).collect();
        let average_score = average(rows.iter().filter_map(|row| row.score));
        Self { batch_id: response.batch_id.clone(), rows, average_score }
    }

    pub fn graded_count(&self) -> usize {
        self.rows.iter().filter(|row| row.error.is_none()).count()
    }

    pub fn average_band(&self) -> ScoreBand {
        ScoreBand::for_score(f64::from(self.average_score))
    }

    pub fn render_table(&self) -> String {
        let headers = ["Student", "Score", "Band", "Graded At", "Feedback"];
        let cells: Vec<[String; 5]> = self
            .rows
            .iter()
            .map(|row| {
                let (score, band, feedback) = match &row.error {
                    Some(error) => ("-".to_string(), "error".to_string(), error.clone()),
                    None => (
                        row.score.map(format_score).unwrap_or_default(),
                        row.band.map(|band| band.to_string()).unwrap_or_default(),
                        row.feedback.clone(),
                    ),
                };
                [
                    row.student.clone(),
                    score,
                    band,
                    row.graded_at.clone(),
                    preview(&feedback, FEEDBACK_PREVIEW_CHARS),
                ]
            })
            .collect();

        let mut widths = headers.map(|header| header.chars().count());
        for line in &cells {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Batch {}: {} result(s), class average {}/100 ({})",
            self.batch_id,
            self.rows.len(),
            self.average_score,
            self.average_band()
        );
        push_line(&mut out, &headers.map(str::to_string), &widths);
        push_line(&mut out, &widths.map(|width| "-".repeat(width)), &widths);
        for line in &cells {
            push_line(&mut out, line, &widths);
        }
        out
    }
}

/// Full breakdown of one student's result.
pub fn render_detail(result: &GradingResponse) -> String {
    let name = result
        .student_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&result.student_id);

    let mut out = String::new();
    let _ = writeln!(out, "Grading details for {name}");
    if let Some(error) = &result.error {
        let _ = writeln!(out, "Error: {error}");
        return out;
    }

    let _ = writeln!(
        out,
        "Score: {}/100 ({})",
        format_score(result.score),
        ScoreBand::for_score(result.score)
    );
    if let Some(graded_at) = &result.graded_at {
        let _ = writeln!(out, "Graded at: {}", display_timestamp(graded_at));
    }

    if !result.rubric_scores.is_empty() {
        let _ = writeln!(out, "\nRubric breakdown:");
        for (criterion, score) in &result.rubric_scores {
            let _ = writeln!(out, "  {criterion}: {}%", format_score(*score));
        }
    }

    let _ = writeln!(out, "\nFeedback:\n{}", result.feedback);
    push_list(&mut out, "Strengths", &result.strengths);
    push_list(&mut out, "Areas for improvement", &result.areas_for_improvement);
    push_list(&mut out, "Missed concepts", &result.missed_concepts);
    out
}

fn average(scores: impl Iterator<Item = f64>) -> u32 {
    let (sum, count) = scores.fold((0.0, 0u32), |(sum, count), score| (sum + score, count + 1));
    if count == 0 {
        return 0;
    }
    (sum / f64::from(count)).round().max(0.0) as u32
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}:");
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}
