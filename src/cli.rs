use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use crate::core::config::Settings;
use crate::core::shutdown::shutdown_receiver;
use crate::schemas::{
    FileType, GradingRequest, NewAssignment, NewClass, RubricGradingRequest, UploadFile,
};
use crate::services::{
    ApiClient, AssignmentsService, BatchGradingService, FilesService, GradingService,
    HealthService, SupabaseClient,
};
use crate::tasks::{BatchFlow, PollOutcome};
use crate::views::results::render_detail;
use crate::views::{FileSelection, ResultsView, UploadForm};

/// Command-line client for the automated grading API
#[derive(Parser, Debug)]
#[command(name = "autograde", author, version, about, long_about = None)]
pub struct Cli {
    /// Print raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the grading API is reachable
    Health,
    /// Upload a teacher or student file for an assignment
    Upload {
        #[arg(long)]
        assignment: String,
        /// teacher or student
        #[arg(long = "type", default_value = "student")]
        file_type: FileType,
        path: PathBuf,
    },
    /// Grade one student's submission
    Grade {
        #[arg(long)]
        assignment: String,
        #[arg(long)]
        student: String,
    },
    /// Grade a free-form answer against a reference answer and rubric
    GradeAnswer {
        #[arg(long)]
        student_answer: String,
        #[arg(long)]
        reference_answer: String,
        /// Rubric as a JSON object, e.g. '{"accuracy": 60, "clarity": 40}'
        #[arg(long, value_parser = parse_rubric)]
        rubric: Value,
    },
    /// List student files uploaded for an assignment
    Files {
        #[arg(long)]
        assignment: String,
    },
    #[command(subcommand)]
    Batch(BatchCommand),
    #[command(subcommand)]
    Assignments(AssignmentCommand),
    #[command(subcommand)]
    Classes(ClassCommand),
}

/// Batch grading: one answer key, many student files
#[derive(Subcommand, Debug)]
enum BatchCommand {
    /// Create a batch from the teacher's answer key
    Create {
        #[arg(long)]
        assignment: String,
        #[arg(long)]
        teacher_file: PathBuf,
    },
    /// Add uploaded student files to a batch
    Add {
        batch_id: String,
        #[arg(long = "student", required = true)]
        students: Vec<String>,
    },
    /// Show how many student files of a batch are graded
    Status { batch_id: String },
    /// Show the current results of a batch once
    Results {
        batch_id: String,
        /// Print the full breakdown for this student id
        #[arg(long)]
        detail: Option<String>,
    },
    /// Poll a batch until grading completes
    Watch { batch_id: String },
    /// Create, add students and poll in one go
    Run {
        #[arg(long)]
        assignment: String,
        #[arg(long)]
        teacher_file: PathBuf,
        /// Student file id; repeat for several. Defaults to every uploaded student file.
        #[arg(long = "student")]
        students: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum AssignmentCommand {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        course_code: String,
        #[arg(long)]
        semester: String,
        #[arg(long)]
        academic_year: String,
        #[arg(long)]
        teacher_id: String,
        #[arg(long, default_value_t = 100.0)]
        max_score: f64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        due_date: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ClassCommand {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        created_by: Option<String>,
    },
    /// Assignments that belong to a class
    Assignments {
        class_id: String,
    },
}

pub(crate) async fn execute(cli: Cli, settings: &Settings) -> Result<()> {
    let api = ApiClient::from_settings(settings.api())?;
    let out = Output { json: cli.json };

    match cli.command {
        Command::Health => {
            let status = HealthService::new(api).check().await?;
            out.emit(&status, |status| format!("{}: {}", status.status, status.message))
        }
        Command::Upload { assignment, file_type, path } => {
            let file = read_upload(&path).await?;
            let record = UploadForm::new(file_type, assignment)
                .with_file(file)
                .submit(&FilesService::new(api))
                .await?;
            out.emit(&record, |record| {
                format!("Uploaded {} as {} file {}", record.file_name, record.file_type, record.id)
            })
        }
        Command::Grade { assignment, student } => {
            let response = GradingService::new(api)
                .grade_submission(&assignment, &GradingRequest { student_id: student })
                .await?;
            out.emit(&response, render_detail)
        }
        Command::GradeAnswer { student_answer, reference_answer, rubric } => {
            let request = RubricGradingRequest { student_answer, reference_answer, rubric };
            let response = GradingService::new(api).grade_answer(&request).await?;
            out.emit(&response, |response| {
                let result = serde_json::to_string_pretty(&response.grading_result)
                    .unwrap_or_else(|_| response.grading_result.to_string());
                format!("success: {}\n{result}", response.success)
            })
        }
        Command::Files { assignment } => {
            let files = SupabaseClient::from_settings(settings)?
                .list_student_files(&assignment)
                .await?;
            out.emit(&files, |files| {
                files
                    .iter()
                    .map(|file| format!("{}  {}  {} bytes", file.id, file.file_name, file.file_size))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Batch(command) => run_batch(command, api, settings, out).await,
        Command::Assignments(command) => run_assignments(command, api, out).await,
        Command::Classes(command) => run_classes(command, settings, out).await,
    }
}

async fn run_batch(
    command: BatchCommand,
    api: ApiClient,
    settings: &Settings,
    out: Output,
) -> Result<()> {
    let batches = BatchGradingService::new(api);

    match command {
        BatchCommand::Create { assignment, teacher_file } => {
            let file = read_upload(&teacher_file).await?;
            let created = batches.create_batch(&file, &assignment).await?;
            out.emit(&created, |created| format!("Created batch {}", created.batch_id))
        }
        BatchCommand::Add { batch_id, students } => {
            let membership = batches.add_students(&batch_id, &students).await?;
            out.emit(&membership, |membership| {
                format!("Added {} student file(s) to batch {}", students.len(), membership.batch_id)
            })
        }
        BatchCommand::Status { batch_id } => {
            let status = batches.get_status(&batch_id).await?;
            out.emit(&status, |status| {
                format!(
                    "Batch {}: {} ({}/{} graded)",
                    status.batch_id, status.status, status.completed, status.total
                )
            })
        }
        BatchCommand::Results { batch_id, detail } => {
            let response = batches.get_results(&batch_id).await?;
            if let Some(student_id) = detail {
                let result = response
                    .results
                    .iter()
                    .find(|result| result.student_id == student_id)
                    .with_context(|| format!("No result for student {student_id} in batch {batch_id}"))?;
                return out.emit(result, render_detail);
            }
            let state = if response.is_completed() { "completed" } else { "in progress" };
            out.emit(&response, |response| {
                format!("Status: {state}\n{}", ResultsView::from_response(response).render_table())
            })
        }
        BatchCommand::Watch { batch_id } => {
            let flow = BatchFlow::new(batches, settings.polling().clone())
                .with_shutdown(shutdown_receiver());
            let outcome = flow.watch_with_progress(&batch_id, report_progress).await?;
            emit_outcome(out, &batch_id, &outcome)
        }
        BatchCommand::Run { assignment, teacher_file, students } => {
            let file = read_upload(&teacher_file).await?;
            let flow = BatchFlow::new(batches, settings.polling().clone())
                .with_shutdown(shutdown_receiver());

            let report = if students.is_empty() {
                let listed = SupabaseClient::from_settings(settings)?
                    .list_student_files(&assignment)
                    .await?;
                let mut selection = FileSelection::new(listed);
                selection.toggle_all();
                flow.run(Some(&file), &assignment, &selection).await?
            } else {
                flow.run_with_ids(Some(&file), &assignment, students).await?
            };

            emit_outcome(out, &report.batch.batch_id, &report.outcome)
        }
    }
}

async fn run_assignments(command: AssignmentCommand, api: ApiClient, out: Output) -> Result<()> {
    let assignments = AssignmentsService::new(api);

    match command {
        AssignmentCommand::List => {
            let all = assignments.list().await?;
            out.emit(&all, |all| {
                all.iter()
                    .map(|item| format!("{}  {}  ({})", item.id, item.title, item.course_code))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        AssignmentCommand::Get { id } => {
            let assignment = assignments.get(&id).await?;
            out.emit(&assignment, |item| {
                format!("{}  {}  max {} pts", item.id, item.title, item.max_score)
            })
        }
        AssignmentCommand::Create {
            title,
            course_code,
            semester,
            academic_year,
            teacher_id,
            max_score,
            description,
            due_date,
        } => {
            let payload = NewAssignment {
                title,
                description,
                course_code,
                semester,
                academic_year,
                due_date,
                max_score,
                rubric: None,
                teacher_id,
            };
            let created = assignments.create(&payload).await?;
            out.emit(&created, |item| format!("Created assignment {} ({})", item.id, item.title))
        }
    }
}

async fn run_classes(command: ClassCommand, settings: &Settings, out: Output) -> Result<()> {
    let supabase = SupabaseClient::from_settings(settings)?;

    match command {
        ClassCommand::List => {
            let classes = supabase.list_classes().await?;
            out.emit(&classes, |classes| {
                classes
                    .iter()
                    .map(|class| format!("{}  {}", class.id, class.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ClassCommand::Get { id } => {
            let class = supabase
                .get_class(&id)
                .await?
                .with_context(|| format!("Class {id} not found"))?;
            out.emit(&class, |class| format!("{}  {}  {}", class.id, class.name, class.subject))
        }
        ClassCommand::Create { name, description, created_by } => {
            let created = supabase.create_class(&NewClass { name, description, created_by }).await?;
            out.emit(&created, |class| format!("Created class {} ({})", class.id, class.name))
        }
        ClassCommand::Assignments { class_id } => {
            let assignments = supabase.list_assignments_for_class(&class_id).await?;
            out.emit(&assignments, |all| {
                all.iter()
                    .map(|item| format!("{}  {}", item.id, item.title))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(self, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human(value));
        }
        Ok(())
    }
}

fn emit_outcome(out: Output, batch_id: &str, outcome: &PollOutcome) -> Result<()> {
    match outcome {
        PollOutcome::Completed(response) => {
            out.emit(response, |response| ResultsView::from_response(response).render_table())
        }
        PollOutcome::Cancelled { last } => {
            eprintln!("Polling stopped; batch {batch_id} keeps grading on the server");
            match last {
                Some(response) => out.emit(response, |response| {
                    ResultsView::from_response(response).render_table()
                }),
                None => Ok(()),
            }
        }
    }
}

fn report_progress(response: &crate::schemas::BatchGradingResponse) {
    eprintln!(
        "batch {}: {} result(s) so far, status {}",
        response.batch_id,
        response.results.len(),
        response.status.as_deref().unwrap_or(if response.is_completed() { "completed" } else { "processing" })
    );
}

fn parse_rubric(raw: &str) -> std::result::Result<Value, String> {
    let rubric: Value =
        serde_json::from_str(raw).map_err(|err| format!("rubric is not valid JSON: {err}"))?;
    if !rubric.is_object() {
        return Err("rubric must be a JSON object".to_string());
    }
    Ok(rubric)
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    UploadFile::from_path(path).await.with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_batch_run_with_students() {
        let cli = Cli::try_parse_from([
            "autograde",
            "batch",
            "run",
            "--assignment",
            "a1",
            "--teacher-file",
            "key.pdf",
            "--student",
            "f1",
            "--student",
            "f2",
        ])
        .expect("parse");

        match cli.command {
            Command::Batch(BatchCommand::Run { assignment, students, .. }) => {
                assert_eq!(assignment, "a1");
                assert_eq!(students, vec!["f1", "f2"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn upload_type_defaults_to_student_and_rejects_unknown() {
        let cli = Cli::try_parse_from(["autograde", "upload", "--assignment", "a1", "s1.pdf"])
            .expect("parse");
        assert!(matches!(cli.command, Command::Upload { file_type: FileType::Student, .. }));

        let err = Cli::try_parse_from([
            "autograde", "upload", "--assignment", "a1", "--type", "answer_key", "s1.pdf",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Must be 'teacher' or 'student'"));
    }

    #[test]
    fn grade_answer_parses_rubric_json() {
        let cli = Cli::try_parse_from([
            "autograde",
            "grade-answer",
            "--student-answer",
            "42",
            "--reference-answer",
            "forty-two",
            "--rubric",
            r#"{"accuracy": 100}"#,
        ])
        .expect("parse");

        match cli.command {
            Command::GradeAnswer { rubric, .. } => assert_eq!(rubric["accuracy"], 100),
            other => panic!("unexpected command: {other:?}"),
        }

        let err = Cli::try_parse_from([
            "autograde",
            "grade-answer",
            "--student-answer",
            "42",
            "--reference-answer",
            "forty-two",
            "--rubric",
            "[1, 2]",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("rubric must be a JSON object"));
    }

    #[test]
    fn batch_add_requires_a_student() {
        assert!(Cli::try_parse_from(["autograde", "batch", "add", "b1"]).is_err());
    }
}
