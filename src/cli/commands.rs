use crate::core::{
    enumerate_classrooms, resolve_school_year, ClassroomAction, ClassroomWriter, ImportReport,
};
use crate::error::{ImportError, ImportResult};
use crate::excel::{AssignmentWriter, WorkbookReader};
use crate::store::{ClassroomStore, MongoConfig, MongoStore};
use crate::types::{ClassroomDescriptor, ImportSummary, Mode};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for one run, as parsed from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: Mode,
    pub dry_run: bool,
    pub school_id: String,
    pub school_year: Option<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub mongo: MongoConfig,
    pub json: bool,
    pub verbose: bool,
}

/// Everything resolved before the database is touched
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub mode: Mode,
    pub dry_run: bool,
    pub school_id: String,
    pub school_year: String,
    pub levels: usize,
    pub subjects: usize,
    pub descriptors: Vec<ClassroomDescriptor>,
}

/// Read the input workbook and enumerate classrooms.
///
/// Any malformed input or bad argument fails here, before a connection exists.
pub fn prepare_plan(options: &RunOptions) -> ImportResult<ImportPlan> {
    let school_id = options.school_id.trim();
    if school_id.is_empty() {
        return Err(ImportError::InvalidArgument(
            "school id must not be empty".to_string(),
        ));
    }

    let sheet = WorkbookReader::new(&options.input).read()?;
    let school_year = resolve_school_year(options.school_year.as_deref())?;
    let descriptors = enumerate_classrooms(&sheet.levels, &sheet.subjects, school_id, &school_year);

    info!(
        levels = sheet.levels.len(),
        subjects = sheet.subjects.len(),
        classrooms = descriptors.len(),
        "input workbook read"
    );

    Ok(ImportPlan {
        mode: options.mode,
        dry_run: options.dry_run,
        school_id: school_id.to_string(),
        school_year,
        levels: sheet.levels.len(),
        subjects: sheet.subjects.len(),
        descriptors,
    })
}

/// Persist (or preview) the plan, then write the output workbook
pub async fn execute_plan<S: ClassroomStore + ?Sized>(
    store: &S,
    plan: &ImportPlan,
    output: &Path,
) -> ImportResult<ImportReport> {
    let report = ClassroomWriter::new(store, plan.mode, plan.dry_run)
        .apply(&plan.descriptors)
        .await?;

    AssignmentWriter::new(&report.records).write(output)?;
    info!(rows = report.records.len(), output = %output.display(), "output workbook written");

    Ok(report)
}

/// Execute the import command
pub async fn run(options: RunOptions) -> ImportResult<ImportSummary> {
    if !options.json {
        println!("{}", "🏫 Create School Student - Classroom import".bold().green());
        println!("   Mode:   {}", options.mode.to_string().bright_blue().bold());
        println!("   Input:  {}", options.input.display());
        println!("   Output: {}", options.output.display());
        println!();

        if options.dry_run {
            println!(
                "{}",
                "📋 DRY RUN MODE - No changes will be written to the database\n".yellow()
            );
        }
    }

    let plan = prepare_plan(&options)?;

    if !options.json {
        println!("   School: {}", plan.school_id.bright_blue());
        println!("   Year:   {}", plan.school_year.bright_blue());
        println!(
            "   Found {} levels × {} subjects = {} classrooms\n",
            plan.levels,
            plan.subjects,
            plan.descriptors.len()
        );
    }

    let store = MongoStore::connect(&options.mongo).await?;
    if options.verbose && !options.json {
        println!("{}", format!("🔌 Connected to {}", store.database_name()).cyan());
    }

    let report = execute_plan(&store, &plan, &options.output).await?;

    if options.json {
        let json = serde_json::to_string_pretty(&report.summary)
            .map_err(|e| ImportError::IoWrite(e.to_string()))?;
        println!("{}", json);
    } else {
        print_report(&report, options.verbose);
        println!("   Output workbook: {}\n", options.output.display());
    }

    Ok(report.summary)
}

fn print_report(report: &ImportReport, verbose: bool) {
    let summary = &report.summary;

    if verbose {
        for outcome in &report.outcomes {
            let label = match outcome.action {
                ClassroomAction::Create => "create".green(),
                ClassroomAction::Update => "update".yellow(),
                ClassroomAction::Unchanged => "unchanged".dimmed(),
                ClassroomAction::Duplicate => "duplicate".red(),
            };
            println!(
                "   {:<10} {} ({} students)",
                label,
                outcome.title.cyan(),
                outcome.students
            );
        }
        println!();
    }

    let heading = if summary.dry_run {
        "📋 Dry run results (nothing written):"
    } else {
        "✅ Import results:"
    };
    println!("{}", heading.bold().green());

    let (create_label, update_label) = if summary.dry_run {
        ("would create", "would update")
    } else {
        ("created", "updated")
    };
    println!("   {:<13} {}", create_label, summary.created.to_string().bold());
    println!("   {:<13} {}", update_label, summary.updated.to_string().bold());
    println!("   {:<13} {}", "unchanged", summary.unchanged);
    println!("   {:<13} {}", "students", summary.students);

    if summary.duplicates > 0 {
        println!(
            "{}",
            format!(
                "   ⚠️  {} classroom(s) already exist and were skipped (use update mode to change them)",
                summary.duplicates
            )
            .yellow()
        );
    }
    println!();
}
