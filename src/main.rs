use clap::Parser;
use create_school_student::cli::{self, RunOptions};
use create_school_student::logging::init_logging;
use create_school_student::store::MongoConfig;
use create_school_student::types::RunMode;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "create-school-student")]
#[command(about = "Create school classrooms from a level/subject workbook and export student assignments")]
#[command(long_about = "create-school-student - classroom import for one school year

Reads the 'level' tab (level, levelId) and the 'subject' tab (subject,
subjectId) of the input workbook, creates one classroom per level × subject
for the school and school year, and writes the assigned students to the
output workbook (userId, email, level, class).

MODES:
  init         Insert classrooms; existing ones are reported and skipped
  update       Insert missing classrooms, update changed ones
  init-dry     Same as init --dry-run
  update-dry   Same as update --dry-run

ALWAYS preview first: run with --dry-run (or a -dry mode) before the real run.

EXAMPLES:
  create-school-student --school 64b7f0c2a1b2c3d4e5f60718 --dry-run \\
      init mongodb://localhost:27017/school input.xlsx output.xlsx
  create-school-student --school 64b7f0c2a1b2c3d4e5f60718 --year 2024-2025 \\
      update mongodb://localhost:27017/school input.xlsx output.xlsx")]
#[command(version)]
struct Cli {
    /// init, update, init-dry or update-dry
    mode: RunMode,

    /// MongoDB connection URL
    mongodb_url: String,

    /// Input workbook (.xlsx) with 'level' and 'subject' tabs
    input: PathBuf,

    /// Output workbook (.xlsx); overwritten if it exists
    output: PathBuf,

    /// Preview changes without writing to the database
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Target the development database (database name gets a '-dev' suffix)
    #[arg(long)]
    dev: bool,

    /// School the classrooms belong to
    #[arg(short, long, env = "SCHOOL_ID")]
    school: String,

    /// School year, e.g. 2024-2025 (default: current school year)
    #[arg(short, long, env = "SCHOOL_YEAR")]
    year: Option<String>,

    /// Database name (default: from the URL, else 'school')
    #[arg(long, env = "MONGODB_DATABASE")]
    database: Option<String>,

    /// Server selection timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Show each classroom and debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = RunOptions {
        mode: cli.mode.mode,
        dry_run: cli.dry_run || cli.mode.dry_run,
        school_id: cli.school,
        school_year: cli.year,
        input: cli.input,
        output: cli.output,
        mongo: MongoConfig {
            url: cli.mongodb_url,
            database: cli.database,
            dev: cli.dev,
            timeout: Duration::from_secs(cli.timeout),
        },
        json: cli.json,
        verbose: cli.verbose,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::run(options))?;

    Ok(())
}
