use anyhow::Result;
use clap::{Parser, ValueEnum};
use rharvest::{init_tracing_once, load_plan_file, CancelToken, HarvestOutcome, Plan, QuerySpec, RedditHarvest};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const DEFAULT_OUTPUT_DIR: &str = "optimus_data";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlanArg {
    Overnight,
    Continuation,
}

impl From<PlanArg> for Plan {
    fn from(p: PlanArg) -> Self {
        match p {
            PlanArg::Overnight => Plan::Overnight,
            PlanArg::Continuation => Plan::Continuation,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "rharvest: checkpointed Reddit topic harvester", long_about = None)]
struct Cli {
    /// Built-in query list to run.
    #[arg(long, value_enum, default_value = "overnight")]
    plan: PlanArg,

    /// JSON file with a custom ordered query list (overrides --plan's queries).
    #[arg(long)]
    plan_file: Option<PathBuf>,

    /// Prior dataset (CSV) to extend instead of starting from zero.
    #[arg(long)]
    resume: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Wait between searches, in seconds.
    #[arg(long, default_value_t = 180)]
    cooldown_secs: u64,

    /// Final dataset file prefix (defaults per plan).
    #[arg(long)]
    prefix: Option<String>,

    /// Checkpoint file name inside the output dir (defaults per plan).
    #[arg(long)]
    checkpoint: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,

    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

fn print_plan(queries: &[QuerySpec], cooldown: Duration) {
    let target: u32 = queries.iter().map(|q| q.target_count).sum();
    println!("Searches planned: {} (target posts: {})", queries.len(), target);
    for (i, q) in queries.iter().enumerate() {
        println!("  {}. r/{} - '{}' ({} posts)", i + 1, q.community, q.query_text, q.target_count);
    }
    let minutes = queries.len() as u64 * cooldown.as_secs() / 60;
    println!("Wait between searches: {}s (estimated ~{} minutes)", cooldown.as_secs(), minutes);
    println!("Press Ctrl+C to stop; progress is saved after every search.");
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing_once(if cli.verbose { "debug" } else { "info" });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let plan: Plan = cli.plan.into();
    let queries = match &cli.plan_file {
        Some(p) => load_plan_file(p)?,
        None => plan.queries(),
    };
    let (default_prefix, default_checkpoint) = plan.default_names();
    let cooldown = Duration::from_secs(cli.cooldown_secs);

    let harvest = RedditHarvest::new()
        .output_dir(&cli.output_dir)
        .output_prefix(cli.prefix.clone().unwrap_or_else(|| default_prefix.to_string()))
        .checkpoint_name(cli.checkpoint.clone().unwrap_or_else(|| default_checkpoint.to_string()))
        .resume_from(cli.resume.as_ref())
        .cooldown(cooldown)
        .progress(!cli.no_progress);

    print_plan(&queries, cooldown);
    if !cli.yes && !confirm("\nReady to start collection? (y/N): ")? {
        println!("Cancelled.");
        return Ok(());
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_token.cancel() {
            eprintln!("\nSecond interrupt; exiting now. The last checkpoint is kept on disk.");
            std::process::exit(130);
        }
        eprintln!("\nInterrupt received. Stopping after saving progress (Ctrl+C again to force exit)...");
    }) {
        tracing::warn!("failed to install Ctrl-C handler: {}", e);
    }

    let client = harvest.reddit_client()?;
    let report = harvest.run(&client, &queries, &cancel)?;

    if report.outcome == HarvestOutcome::Interrupted {
        println!("\nInterrupted by user; collected data has been saved.");
    }
    let failed = report.queries.iter().filter(|q| q.error.is_some()).count();
    println!(
        "\nSearches run: {} ({} failed), resumed: {}, accumulated: {}",
        report.queries.len(),
        failed,
        report.resumed,
        report.accumulated
    );
    match &report.finalized {
        Some(f) => {
            let pct = 100.0 * f.metaphor_signals as f64 / f.total.max(1) as f64;
            println!("Total records: {} ({} posts, {} replies)", f.total, f.posts, f.replies);
            println!("Communities: {}, queries: {}", f.communities, f.queries);
            println!("Metaphor signals: {} ({:.1}%)", f.metaphor_signals, pct);
            println!("File: {}", f.path.display());
            println!("Sample: {}", f.sample_path.display());
        }
        None => println!("Total records: 0 (no data collected)"),
    }
    Ok(())
}
