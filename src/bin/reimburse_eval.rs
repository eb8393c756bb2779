use anyhow::Context;
use clap::Parser;
use reimburse::adapters::cases::{load_cases, write_report};
use reimburse::core::evaluation::{
    evaluate, EvaluationSummary, CLOSE_TOLERANCE, EXACT_TOLERANCE,
};
use reimburse::utils::{logger, validation::Validate};
use reimburse::{Estimator, ModelState, TomlConfig};

#[derive(Parser)]
#[command(name = "reimburse-eval")]
#[command(about = "Score the reimbursement estimator against historical cases")]
struct Args {
    /// JSON file of historical cases
    #[arg(short, long, default_value = "public_cases.json")]
    cases: String,

    /// Decision tree model file
    #[arg(long, env = "REIMBURSE_MODEL")]
    model: Option<String>,

    /// Optional TOML configuration file
    #[arg(long, env = "REIMBURSE_CONFIG")]
    config: Option<String>,

    /// Write one CSV row per case to this path
    #[arg(long)]
    report: Option<String>,

    /// Ignore the model and score the fallback formula alone
    #[arg(long)]
    fallback_only: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path))?,
        None => TomlConfig::default(),
    };

    if args.json_logs {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    let estimator = if args.fallback_only {
        tracing::info!("🔧 Fallback-only mode");
        Estimator::new(
            ModelState::Unavailable {
                reason: "disabled by --fallback-only".to_string(),
            },
            config.special_case_table(),
            config.correction_layer(),
        )
    } else {
        config.build_estimator(args.model.as_deref())?
    };

    tracing::info!("📁 Loading cases from: {}", args.cases);
    let cases = load_cases(&args.cases)
        .with_context(|| format!("Failed to read cases from '{}'", args.cases))?;

    let (results, summary) = evaluate(&estimator, &cases)?;

    display_model_summary(&estimator, &config, &args);
    display_summary(&summary);

    if let Some(worst) = summary.worst_case.and_then(|i| results.get(i)) {
        println!(
            "  Worst case #{}: {} days, {:.0} miles, ${:.2} receipts -> expected ${:.2}, got ${:.2} ({})",
            worst.case,
            worst.days,
            worst.miles,
            worst.receipts,
            worst.expected,
            worst.actual,
            worst.source
        );
    }

    if let Some(path) = &args.report {
        write_report(path, &results).with_context(|| format!("Failed to write report '{}'", path))?;
        tracing::info!("📁 Report saved to: {}", path);
        println!("📁 Report saved to: {}", path);
    }

    Ok(())
}

fn display_model_summary(estimator: &Estimator, config: &TomlConfig, args: &Args) {
    println!("📋 Estimator Summary:");
    match estimator.model_state() {
        ModelState::Ready(model) => {
            println!("  Model: {}", config.model_path(args.model.as_deref()));
            println!("  Tree: {}", model.describe());
        }
        ModelState::Unavailable { reason } => {
            println!("  Model: unavailable ({})", reason);
            println!("  Tree: fallback formula in use");
        }
    }
    println!("  Special cases: {}", estimator.special_cases().len());
    println!("  Correction rules: {}", estimator.corrections().len());
    println!();
}

fn display_summary(summary: &EvaluationSummary) {
    let pct = |n: usize| {
        if summary.cases == 0 {
            0.0
        } else {
            n as f64 * 100.0 / summary.cases as f64
        }
    };

    println!("📊 Evaluation Results:");
    println!("  Cases: {}", summary.cases);
    println!(
        "  Exact (±${:.2}): {} ({:.1}%)",
        EXACT_TOLERANCE,
        summary.exact,
        pct(summary.exact)
    );
    println!(
        "  Close (±${:.2}): {} ({:.1}%)",
        CLOSE_TOLERANCE,
        summary.close,
        pct(summary.close)
    );
    println!("  Average error: ${:.2}", summary.average_error());
    println!("  Maximum error: ${:.2}", summary.max_error);
    println!(
        "  Sources: {} special case, {} tree, {} fallback",
        summary.special_case_hits, summary.tree_hits, summary.fallback_hits
    );
    if summary.skipped > 0 {
        println!("  Skipped (invalid input): {}", summary.skipped);
    }
}
