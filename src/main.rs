use clap::Parser;
use reimburse::utils::{logger, validation::Validate};
use reimburse::{CliConfig, InputTriple, ReimburseError};

fn main() {
    let config = CliConfig::parse();

    if let Err(e) = run(&config) {
        tracing::error!(
            "❌ Estimate failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

fn run(config: &CliConfig) -> Result<(), ReimburseError> {
    config.validate()?;

    // The logger is configured from the file, so the file comes first.
    let file_config = config.load_file_config()?;
    file_config.validate_config()?;

    logger::init_cli_logger(config.verbose, file_config.log_level());
    tracing::debug!("CLI config: {:?}", config);

    let input = InputTriple::new(config.trip_days, config.miles, config.receipts);

    let estimator = file_config.build_estimator(config.model.as_deref())?;
    let estimate = estimator.estimate(&input)?;
    tracing::info!("Estimate {:.2} from {}", estimate.amount, estimate.source);

    println!("{:.2}", estimate.amount);
    Ok(())
}
