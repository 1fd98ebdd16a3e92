use clap::Parser;
use currency_converter::utils::{logger, validation::Validate};
use currency_converter::{
    CliConfig, Command, Converter, ConverterConfig, ConverterError, NbrbClient, PngChartRenderer,
};

fn load_config(cli: &CliConfig) -> Result<ConverterConfig, ConverterError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::debug!("Loading settings from {}", path.display());
            ConverterConfig::from_file(path)?
        }
        None => ConverterConfig::default(),
    };
    if let Some(output) = &cli.output {
        config.plot.output_path = output.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: &CliConfig) -> Result<(), ConverterError> {
    cli.validate()?;
    let config = load_config(cli)?;
    let command = cli.command(&config, chrono::Local::now().date_naive())?;
    tracing::debug!("Command: {:?}", command);

    let client = NbrbClient::new(&config.api)?;
    let renderer = PngChartRenderer::from_config(&config.plot);
    let base_currency = config.conversion.base_currency.to_ascii_uppercase();
    let converter = Converter::new(client, config, renderer);

    match command {
        Command::Rate { currency, date } => {
            let rate = converter.get_rate(&currency, date).await?;
            println!("{} {}: {} {}", rate.scale, currency, rate.rate, base_currency);
        }
        Command::Convert(request) => {
            let summa = converter.convert_request(&request).await?;
            println!(
                "{} {} = {:.4} {}",
                request.amount, request.from_currency, summa, request.to_currency
            );
        }
        Command::Plot {
            currency,
            start,
            end,
        } => {
            let path = converter.make_plot(&currency, start, end).await?;
            println!("Chart saved to: {}", path.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "Converter failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::debug!("Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("{}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }
}
