//! Command-line client for the conversion prediction service.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use conversion_predictor::client::form::{parse_non_negative, parse_rate, Channel, Gender, PredictionForm};
use conversion_predictor::client::output::{self, OutputFormat};
use conversion_predictor::client::{PredictorClient, DEFAULT_ENDPOINT};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "predict-client")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Service endpoint
    #[arg(short, long, env = "PREDICTOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one feature record and show the prediction
    Predict(PredictArgs),

    /// Show every logged prediction
    History,

    /// Show one logged prediction
    Show {
        /// Prediction id
        id: u64,
    },

    /// Save the prediction history to a local JSON file
    Download {
        /// Destination file
        #[arg(long, default_value = "predictions.json")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct PredictArgs {
    /// Age in years
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(i64).range(18..=100))]
    age: i64,

    /// Advertising spend
    #[arg(long, default_value = "100", value_parser = parse_non_negative)]
    ad_spend: f64,

    /// Click-through rate: share of impressions that were clicked (0-1)
    #[arg(long, default_value = "0.05", value_parser = parse_rate)]
    ctr: f64,

    /// Number of website visits
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(0..))]
    visits: i64,

    /// Time on site in seconds
    #[arg(long, default_value = "30", value_parser = parse_non_negative)]
    time_on_site: f64,

    #[arg(long, value_enum, default_value = "male")]
    gender: Gender,

    /// Campaign channel
    #[arg(long, value_enum, default_value = "ppc")]
    channel: Channel,
}

impl From<PredictArgs> for PredictionForm {
    fn from(a: PredictArgs) -> Self {
        PredictionForm {
            age: a.age,
            ad_spend: a.ad_spend,
            click_through_rate: a.ctr,
            website_visits: a.visits,
            time_on_site: a.time_on_site,
            gender: a.gender,
            channel: a.channel,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    if let Err(e) = run(cli).await {
        output::error(format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = PredictorClient::new(&cli.endpoint, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Predict(args) => {
            let form = PredictionForm::from(args);
            let record = client.predict(&form.to_feature_record()).await?;
            match cli.output {
                OutputFormat::Table => output::print_prediction(&record),
                OutputFormat::Json => output::print_record(&record, cli.output)?,
            }
        }
        Commands::History => {
            let records = client.list_predictions().await?;
            output::print_history(&records, cli.output)?;
        }
        Commands::Show { id } => {
            let record = client.get_prediction(id).await?;
            output::print_record(&record, cli.output)?;
        }
        Commands::Download { out } => {
            let records = client.list_predictions().await?;
            if records.is_empty() {
                output::info("history is empty, nothing to download");
                return Ok(());
            }
            let body = output::history_json(&records)?;
            tokio::fs::write(&out, body).await?;
            output::success(format!(
                "saved {} predictions to {}",
                records.len(),
                out.display()
            ));
        }
    }
    Ok(())
}
