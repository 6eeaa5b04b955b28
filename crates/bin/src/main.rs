//! Quantumflow CLI binary.
//!
//! Trains demand models from sales CSVs, forecasts with saved artifacts and
//! turns demand statistics into order recommendations.

mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use quantumflow::features::{HolidayCalendar, WeatherTable, available_features};
use quantumflow::inventory::{IndentPolicy, recommend_order};
use quantumflow::io::{
    read_holidays_csv, read_lead_times_csv, read_promotions_csv, read_sales_csv, read_weather_csv,
};
use quantumflow::{
    Config, ExportFormat, Exporter, FeatureImportance, ModelHandle, Pipeline, forecast_records,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "quantumflow")]
#[command(about = "Quantumflow: demand forecasting and replenishment", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults apply to anything not set)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Enrichment inputs shared by training and forecasting
#[derive(clap::Args)]
struct Inputs {
    /// Sales history CSV (Date,SKU_ID,Sales_Channel,Sales_Quantity,...)
    #[arg(long)]
    sales: PathBuf,

    /// Promotions CSV (Date,SKU_ID,Promo_Flag)
    #[arg(long)]
    promos: Option<PathBuf>,

    /// Holiday dates CSV (Date)
    #[arg(long)]
    holidays: Option<PathBuf>,

    /// Daily weather CSV (Date,temp_max,temp_min,precip_mm)
    #[arg(long)]
    weather: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => Self::Csv,
            OutputFormat::Json => Self::PrettyJson,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Select a backend, train it and save the model artifact
    Train {
        #[command(flatten)]
        inputs: Inputs,

        /// Output path for the model artifact (JSON)
        #[arg(long)]
        out: PathBuf,
    },

    /// Forecast every feature row of a sales history with a saved model
    Forecast {
        #[command(flatten)]
        inputs: Inputs,

        /// Model artifact written by `train`
        #[arg(long)]
        model: PathBuf,

        /// Quantile level (falls back to the base model when not trained)
        #[arg(long)]
        quantile: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Recommend an order quantity for one SKU
    Indent {
        /// Mean daily demand
        #[arg(long)]
        mean: f64,

        /// Standard deviation of daily demand
        #[arg(long)]
        std: f64,

        /// Lead time in days (required unless read from `--lead-times`)
        #[arg(long)]
        lead_time: Option<u32>,

        /// Lead-time master CSV (SKU_ID,Lead_Time_Days,Order_Multiple,MOQ,Shelf_Life_Days)
        #[arg(long, requires = "sku")]
        lead_times: Option<PathBuf>,

        /// SKU to look up in `--lead-times`
        #[arg(long, requires = "lead_times")]
        sku: Option<String>,

        /// Units on hand
        #[arg(long)]
        on_hand: f64,

        /// Service level (overrides the configured policy)
        #[arg(long)]
        service_level: Option<f64>,

        /// Minimum order quantity
        #[arg(long)]
        moq: Option<u32>,

        /// Order multiple
        #[arg(long)]
        multiple: Option<u32>,

        /// Shelf life in days
        #[arg(long)]
        shelf_life: Option<u32>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// List the feature catalog
    Features,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.json);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Train { inputs, out } => train(config, &inputs, &out)?,
        Commands::Forecast {
            inputs,
            model,
            quantile,
            format,
        } => forecast(config, &inputs, &model, quantile, format)?,
        Commands::Indent {
            mean,
            std,
            lead_time,
            lead_times,
            sku,
            on_hand,
            service_level,
            moq,
            multiple,
            shelf_life,
            format,
        } => {
            let service_level = service_level.unwrap_or(config.policy.service_level);
            let (defaults, master_lead_time) = match (&lead_times, &sku) {
                (Some(path), Some(sku)) => {
                    let record = read_lead_times_csv(path)?
                        .into_iter()
                        .find(|r| &r.sku_id == sku)
                        .ok_or_else(|| format!("SKU {sku} not found in {}", path.display()))?;
                    (record.policy(service_level)?, Some(record.lead_time_days))
                }
                _ => (config.policy, None),
            };
            let lead_time = lead_time
                .or(master_lead_time)
                .ok_or("--lead-time is required without --lead-times")?;
            let policy = IndentPolicy {
                service_level,
                moq: moq.unwrap_or(defaults.moq),
                multiple: multiple.unwrap_or(defaults.multiple),
                shelf_life_days: shelf_life.or(defaults.shelf_life_days),
                reorder_point_days: defaults.reorder_point_days,
            };
            let recommendation = recommend_order(mean, std, lead_time, on_hand, &policy)?;
            println!("{}", recommendation.export_to_string(format.into())?);
        }
        Commands::Features => list_features(),
    }

    Ok(())
}

fn pipeline(config: Config, inputs: &Inputs) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let mut pipeline = Pipeline::new(config)?;
    if let Some(path) = &inputs.promos {
        pipeline = pipeline.with_promotions(read_promotions_csv(path)?)?;
    }
    if let Some(path) = &inputs.holidays {
        pipeline = pipeline.with_enricher(HolidayCalendar::new(read_holidays_csv(path)?));
    }
    if let Some(path) = &inputs.weather {
        pipeline = pipeline.with_enricher(WeatherTable::new(read_weather_csv(path)?));
    }
    Ok(pipeline)
}

fn train(config: Config, inputs: &Inputs, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = pipeline(config, inputs)?;
    let sales = read_sales_csv(&inputs.sales)?;
    let handle = pipeline.train(&sales)?;
    handle.save(out)?;

    let importances_path = out.with_extension("importances.csv");
    FeatureImportance::from_model(handle.model())
        .export_to_file(&importances_path, ExportFormat::Csv)?;

    info!(
        model = handle.name(),
        artifact = %out.display(),
        importances = %importances_path.display(),
        "Saved model"
    );
    Ok(())
}

fn forecast(
    config: Config,
    inputs: &Inputs,
    model: &Path,
    quantile: Option<f64>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = ModelHandle::load(model)?;
    let pipeline = pipeline(config, inputs)?;
    let sales = read_sales_csv(&inputs.sales)?;
    let features = pipeline.build_features(&sales)?;
    let frame = pipeline.forecast_frame(&handle, &features, quantile)?;
    let records = forecast_records(&frame)?;
    print!("{}", records.export_to_string(format.into())?);
    Ok(())
}

fn list_features() {
    println!("{:<14} {:<10} {:<6} DESCRIPTION", "NAME", "CATEGORY", "MODEL");
    for feature in available_features() {
        println!(
            "{:<14} {:<10} {:<6} {}",
            feature.name,
            format!("{:?}", feature.category),
            if feature.model_input { "yes" } else { "no" },
            feature.description
        );
    }
}
