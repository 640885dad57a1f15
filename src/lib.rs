//! Command line front-end: data cleaning, model training and routing over
//! the arc cost graph.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ecoroute_core::prelude::*;

pub mod pipeline;
pub mod routing;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// TOML pipeline configuration, defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "clean a raw counter export and derive distance and CO2 per row")]
    Clean {
        /// counter export, overrides `counts_path`
        #[arg(long)]
        input: Option<PathBuf>,
        /// cleaned file, defaults to `<output_dir>/comptages_clean.csv`
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    #[command(name = "clean-weather", about = "keep the model columns of a daily weather file")]
    CleanWeather {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    #[command(about = "train the arc and cost models and write the arc cost table")]
    Train {
        /// cleaned or raw counter file, overrides `counts_path`
        #[arg(long)]
        counts: Option<PathBuf>,
        /// daily weather file, overrides `weather_path`
        #[arg(long)]
        weather: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// fit the cost model with the base parameters, skipping the grid search
        #[arg(long)]
        no_tune: bool,
        /// price arcs with measured distance and emission instead of model output
        #[arg(long)]
        observed_costs: bool,
    },
    #[command(about = "least-cost route over the arc cost graph")]
    Route {
        /// arc cost table, defaults to `<output_dir>/couts_arcs.csv`
        #[arg(long)]
        arc_costs: Option<PathBuf>,
        /// start node id
        #[arg(long, requires = "to")]
        from: Option<NodeId>,
        /// end node id
        #[arg(long, requires = "from")]
        to: Option<NodeId>,
        /// start coordinate, snapped to the nearest node
        #[arg(long, num_args = 2, value_names = ["LAT", "LON"], allow_negative_numbers = true, requires = "to_point")]
        from_point: Option<Vec<f64>>,
        /// end coordinate, snapped to the nearest node
        #[arg(long, num_args = 2, value_names = ["LAT", "LON"], allow_negative_numbers = true, requires = "from_point")]
        to_point: Option<Vec<f64>>,
        /// route between two random nodes of the same component
        #[arg(long, conflicts_with_all = ["from", "from_point"])]
        random: bool,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// write the route legs as a GeoJSON FeatureCollection
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
}

/// Loads the pipeline configuration named on the command line
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub fn load_config(args: &CliArgs) -> Result<PipelineConfig, Error> {
    match &args.config {
        Some(path) => {
            log::info!("Reading pipeline configuration from {}", path.display());
            PipelineConfig::from_toml_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// # Errors
///
/// Returns the first error raised by the selected command.
pub fn run(args: &CliArgs) -> Result<(), Error> {
    let mut config = load_config(args)?;

    match &args.command {
        Command::Clean {
            input,
            output,
            chunk_size,
        } => {
            if let Some(input) = input {
                config.counts_path.clone_from(input);
            }
            if let Some(chunk_size) = chunk_size {
                config.chunk_size = *chunk_size;
            }
            config.validate()?;
            pipeline::clean(&config, output.as_deref()).map(|_| ())
        }
        Command::CleanWeather { input, output } => pipeline::clean_weather(input, output),
        Command::Train {
            counts,
            weather,
            output_dir,
            seed,
            no_tune,
            observed_costs,
        } => {
            if let Some(counts) = counts {
                config.counts_path.clone_from(counts);
            }
            if weather.is_some() {
                config.weather_path.clone_from(weather);
            }
            if let Some(output_dir) = output_dir {
                config.output_dir.clone_from(output_dir);
            }
            if let Some(seed) = seed {
                config.training.seed = *seed;
            }
            if *no_tune {
                config.training.tune_cost_model = false;
            }
            if *observed_costs {
                config.training.cost_source = CostSource::Observed;
            }
            config.validate()?;
            pipeline::train_models(&config).map(|_| ())
        }
        Command::Route {
            arc_costs,
            from,
            to,
            from_point,
            to_point,
            random,
            seed,
            geojson,
        } => {
            let endpoints = match (from, to, from_point, to_point) {
                _ if *random => routing::Endpoints::Random { seed: *seed },
                (Some(from), Some(to), _, _) => routing::Endpoints::Nodes {
                    from: *from,
                    to: *to,
                },
                (_, _, Some(from), Some(to)) => routing::Endpoints::Points {
                    from: routing::lat_lon(from)?,
                    to: routing::lat_lon(to)?,
                },
                _ => {
                    return Err(Error::ConfigError(
                        "give --from/--to, --from-point/--to-point or --random".to_string(),
                    ));
                }
            };
            let path = arc_costs
                .clone()
                .unwrap_or_else(|| config.arc_costs_path());
            let summary = routing::route(&path, config.aggregation, endpoints, geojson.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
