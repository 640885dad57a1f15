use std::path::Path;

use ecoroute_core::cost::ModelEvaluation;
use ecoroute_core::learning::grid_search::CandidateScore;
use ecoroute_core::loading::CleaningStats;
use ecoroute_core::loading::weather::write_weather;
use ecoroute_core::prelude::*;
use log::info;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    observations: usize,
    cleaning: CleaningStats,
    weather_days: usize,
    distance: ModelEvaluation,
    emission: ModelEvaluation,
    cost: ModelEvaluation,
    grid_scores: Option<&'a [CandidateScore]>,
}

fn create_output_dir(path: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to create directory '{}': {}", path.display(), e),
        ))
    })
}

/// Cleans the configured counter file and writes the cleaned rows
///
/// # Errors
///
/// Returns an error if the input cannot be read or the output written.
pub fn clean(
    config: &PipelineConfig,
    output: Option<&Path>,
) -> Result<(Vec<ArcObservation>, CleaningStats), Error> {
    let (observations, stats) = load_observations(&config.counts_path, config.chunk_size)?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => {
            create_output_dir(&config.output_dir)?;
            config.cleaned_counts_path()
        }
    };
    write_cleaned(&output, &observations)?;
    Ok((observations, stats))
}

/// # Errors
///
/// Returns an error if the input cannot be read or the output written.
pub fn clean_weather(input: &Path, output: &Path) -> Result<(), Error> {
    let table = read_weather(input)?;
    write_weather(output, &table)
}

/// Trains both models and writes every artifact to the output directory:
/// the two models as JSON, the arc cost table and a training report.
///
/// # Errors
///
/// Returns an error if the data cannot be loaded, training fails, or an
/// artifact cannot be written.
pub fn train_models(config: &PipelineConfig) -> Result<TrainingReport, Error> {
    let (observations, stats) = load_observations(&config.counts_path, config.chunk_size)?;
    if observations.is_empty() {
        return Err(Error::EmptyDataset("no usable counter rows"));
    }

    let weather = config
        .weather_path
        .as_deref()
        .map(read_weather)
        .transpose()?;

    let report = train(&observations, weather.as_ref(), &config.training)?;

    create_output_dir(&config.output_dir)?;
    save_json(&config.arc_model_path(), &report.arc_model)?;
    save_json(&config.cost_model_path(), &report.cost_model)?;
    write_arc_costs(&config.arc_costs_path(), &report.arc_costs)?;
    save_json(
        &config.report_path(),
        &ReportFile {
            observations: observations.len(),
            cleaning: stats,
            weather_days: weather.as_ref().map_or(0, WeatherTable::len),
            distance: report.distance,
            emission: report.emission,
            cost: report.cost,
            grid_scores: report.grid_scores.as_deref(),
        },
    )?;

    info!("Wrote models and arc costs to {}", config.output_dir.display());
    Ok(report)
}
