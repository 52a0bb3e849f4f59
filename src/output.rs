use crate::config::SimulationConfig;
use crate::error::Result;
use crate::loader::SkuPaths;
use crate::orchestrator::SimulationReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Summary statistics for a simulation run.
#[derive(Debug, Serialize)]
pub struct SummaryMetrics {
    pub sku: String,
    pub iterations: usize,
    pub days_to_simulate: usize,
    pub best_distance: Option<f64>,
    pub best_iteration: Option<usize>,
    pub best_improvements: usize,
    pub accepted_simulations: usize,
    pub rejected_simulations: usize,
    pub mean_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub final_tolerance: f64,
    pub best_trajectory: Vec<f64>,
    pub average_prices: Vec<f64>,
    pub final_parameters: BTreeMap<String, f64>,
    pub denormalized_parameters: BTreeMap<String, f64>,
    pub raw_features: BTreeMap<String, f64>,
}

pub fn compute_summary(report: &SimulationReport) -> SummaryMetrics {
    let distances: Vec<f64> = report.iterations.iter().map(|r| r.distance).collect();
    let n = distances.len().max(1) as f64;

    SummaryMetrics {
        sku: report.sku.clone(),
        iterations: report.iterations.len(),
        days_to_simulate: report.days_to_simulate,
        best_distance: report.best_iteration.map(|_| report.best_distance),
        best_iteration: report.best_iteration,
        best_improvements: report.best_improvements,
        accepted_simulations: report.accepted_simulations,
        rejected_simulations: report.rejected_simulations,
        mean_distance: distances.iter().sum::<f64>() / n,
        min_distance: if distances.is_empty() {
            0.0
        } else {
            distances.iter().cloned().fold(f64::INFINITY, f64::min)
        },
        max_distance: distances.iter().cloned().fold(0.0_f64, f64::max),
        final_tolerance: report.final_tolerance,
        best_trajectory: report.best_trajectory.clone(),
        average_prices: report.average_prices.clone(),
        final_parameters: report
            .final_parameters
            .iter()
            .map(|p| (p.name.clone(), p.probability))
            .collect(),
        denormalized_parameters: report.denormalized_parameters.clone(),
        raw_features: report.raw_features.clone(),
    }
}

/// Per-iteration statistics CSV, one column per parameter after the
/// fixed ones.
pub fn save_statistics_csv(report: &SimulationReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = [
        "Iteration",
        "AverageSaleValue",
        "MinSaleValue",
        "MaxSaleValue",
        "Distance",
        "Tolerance",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(report.initial_parameters.iter().map(|p| p.name.clone()));
    wtr.write_record(&header)?;

    for r in &report.iterations {
        let mut row = vec![
            r.iteration.to_string(),
            format!("{:.4}", r.average_price),
            format!("{:.4}", r.min_price),
            format!("{:.4}", r.max_price),
            format!("{:.6}", r.distance),
            format!("{:.6}", r.tolerance),
        ];
        row.extend(r.parameters.iter().map(|(_, v)| format!("{:.6}", v)));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Human-readable run log.
pub fn render_simulation_log(report: &SimulationReport, config: &SimulationConfig) -> String {
    let mut log = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        log,
        "Starting simulation for SKU {} with {} iterations, {} days to simulate, and tolerance {}",
        report.sku, config.number_of_iterations, report.days_to_simulate, config.tolerance
    );

    let _ = writeln!(log, "\nInitial parameters:");
    for p in &report.initial_parameters {
        let _ = writeln!(log, "  {}: {}", p.name, p.probability);
    }

    let _ = writeln!(log, "\n--- Starting main simulation loop ---");
    for r in &report.iterations {
        let _ = writeln!(log, "\nIteration {} of {}", r.iteration, report.iterations.len());
        let _ = writeln!(log, "  Distance: {:.6}", r.distance);
        if report.best_iteration == Some(r.iteration) {
            let _ = writeln!(log, "  -> Best simulation of the run");
        }
        let _ = writeln!(log, "  Simulation summary:");
        let _ = writeln!(log, "    Initial price: {:.4}", r.initial_price);
        let _ = writeln!(log, "    Average price: {:.4}", r.average_price);
        let _ = writeln!(log, "    Min price: {:.4}", r.min_price);
        let _ = writeln!(log, "    Max price: {:.4}", r.max_price);
        let _ = writeln!(log, "    Refinement proposals accepted: {}", r.refinement_accepted);
        if r.accepted {
            let _ = writeln!(log, "  Simulation accepted (tolerance {:.6})", r.tolerance);
        } else {
            let _ = writeln!(log, "  Simulation rejected (tolerance {:.6})", r.tolerance);
        }
    }
    let _ = writeln!(log, "\n--- Finishing main simulation loop ---");

    let _ = writeln!(log, "\nFinal Results:");
    match report.best_iteration {
        Some(iteration) => {
            let _ = writeln!(log, "Best simulation distance: {:.6}", report.best_distance);
            let _ = writeln!(log, "Best simulation iteration: {}", iteration);
            let _ = writeln!(log, "Best simulation improvements: {}", report.best_improvements);
            let _ = writeln!(log, "Best simulation prices:");
            for (day, price) in report.best_trajectory.iter().enumerate() {
                let _ = writeln!(log, "  Day {}: {:.4}", day + 1, price);
            }
        }
        None => {
            let _ = writeln!(log, "No satisfactory simulation found.");
        }
    }
    let _ = writeln!(log, "Total accepted simulations: {}", report.accepted_simulations);
    let _ = writeln!(log, "Total rejected simulations: {}", report.rejected_simulations);
    let _ = writeln!(log, "Final tolerance: {:.6}", report.final_tolerance);

    let _ = writeln!(log, "\nAverage prices across all simulations:");
    for (day, price) in report.average_prices.iter().enumerate() {
        let _ = writeln!(log, "  Day {}: {:.4}", day + 1, price);
    }

    let _ = writeln!(log, "\nFinal parameters:");
    for p in &report.final_parameters {
        let _ = writeln!(log, "  {}: {}", p.name, p.probability);
    }

    let _ = writeln!(log, "\nFinal parameters (denormalized):");
    for (name, value) in &report.denormalized_parameters {
        match report.raw_features.get(name) {
            Some(raw) => {
                let _ = writeln!(log, "  {}: {} (observed {})", name, value, raw);
            }
            None => {
                let _ = writeln!(log, "  {}: {}", name, value);
            }
        }
    }

    if !report.raw_features.is_empty() {
        let _ = writeln!(log, "\nObserved feature values:");
        for (name, value) in &report.raw_features {
            let _ = writeln!(log, "  {}: {}", name, value);
        }
    }
    log
}

pub fn save_simulation_log(
    report: &SimulationReport,
    config: &SimulationConfig,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_simulation_log(report, config))?;
    Ok(())
}

pub fn save_summary_json(summary: &SummaryMetrics, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Write the statistics CSV, run log and JSON summary for one run.
pub fn save_all(report: &SimulationReport, config: &SimulationConfig, paths: &SkuPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.output_dir)?;
    save_statistics_csv(report, &paths.statistics())?;
    save_simulation_log(report, config, &paths.simulation_log())?;
    save_summary_json(&compute_summary(report), &paths.summary())?;
    Ok(())
}
