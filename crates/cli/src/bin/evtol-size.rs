use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use evtol_cli::{StudyArgs, init_tracing};
use evtol_sizing::design::OptimizationResult;
use evtol_sizing::export::{ResultRecord, write_summary};
use evtol_sizing::units::Unit;
use evtol_sizing::weight::SizingResult;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Close the takeoff weight of one vehicle on one mission"
)]
struct Cli {
    #[command(flatten)]
    study: StudyArgs,

    /// Run the problem manifest's optimization section instead of a plain sizing
    #[arg(long, default_value_t = false)]
    optimize: bool,

    /// Append the result as one row to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write a JSON summary of the sizing to this path (`-` for stdout)
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let study = cli.study.load()?;

    if cli.optimize {
        let result = study.optimize()?;
        print_optimization(&result);
        if let Some(path) = &cli.csv {
            let mut record = ResultRecord::new()
                .with_label("vehicle", study.vehicle.name.as_str())
                .with_label("success", result.success.to_string());
            for (name, quantity) in &result.design {
                record.push(name.as_str(), quantity.value, quantity.unit);
            }
            record.extend(&result.outputs);
            record.append_csv(path)?;
        }
        return Ok(exit_code(result.success));
    }

    let result = study.size()?;
    print_sizing(&result);
    if let Some(path) = &cli.csv {
        ResultRecord::from_outputs(&result.outputs())
            .with_label("vehicle", result.vehicle.name.as_str())
            .with_label("converged", result.converged.to_string())
            .append_csv(path)?;
    }
    if let Some(path) = &cli.json {
        write_summary(path, &result)?;
    }
    Ok(exit_code(result.converged))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn print_sizing(result: &SizingResult) {
    let w = &result.weights;
    println!("{} ({} takeoff weight)", result.vehicle.name, result.weight_type);
    println!("  takeoff      {:>10.1} kg", result.takeoff_weight_kg());
    println!("  payload      {:>10.1} kg", w.payload_kg);
    println!("  battery      {:>10.1} kg", w.battery_kg);
    println!("  propulsion   {:>10.1} kg", w.propulsion_kg);
    println!("  structure    {:>10.1} kg", w.structure_kg);
    println!("  equipment    {:>10.1} kg", w.equipment_kg);
    println!("  energy       {:>10.2} kWh", result.energy_wh() / 1_000.0);
    println!("  residual     {:>10.2e} kg^2", result.residual());
    println!(
        "  converged    {:>10} ({} iterations)",
        result.converged, result.iterations
    );
    if !result.converged {
        println!("  {}", result.message);
    }
}

fn print_optimization(result: &OptimizationResult) {
    println!(
        "optimization {} after {} iterations: {}",
        if result.success { "succeeded" } else { "failed" },
        result.iterations,
        result.message
    );
    println!("  {:<32} {:>12.4}", result.objective_name, result.objective);
    for (name, quantity) in &result.design {
        println!("  {:<32} {:>12.4} {}", name, quantity.value, quantity.unit);
    }
    for constraint in &result.constraints {
        println!(
            "  {:<32} {:>12.4} {} {}",
            constraint.name,
            constraint.value,
            constraint.unit,
            if constraint.satisfied { "ok" } else { "VIOLATED" }
        );
    }
    if let Ok(takeoff) = result.get("Weight|takeoff", Unit::Kilogram) {
        println!("  takeoff weight {takeoff:.1} kg");
    }
}
