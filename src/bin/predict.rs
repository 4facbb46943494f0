//! Score patient rows with a trained lite model
//!
//! Usage: cargo run --bin predict -- --model risk_model.lite --data patients.csv

use anyhow::Result;
use risk_nn::data::Table;
use risk_nn::LiteModel;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut model_path = "risk_model.lite".to_string();
    let mut data_path = "risk_data.csv".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--model" | "-m" => {
                model_path = args.get(i + 1).cloned().unwrap_or(model_path);
                i += 2;
            }
            "--data" | "-d" => {
                data_path = args.get(i + 1).cloned().unwrap_or(data_path);
                i += 2;
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                i += 1;
            }
        }
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("                       Risk Scoring");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let model = LiteModel::load(&model_path)?;
    println!(
        "Loaded {} ({} layers, features: {})",
        model_path,
        model.layers.len(),
        model.feature_columns.join(", ")
    );

    let table = Table::from_csv_path(&data_path)?;
    let features = table.numeric_columns(&model.feature_columns)?;
    println!("Scoring {} rows from {}", table.len(), data_path);
    println!();
    println!("{:>5}  {:>11}  {:>5}", "row", "probability", "class");

    let mut flagged = 0usize;
    for (i, row) in features.rows().into_iter().enumerate() {
        let values = row.to_vec();
        let probability = model.predict_row(&values)?;
        let class = usize::from(probability >= 0.5);
        flagged += class;
        println!("{:>5}  {:>11.4}  {:>5}", i + 1, probability, class);
    }

    println!();
    println!("{} of {} rows flagged high risk", flagged, table.len());

    Ok(())
}

fn print_help() {
    println!("Score patient rows with a trained lite risk model");
    println!();
    println!("USAGE:");
    println!("    cargo run --bin predict -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -m, --model <PATH>        Lite model file (default: risk_model.lite)");
    println!("    -d, --data <PATH>         CSV file with the model's feature columns");
    println!("                              (default: risk_data.csv)");
    println!("        --help                Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    cargo run --bin predict -- --model risk_model.lite --data patients.csv");
}
