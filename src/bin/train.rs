//! Train the risk model on patient vitals
//!
//! Usage: cargo run --bin train -- --data risk_data.csv --epochs 50

use anyhow::Result;
use risk_nn::{pipeline, PipelineConfig, ScalerFit};
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut config = PipelineConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data" | "-d" => {
                if let Some(v) = args.get(i + 1) {
                    config.input_path = PathBuf::from(v);
                }
                i += 2;
            }
            "--model" | "-m" => {
                if let Some(v) = args.get(i + 1) {
                    config.model_path = PathBuf::from(v);
                }
                i += 2;
            }
            "--lite" | "-l" => {
                if let Some(v) = args.get(i + 1) {
                    config.lite_path = PathBuf::from(v);
                }
                i += 2;
            }
            "--epochs" | "-e" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    config.epochs = v;
                }
                i += 2;
            }
            "--batch" | "-b" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    config.batch_size = v;
                }
                i += 2;
            }
            "--lr" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    config.learning_rate = v;
                }
                i += 2;
            }
            "--seed" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    config.seed = v;
                }
                i += 2;
            }
            "--test-ratio" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    config.test_ratio = v;
                }
                i += 2;
            }
            "--fit-train-only" => {
                config.scaler_fit = ScalerFit::TrainOnly;
                i += 1;
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
    println!("                     Risk Model Training");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("Input:       {}", config.input_path.display());
    println!("Features:    {}", config.feature_columns.join(", "));
    println!("Label:       {}", config.label_column);
    println!("Epochs:      {}, batch size {}", config.epochs, config.batch_size);
    println!();

    let report = pipeline::run(&config)?;

    println!("─────────────────────────────────────────────────────────────────");
    println!();
    println!("Dataset: {} rows ({} train / {} test)", report.rows, report.train_rows, report.test_rows);

    if let (Some(first), Some(last)) = (report.history.epochs.first(), report.history.final_epoch())
    {
        println!("  Initial loss:   {:.6}", first.loss);
        println!("  Final loss:     {:.6}", last.loss);
        println!("  Final accuracy: {:.4}", last.accuracy);
        if first.loss > 0.0 {
            println!(
                "  Improvement:    {:.2}%",
                (first.loss - last.loss) / first.loss * 100.0
            );
        }
    }
    println!("  Test loss:      {:.6}", report.test_loss);
    println!("  Test accuracy:  {:.4}", report.test_accuracy);
    println!();
    println!("Artifacts:");
    println!(
        "  Full model: {} ({} bytes)",
        report.model_path.display(),
        report.model_bytes
    );
    println!(
        "  Lite model: {} ({} bytes)",
        report.lite_path.display(),
        report.lite_bytes
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                     Training Complete!");
    println!("═══════════════════════════════════════════════════════════════");

    Ok(())
}

fn print_help() {
    println!("Train a neural network that predicts a binary health risk flag");
    println!();
    println!("USAGE:");
    println!("    cargo run --bin train -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -d, --data <PATH>         Input CSV data file (default: risk_data.csv)");
    println!("    -m, --model <PATH>        Output model file (default: risk_model.json)");
    println!("    -l, --lite <PATH>         Output lite model file (default: risk_model.lite)");
    println!("    -e, --epochs <N>          Number of training epochs (default: 50)");
    println!("    -b, --batch <SIZE>        Batch size (default: 8)");
    println!("        --lr <RATE>           Learning rate (default: 0.001)");
    println!("        --seed <N>            Seed for split, init and shuffle (default: 42)");
    println!("        --test-ratio <R>      Held-out fraction in (0, 1) (default: 0.2)");
    println!("        --fit-train-only      Fit the feature scaler on training rows only");
    println!("        --help                Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    cargo run --bin train -- --data risk_data.csv --epochs 50");
    println!("    cargo run --bin train -- -d vitals.csv -m risk.json -e 100 -b 16");
}
