//! Generate a synthetic patient vitals dataset
//!
//! Usage: cargo run --bin gen_data -- --rows 500 --out risk_data.csv

use anyhow::Result;
use ndarray_rand::rand_distr::Normal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use risk_nn::nn::sigmoid;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut out_path = "risk_data.csv".to_string();
    let mut rows = 500usize;
    let mut seed = 7u64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--out" | "-o" => {
                out_path = args.get(i + 1).cloned().unwrap_or(out_path);
                i += 2;
            }
            "--rows" | "-n" => {
                rows = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(rows);
                i += 2;
            }
            "--seed" => {
                seed = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(seed);
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

    let mut rng = StdRng::seed_from_u64(seed);
    let bp_noise = Normal::new(0.0, 9.0)?;
    let glucose_noise = Normal::new(0.0, 14.0)?;

    let mut writer = csv::Writer::from_path(&out_path)?;
    writer.write_record(["Age", "BloodPressure", "Glucose", "Risk"])?;

    // Vitals drift upward with age; the label is sampled from a logistic
    // model over the same three columns, so the dataset is learnable but
    // not perfectly separable.
    let mut positives = 0usize;
    for _ in 0..rows {
        let age: f64 = rng.gen_range(25.0..80.0);
        let blood_pressure = 95.0 + (age - 25.0) * 0.5 + rng.sample(bp_noise);
        let glucose = 75.0 + (age - 25.0) * 0.8 + rng.sample(glucose_noise);

        let logit = 0.06 * (age - 52.0)
            + 0.04 * (blood_pressure - 122.0)
            + 0.03 * (glucose - 108.0);
        let risk = usize::from(rng.gen::<f64>() < sigmoid(logit));
        positives += risk;

        writer.write_record([
            format!("{:.0}", age),
            format!("{:.0}", blood_pressure),
            format!("{:.0}", glucose),
            risk.to_string(),
        ])?;
    }
    writer.flush()?;

    println!(
        "Wrote {} rows to {} ({} high risk, {} low risk)",
        rows,
        out_path,
        positives,
        rows - positives
    );

    Ok(())
}

fn print_help() {
    println!("Generate a synthetic patient vitals dataset for training");
    println!();
    println!("USAGE:");
    println!("    cargo run --bin gen_data -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -o, --out <PATH>          Output CSV file (default: risk_data.csv)");
    println!("    -n, --rows <N>            Number of rows to generate (default: 500)");
    println!("        --seed <N>            RNG seed (default: 7)");
    println!("        --help                Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    cargo run --bin gen_data -- --rows 1000 --out risk_data.csv");
}
