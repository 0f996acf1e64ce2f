use anyhow::Result;
use std::io::{self, Write};

use fitlens_engine::calibration::{BodyRegion, CalibrationStore};
use fitlens_engine::config::Config;
use fitlens_engine::measure::DepthRatioSet;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load_or_default(CONFIG_PATH);
    let mut store = CalibrationStore::load(&config.engine.calibration_path);

    println!("=== FitLens Calibration Tool ===");
    println!("Profile: {}", config.engine.calibration_path);
    println!();
    println!("Commands:");
    println!("  chest <system> <actual>  - record chest feedback (cm)");
    println!("  waist <system> <actual>  - record waist feedback (cm)");
    println!("  hip <system> <actual>    - record hip feedback (cm)");
    println!("  stats                    - show per-region error stats");
    println!("  ratios <c> <w> <h>       - set depth ratios");
    println!("  reset                    - reset profile to defaults");
    println!("  q                        - quit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let parts: Vec<&str> = input.trim().split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            region @ ("chest" | "waist" | "hip") if parts.len() == 3 => {
                let region = match region {
                    "chest" => BodyRegion::Chest,
                    "waist" => BodyRegion::Waist,
                    _ => BodyRegion::Hip,
                };
                let system: f32 = parts[1].parse()?;
                let actual: f32 = parts[2].parse()?;
                match store.ingest_feedback(region, system, actual) {
                    Ok(()) => {
                        let stats = store.stats(region);
                        println!(
                            "{}: factor is now {:.4} ({} samples)",
                            region.as_str(),
                            stats.factor,
                            stats.samples
                        );
                    }
                    Err(e) => println!("rejected: {e}"),
                }
            }
            "stats" => {
                for region in [BodyRegion::Chest, BodyRegion::Waist, BodyRegion::Hip] {
                    let s = store.stats(region);
                    println!(
                        "{:<6} factor {:.4}  mean error {:+.2} cm  std {:.2} cm  ({} samples)",
                        region.as_str(),
                        s.factor,
                        s.mean_error_cm,
                        s.std_error_cm,
                        s.samples
                    );
                }
                println!("total measurements: {}", store.profile().measurements_count);
            }
            "ratios" if parts.len() == 4 => {
                let chest: f32 = parts[1].parse()?;
                let waist: f32 = parts[2].parse()?;
                let hip: f32 = parts[3].parse()?;
                store.update_depth_ratios(DepthRatioSet::new(chest, waist, hip))?;
                println!("depth ratios updated");
            }
            "reset" => {
                store.reset()?;
                println!("profile reset");
            }
            "q" => {
                println!("bye");
                break;
            }
            _ => {
                println!("unknown command: {}", parts[0]);
            }
        }
    }

    Ok(())
}
