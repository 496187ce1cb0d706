use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use pv_segmentation_dataset::logging::setup_logging;
use pv_segmentation_dataset::{AttributionConfig, LabelAttribution};

fn main() -> ExitCode {
    let Some(config_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: pv-segmentation-dataset <config.json>");
        return ExitCode::from(2);
    };

    let config = match AttributionConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(config.log_dir.as_deref()) {
        eprintln!("Failed to set up logging: {}", e);
        return ExitCode::FAILURE;
    }
    info!("Loaded attribution config from {:?}", config_path);

    let report = LabelAttribution::from_config(&config).and_then(|engine| engine.run());
    match report {
        Ok(report) => {
            info!(
                "Done: {} attributed ({} positive), {} train rows -> {:?}, {} test rows -> {:?}",
                report.attributed_rows,
                report.positive_rows,
                report.train_rows,
                report.train_path,
                report.test_rows,
                report.test_path
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Attribution failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
