use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use slptrack::chart::write_chart;
use slptrack::cli::{Cli, Commands, ConfigFormat, RunOverrides};
use slptrack::config::AnalysisConfig;
use slptrack::log::{config_echo, show_farewell_with_timing, show_greeting, show_run_summary};
use slptrack::{AnalysisReport, analyze_netcdf_dir, analyze_text_dir, run_pipeline};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Run {
            input_dir,
            overrides,
        } => {
            let action = format!(
                "Extracting and analysing raw files in {}",
                input_dir.display()
            );
            run_analysis(&cli, overrides, &action, |config| {
                run_pipeline(config, input_dir).context("Run failed")
            })
        }
        Commands::Analyze {
            grid_dir,
            netcdf,
            overrides,
        } => {
            let action = format!("Analysing grids in {}", grid_dir.display());
            run_analysis(&cli, overrides, &action, |config| {
                if *netcdf {
                    analyze_netcdf_dir(config, grid_dir).context("NetCDF analysis failed")
                } else {
                    analyze_text_dir(config, grid_dir).context("Grid analysis failed")
                }
            })
        }
        Commands::Validate { config_file } => {
            let path = config_file
                .as_ref()
                .or(cli.config.as_ref())
                .context("No configuration file given (argument or --config)")?;
            validate_config(path)
        }
        Commands::Template { output, format } => {
            let config = AnalysisConfig::default();
            let text = match format {
                ConfigFormat::Json => config.to_json()?,
                ConfigFormat::Yaml => config.to_yaml()?,
            };
            match output {
                Some(path) => fs::write(path, text)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", text),
            }
            Ok(())
        }
        Commands::Completions { shell, output } => {
            let mut command = Cli::command();
            match output {
                Some(path) => {
                    let mut file = fs::File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    clap_complete::generate(*shell, &mut command, "slptrack", &mut file);
                }
                None => {
                    clap_complete::generate(*shell, &mut command, "slptrack", &mut io::stdout())
                }
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli, overrides: &RunOverrides) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    overrides.apply(&mut config);
    if cli.quiet {
        config.progress = false;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_analysis<F>(cli: &Cli, overrides: &RunOverrides, action: &str, analyze: F) -> Result<()>
where
    F: FnOnce(&AnalysisConfig) -> Result<AnalysisReport>,
{
    let start_time = Instant::now();
    let config = load_config(cli, overrides)?;

    if !cli.quiet {
        show_greeting(action);
        config_echo(&config);
    }

    let report = analyze(&config)?;
    write_chart(&config, &report.a, &report.b, &report.difference).with_context(|| {
        format!("Failed to write chart {}", config.chart.output.display())
    })?;

    if !cli.quiet {
        show_run_summary(&config, &report);
        println!("  Chart written to {}", config.chart.output.display());
        show_farewell_with_timing(start_time.elapsed());
    }
    Ok(())
}

fn validate_config(path: &Path) -> Result<()> {
    let config = AnalysisConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("{} is not valid", path.display()))?;
    println!("{} is valid.", path.display());
    config_echo(&config);
    Ok(())
}
