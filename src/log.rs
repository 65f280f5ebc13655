use crate::AnalysisReport;
use crate::config::AnalysisConfig;
use std::time::Duration;

pub fn show_greeting(action: &str) {
    println!("=== SLP Minimum Tracker ===");
    println!("{}", action);
}

pub fn config_echo(config: &AnalysisConfig) {
    let w = &config.window;
    println!("\nConfiguration:");
    println!("  Grid: {} x {}", config.shape.rows, config.shape.cols);
    println!(
        "  Window: rows {}..={}, columns {}..={} ({} cells)",
        w.min_row,
        w.max_row,
        w.min_col,
        w.max_col,
        w.cell_count()
    );
    for (name, dataset) in [("A", &config.dataset_a), ("B", &config.dataset_b)] {
        println!(
            "  Dataset {}: {} ({}*, {})",
            name,
            dataset.label,
            dataset.file_prefix,
            dataset.text.file_name(0)
        );
    }
    println!("  Chart: {}", config.chart.output.display());
}

pub fn show_run_summary(config: &AnalysisConfig, report: &AnalysisReport) {
    println!(
        "\n{} timesteps of each dataset analysed.",
        report.a.len()
    );
    for (dataset, series) in [(&config.dataset_a, &report.a), (&config.dataset_b, &report.b)] {
        if let Some((step, deepest)) = series.deepest() {
            println!(
                "  {}: deepest minimum {:.2} at timestep {} (row {}, col {})",
                dataset.label, deepest.value, step, deepest.row, deepest.col
            );
        }
    }
    if let Some((lo, hi)) = report.difference.value_range() {
        println!(
            "  {} - {}: difference between {:.2} and {:.2}",
            config.dataset_b.label, config.dataset_a.label, lo, hi
        );
    }
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!(
        "\n=== Analysis completed in {:.2}s ===",
        elapsed.as_secs_f64()
    );
}
