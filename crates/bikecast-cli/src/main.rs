//! # bikecast
//!
//! Command-line interface for the bikecast demand forecasting workflow.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bikecast_core::algorithms::arima::{Arima, ArimaOrder, ArimaSpec};
use bikecast_core::data::DailySeries;
use bikecast_core::diagnostics::{adf_test, kpss_test, ndiffs, Correlogram};
use bikecast_core::utils::preprocessing::difference;
use bikecast_forecast::{
    holdout, seasonal_strength, write_annotated_csv, write_forecast_csv, Analysis,
    AnalysisConfig, AnnotatedRow, DecompositionMethod, Deseasonalized, ForecastRow, ModelReport,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bikecast")]
#[command(about = "ARIMA demand forecasting for daily rental counts", long_about = None)]
struct Cli {
    /// Analysis settings (TOML); flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Input file and column selection shared by every command
#[derive(Args)]
struct Input {
    /// CSV file with one row per day
    #[arg(short, long)]
    input: PathBuf,

    /// Column holding the counts
    #[arg(long)]
    column: Option<String>,

    /// Column holding the dates
    #[arg(long)]
    date_column: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write its tables and report
    Analyze {
        #[command(flatten)]
        input: Input,

        /// Output directory for annotated.csv, forecast.csv and report.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Days to forecast
        #[arg(long)]
        horizon: Option<usize>,

        /// Manual refit order as p,d,q
        #[arg(long, value_parser = parse_order)]
        order: Option<ArimaOrder>,
    },

    /// Interpolate missing days and replace outliers
    Clean {
        #[command(flatten)]
        input: Input,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Weekly and monthly centered moving averages
    Smooth {
        #[command(flatten)]
        input: Input,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// STL decomposition of the weekly moving average
    Decompose {
        #[command(flatten)]
        input: Input,

        /// Seasonal period
        #[arg(long)]
        period: Option<usize>,

        /// Decomposition method: stl or classical
        #[arg(long)]
        method: Option<DecompositionMethod>,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// ADF and KPSS tests on the deseasonalized series
    Stationarity {
        #[command(flatten)]
        input: Input,

        /// Differences applied before testing
        #[arg(long, default_value = "0")]
        diff: usize,
    },

    /// ACF and PACF bar chart of the deseasonalized series
    Acf {
        #[command(flatten)]
        input: Input,

        /// Differences applied before computing the correlogram
        #[arg(long, default_value = "1")]
        diff: usize,

        /// Deepest lag shown
        #[arg(long)]
        max_lag: Option<usize>,
    },

    /// Fit an ARIMA model and check its residuals
    Fit {
        #[command(flatten)]
        input: Input,

        /// Order as p,d,q; selected automatically when omitted
        #[arg(long, value_parser = parse_order)]
        order: Option<ArimaOrder>,
    },

    /// Forecast with prediction intervals
    Forecast {
        #[command(flatten)]
        input: Input,

        /// Order as p,d,q; selected automatically when omitted
        #[arg(long, value_parser = parse_order)]
        order: Option<ArimaOrder>,

        /// Days to forecast
        #[arg(short, long)]
        steps: Option<usize>,

        /// Interval level in percent (repeatable)
        #[arg(short, long)]
        level: Vec<f64>,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a forecast of the final days against the actual values
    Evaluate {
        #[command(flatten)]
        input: Input,

        /// Order as p,d,q; selected automatically when omitted
        #[arg(long, value_parser = parse_order)]
        order: Option<ArimaOrder>,

        /// Days held out
        #[arg(long)]
        holdout: Option<usize>,
    },
}

/// Parse `p,d,q`
fn parse_order(s: &str) -> std::result::Result<ArimaOrder, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected p,d,q but got '{}'", s));
    }
    let mut values = [0usize; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .parse()
            .map_err(|_| format!("'{}' is not a non-negative integer", part))?;
    }
    Ok(ArimaOrder::new(values[0], values[1], values[2]))
}

/// Filter used when `RUST_LOG` is unset; targets match by prefix, so this
/// covers the library crates too
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "bikecast=debug"
    } else {
        "bikecast=info"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let config = AnalysisConfig::from_path(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_series(input: &Input, config: &mut AnalysisConfig) -> Result<DailySeries> {
    if let Some(column) = &input.column {
        config.csv.value_column = column.clone();
    }
    if let Some(column) = &input.date_column {
        config.csv.date_column = column.clone();
    }
    let series = DailySeries::from_csv_path(&input.input, &config.csv)
        .with_context(|| format!("Failed to load {}", input.input.display()))?;
    eprintln!(
        "Loaded {} days ({} to {}) from {:?}",
        series.len(),
        series.start(),
        series.end(),
        input.input.file_name().unwrap_or_default()
    );
    Ok(series)
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn blank_rows(series: &DailySeries) -> Vec<AnnotatedRow> {
    series
        .dates()
        .zip(series.values())
        .map(|(date, &count)| AnnotatedRow {
            date,
            count: count.is_finite().then_some(count),
            clean_count: None,
            ma_weekly: None,
            ma_monthly: None,
            seasonal: None,
            deseasonal: None,
            residual: None,
        })
        .collect()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Clean, smooth and deseasonalize; the common prefix of most commands
fn prepare(analysis: &Analysis, series: &DailySeries) -> Result<Deseasonalized> {
    let cleaned = analysis.clean(series)?;
    let smoothed = analysis.smooth(&cleaned.values)?;
    Ok(analysis.deseasonalize(&smoothed.weekly)?)
}

fn fit_model(
    analysis: &Analysis,
    data: &[f64],
    order: Option<ArimaOrder>,
) -> Result<(Arima, ModelReport)> {
    let spec = order.map(|o| ArimaSpec::new(o.p, o.d, o.q));
    let label = if spec.is_some() { "manual" } else { "auto" };
    let (model, tried) = analysis.fit(data, spec).context("Model fitting failed")?;
    let report = analysis.diagnose(label, &model, tried)?;
    Ok((model, report))
}

fn print_model(report: &ModelReport) {
    let summary = &report.summary;
    println!("\n=== {} ===", report.spec);
    if report.candidates > 0 {
        println!("Models tried: {}", report.candidates);
    }
    println!("Coefficients:");
    let std_errors = summary.std_errors.clone().unwrap_or_default();
    for (i, (name, value)) in summary.coefficients().iter().enumerate() {
        match std_errors.get(i) {
            Some(se) => println!("  {:<6} {:>12.4}  (s.e. {:.4})", name, value, se),
            None => println!("  {:<6} {:>12.4}", name, value),
        }
    }
    println!("sigma^2: {:.4}", summary.sigma2);
    println!("Log likelihood: {:.3}", summary.log_likelihood);
    println!(
        "AIC: {:.3}  AICc: {:.3}  BIC: {:.3}",
        summary.aic, summary.aicc, summary.bic
    );
    println!(
        "Ljung-Box: Q* = {:.4}, df = {}, p-value = {:.4}",
        report.ljung_box.statistic, report.ljung_box.df, report.ljung_box.p_value
    );
}

fn bar(value: f64, bound: f64, width: usize) -> String {
    let len = (value.abs() * width as f64).round() as usize;
    let mark = if value.abs() > bound { '#' } else { '=' };
    let body: String = std::iter::repeat(mark).take(len.min(width)).collect();
    if value < 0.0 {
        format!("{:>w$}|{:w$}", body, "", w = width)
    } else {
        format!("{:>w$}|{:<w$}", "", body, w = width)
    }
}

fn print_correlogram(correlogram: &Correlogram) {
    const WIDTH: usize = 25;
    let bound_col = (correlogram.bound * WIDTH as f64).round() as usize;
    println!(
        "Significance bound: +/-{:.4} (bars marked '#' exceed it, column {})",
        correlogram.bound, bound_col
    );
    println!("\n{:>4}  {:^w$}  {:^w$}", "lag", "ACF", "PACF", w = 2 * WIDTH + 1);
    for (i, lag) in correlogram.lags.iter().enumerate() {
        println!(
            "{:>4}  {}  {}  {:>7.3} {:>7.3}",
            lag,
            bar(correlogram.acf[i], correlogram.bound, WIDTH),
            bar(correlogram.pacf[i], correlogram.bound, WIDTH),
            correlogram.acf[i],
            correlogram.pacf[i]
        );
    }
    println!(
        "\nSignificant ACF lags: {:?}",
        correlogram.significant_acf_lags()
    );
    println!(
        "Significant PACF lags: {:?}",
        correlogram.significant_pacf_lags()
    );
}

fn run_analyze(
    mut config: AnalysisConfig,
    input: Input,
    output: Option<PathBuf>,
    horizon: Option<usize>,
    order: Option<ArimaOrder>,
) -> Result<()> {
    if let Some(horizon) = horizon {
        config.horizon = horizon;
    }
    if order.is_some() {
        config.manual_order = order;
    }
    config.validate()?;
    let series = load_series(&input, &mut config)?;

    let report = Analysis::new(config).run(&series).context("Analysis failed")?;

    println!(
        "Cleaning: {} missing, {} outliers",
        report.cleaning.missing.len(),
        report.cleaning.outliers.len()
    );
    println!(
        "{} period {}: seasonal strength {:.3}",
        report.decomposition.method,
        report.decomposition.period,
        report.decomposition.seasonal_strength
    );
    if let Some(p) = report.decomposition.detected_period {
        println!("Autocorrelation peak of daily changes at lag {}", p);
    }
    println!(
        "ADF weekly average: {:.4} (p = {:.4}); differenced: {:.4} (p = {:.4})",
        report.adf_smoothed.statistic,
        report.adf_smoothed.p_value,
        report.adf_differenced.statistic,
        report.adf_differenced.p_value
    );
    print_model(&report.auto_model);
    if let Some(manual) = &report.manual_model {
        print_model(manual);
    }
    if let Some(seasonal) = &report.seasonal_model {
        print_model(seasonal);
    }
    if let Some(eval) = &report.holdout {
        println!(
            "\nHoldout ({} days): RMSE {:.3}, MAPE {:.2}% (SMA({}) baseline: RMSE {:.3}, MAPE {:.2}%)",
            eval.actual.len(),
            eval.accuracy.rmse,
            eval.accuracy.mape,
            eval.baseline.window,
            eval.baseline.accuracy.rmse,
            eval.baseline.accuracy.mape
        );
    }

    match output {
        Some(dir) => {
            report
                .write_to_dir(&dir)
                .with_context(|| format!("Failed to write output to {}", dir.display()))?;
            println!("\nResults written to {:?}", dir);
        }
        None => {
            println!("\nForecast ({}):", report.forecast.label);
            for row in &report.forecast.rows {
                println!("  {}: {:.2}", row.date, row.mean);
            }
        }
    }
    Ok(())
}

fn run_clean(mut config: AnalysisConfig, input: Input, output: Option<PathBuf>) -> Result<()> {
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let cleaned = analysis.clean(&series)?;

    let mut rows = blank_rows(&series);
    for (row, &value) in rows.iter_mut().zip(&cleaned.values) {
        row.clean_count = finite(value);
    }
    for &i in &cleaned.missing {
        eprintln!("missing: {}", series.date_at(i));
    }
    for &i in &cleaned.outliers {
        eprintln!("outlier: {} ({})", series.date_at(i), series.values()[i]);
    }

    write_annotated_csv(&rows, open_output(output.as_deref())?)?;
    Ok(())
}

fn run_smooth(mut config: AnalysisConfig, input: Input, output: Option<PathBuf>) -> Result<()> {
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let cleaned = analysis.clean(&series)?;
    let smoothed = analysis.smooth(&cleaned.values)?;

    let mut rows = blank_rows(&series);
    for (t, row) in rows.iter_mut().enumerate() {
        row.clean_count = finite(cleaned.values[t]);
        row.ma_weekly = finite(smoothed.weekly[t]);
        row.ma_monthly = finite(smoothed.monthly[t]);
    }

    write_annotated_csv(&rows, open_output(output.as_deref())?)?;
    Ok(())
}

fn run_decompose(
    mut config: AnalysisConfig,
    input: Input,
    period: Option<usize>,
    method: Option<DecompositionMethod>,
    output: Option<PathBuf>,
) -> Result<()> {
    if let Some(period) = period {
        config.stl_period = period;
    }
    if let Some(method) = method {
        config.decomposition = method;
    }
    config.validate()?;
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let cleaned = analysis.clean(&series)?;
    let smoothed = analysis.smooth(&cleaned.values)?;
    let des = analysis.deseasonalize(&smoothed.weekly)?;

    eprintln!(
        "{} period {}: seasonal strength {:.3}",
        analysis.config().decomposition,
        analysis.config().stl_period,
        seasonal_strength(&des.decomposition)
    );
    match analysis.detect_period(&cleaned.values) {
        Some(p) => eprintln!("Autocorrelation peak at lag {}", p),
        None => eprintln!("No autocorrelation peak"),
    }

    let mut rows = blank_rows(&series);
    for (t, row) in rows.iter_mut().enumerate() {
        row.clean_count = finite(cleaned.values[t]);
        row.ma_weekly = finite(smoothed.weekly[t]);
        row.ma_monthly = finite(smoothed.monthly[t]);
        if t >= des.offset && t - des.offset < des.adjusted.len() {
            row.seasonal = finite(des.decomposition.seasonal[t - des.offset]);
            row.deseasonal = finite(des.adjusted[t - des.offset]);
        }
    }

    write_annotated_csv(&rows, open_output(output.as_deref())?)?;
    Ok(())
}

fn run_stationarity(mut config: AnalysisConfig, input: Input, diff: usize) -> Result<()> {
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let des = prepare(&analysis, &series)?;
    let data = difference(&des.adjusted, diff);
    let alpha = analysis.config().significance;

    let adf = adf_test(&data, analysis.config().adf_lags)?;
    let kpss = kpss_test(&data, None)?;
    println!("\n=== Stationarity (differences: {}) ===", diff);
    println!(
        "ADF:  statistic {:.4}, lags {}, p-value {:.4}{} -> {}",
        adf.statistic,
        adf.lags,
        adf.p_value,
        if adf.p_value_truncated { " (truncated)" } else { "" },
        if adf.is_stationary(alpha) { "stationary" } else { "unit root" }
    );
    println!(
        "KPSS: statistic {:.4}, lags {}, p-value {:.4}{} -> {}",
        kpss.statistic,
        kpss.lags,
        kpss.p_value,
        if kpss.p_value_truncated { " (truncated)" } else { "" },
        if kpss.is_stationary(alpha) { "stationary" } else { "not stationary" }
    );
    println!(
        "Suggested further differences: {}",
        ndiffs(&data, alpha, 2)?
    );
    Ok(())
}

fn run_acf(
    mut config: AnalysisConfig,
    input: Input,
    diff: usize,
    max_lag: Option<usize>,
) -> Result<()> {
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let des = prepare(&analysis, &series)?;
    let data = difference(&des.adjusted, diff);
    let level = 1.0 - analysis.config().significance;

    let correlogram = Correlogram::compute(
        &data,
        max_lag.or(analysis.config().acf_max_lag),
        level,
    )?;
    println!("\n=== Correlogram (differences: {}) ===", diff);
    print_correlogram(&correlogram);
    Ok(())
}

fn run_fit(mut config: AnalysisConfig, input: Input, order: Option<ArimaOrder>) -> Result<()> {
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let des = prepare(&analysis, &series)?;
    let (_, report) = fit_model(&analysis, &des.adjusted, order)?;
    print_model(&report);
    Ok(())
}

fn run_forecast(
    mut config: AnalysisConfig,
    input: Input,
    order: Option<ArimaOrder>,
    steps: Option<usize>,
    levels: Vec<f64>,
    output: Option<PathBuf>,
) -> Result<()> {
    if let Some(steps) = steps {
        config.horizon = steps;
    }
    if !levels.is_empty() {
        config.levels = levels;
    }
    config.validate()?;
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let des = prepare(&analysis, &series)?;
    let (model, report) = fit_model(&analysis, &des.adjusted, order)?;
    eprintln!("Model: {}", report.spec);

    let config = analysis.config();
    let forecast = model.forecast(config.horizon, &config.interval_levels())?;
    let last = series.date_at(des.offset + des.adjusted.len() - 1);
    let rows = ForecastRow::from_forecast(&forecast, last);

    write_forecast_csv(&rows, open_output(output.as_deref())?)?;
    Ok(())
}

fn run_evaluate(
    mut config: AnalysisConfig,
    input: Input,
    order: Option<ArimaOrder>,
    holdout_len: Option<usize>,
) -> Result<()> {
    if let Some(len) = holdout_len {
        config.holdout = len;
    }
    if config.holdout == 0 {
        bail!("holdout must be at least 1 day");
    }
    let series = load_series(&input, &mut config)?;
    let analysis = Analysis::new(config);
    let des = prepare(&analysis, &series)?;
    let config = analysis.config();

    let train = &des.adjusted[..des.adjusted.len().saturating_sub(config.holdout)];
    let (_, report) = fit_model(&analysis, train, order)?;
    let eval = holdout(
        &des.adjusted,
        report.spec,
        config.holdout,
        &config.interval_levels(),
    )?;

    println!("\n=== Holdout evaluation: {} ===", eval.spec);
    println!("Training days: {}", eval.train_len);
    println!("Holdout days: {}", eval.actual.len());
    println!("ME:   {:.4}", eval.accuracy.me);
    println!("RMSE: {:.4}", eval.accuracy.rmse);
    println!("MAE:  {:.4}", eval.accuracy.mae);
    println!("MPE:  {:.2}%", eval.accuracy.mpe);
    println!("MAPE: {:.2}%", eval.accuracy.mape);
    for (level, share) in &eval.coverage {
        println!(
            "Coverage of {:.0}% interval: {:.1}%",
            level * 100.0,
            share * 100.0
        );
    }
    let baseline = &eval.baseline;
    println!("\n--- SMA({}) baseline ---", baseline.window);
    println!("RMSE: {:.4}", baseline.accuracy.rmse);
    println!("MAE:  {:.4}", baseline.accuracy.mae);
    println!("MAPE: {:.2}%", baseline.accuracy.mape);
    for (level, share) in &baseline.coverage {
        println!(
            "Coverage of {:.0}% interval: {:.1}%",
            level * 100.0,
            share * 100.0
        );
    }

    println!(
        "\n{:>10}  {:>12}  {:>12}  {:>12}",
        "date", "actual", "forecast", "baseline"
    );
    let first = des.offset + eval.train_len;
    for (h, ((actual, mean), naive)) in eval
        .actual
        .iter()
        .zip(&eval.forecast.mean)
        .zip(&baseline.forecast)
        .enumerate()
    {
        println!(
            "{:>10}  {:>12.2}  {:>12.2}  {:>12.2}",
            series.date_at(first + h),
            actual,
            mean,
            naive
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            input,
            output,
            horizon,
            order,
        } => run_analyze(config, input, output, horizon, order),
        Commands::Clean { input, output } => run_clean(config, input, output),
        Commands::Smooth { input, output } => run_smooth(config, input, output),
        Commands::Decompose {
            input,
            period,
            method,
            output,
        } => run_decompose(config, input, period, method, output),
        Commands::Stationarity { input, diff } => run_stationarity(config, input, diff),
        Commands::Acf {
            input,
            diff,
            max_lag,
        } => run_acf(config, input, diff, max_lag),
        Commands::Fit { input, order } => run_fit(config, input, order),
        Commands::Forecast {
            input,
            order,
            steps,
            level,
            output,
        } => run_forecast(config, input, order, steps, level, output),
        Commands::Evaluate {
            input,
            order,
            holdout,
        } => run_evaluate(config, input, order, holdout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_parse_order() {
        assert_eq!(parse_order("1,1,7").unwrap(), ArimaOrder::new(1, 1, 7));
        assert_eq!(parse_order(" 2, 0 ,1").unwrap(), ArimaOrder::new(2, 0, 1));
        assert!(parse_order("1,1").is_err());
        assert!(parse_order("1,-1,0").is_err());
    }

    #[test]
    fn test_bar_direction_and_marking() {
        let pos = bar(0.4, 0.1, 10);
        assert_eq!(pos, format!("{:>10}|{:<10}", "", "####"));
        let neg = bar(-0.25, 0.3, 10);
        assert_eq!(neg, format!("{:>10}|{:10}", "===", ""));
    }

    #[test]
    fn test_default_directive_covers_library_crates() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(default_directive(true)))
            .with_writer(io::sink)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(
                target: "bikecast_core::algorithms::arima",
                Level::DEBUG
            ));
            assert!(tracing::enabled!(target: "bikecast_forecast::pipeline", Level::DEBUG));
            assert!(!tracing::enabled!(target: "csv", Level::DEBUG));
        });

        let quiet = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(default_directive(false)))
            .with_writer(io::sink)
            .finish();
        tracing::subscriber::with_default(quiet, || {
            assert!(tracing::enabled!(target: "bikecast_forecast::selection", Level::INFO));
            assert!(!tracing::enabled!(target: "bikecast_forecast::selection", Level::DEBUG));
        });
    }

    #[test]
    fn test_decompose_method_flag() {
        let cli = Cli::try_parse_from([
            "bikecast",
            "decompose",
            "-i",
            "day.csv",
            "--method",
            "classical",
        ])
        .unwrap();
        match cli.command {
            Commands::Decompose { method, .. } => {
                assert_eq!(method, Some(DecompositionMethod::Classical));
            }
            _ => panic!("expected decompose"),
        }
        assert!(
            Cli::try_parse_from(["bikecast", "decompose", "-i", "day.csv", "--method", "x11"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "bikecast",
            "forecast",
            "-i",
            "day.csv",
            "--order",
            "1,1,7",
            "--level",
            "90",
            "--level",
            "99",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Forecast { order, level, .. } => {
                assert_eq!(order, Some(ArimaOrder::new(1, 1, 7)));
                assert_eq!(level, vec![90.0, 99.0]);
            }
            _ => panic!("expected forecast"),
        }
    }
}
