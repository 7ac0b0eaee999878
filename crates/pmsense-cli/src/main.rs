use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use pmsense_core::{
    CaptureError, DeviceSource, MetricsRegistry, Report, SensorRecord, SourceError,
    decode_capture_into, make_report, render_prometheus, run_session, timestamp_now,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("PMSENSE_BUILD_COMMIT"),
    ", built ",
    env!("PMSENSE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "pmsense")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Frame decoder and health reporter for PMS5003 particulate sensors.",
    long_about = None,
    after_help = "Examples:\n  pmsense decode capture.bin -o report.json\n  pmsense decode capture.bin --stdout --format prometheus\n  pmsense monitor /dev/ttyUSB0 --metrics-file /var/lib/node_exporter/pms.prom"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a recorded byte stream and write a health report.
    #[command(alias = "parse")]
    Decode {
        /// Path to a raw capture of the sensor's serial output
        input: PathBuf,

        /// Output report path
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write the report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if any frame was dropped
        #[arg(long)]
        strict: bool,
    },
    /// Read a live sensor until the stream fails or enough readings arrived.
    Monitor {
        /// Device node of the serial port, or `-` for stdin
        device: PathBuf,

        /// Stop after this many valid readings and print the JSON report
        #[arg(long)]
        max_readings: Option<u64>,

        /// Periodically write Prometheus text metrics to this file
        #[arg(long)]
        metrics_file: Option<PathBuf>,

        /// Seconds between metrics file updates
        #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
        metrics_interval: u64,

        /// Only log warnings and errors
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Prometheus,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            input,
            report,
            stdout,
            format,
            pretty,
            compact,
            quiet,
            strict,
        } => {
            init_logging(quiet);
            cmd_decode(DecodeArgs {
                input,
                report,
                stdout,
                format,
                pretty,
                compact,
                quiet,
                strict,
            })
        }
        Commands::Monitor {
            device,
            max_readings,
            metrics_file,
            metrics_interval,
            quiet,
        } => {
            init_logging(quiet);
            cmd_monitor(
                &device,
                max_readings,
                metrics_file,
                Duration::from_secs(metrics_interval),
            )
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(err.code)
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "pmsense=warn" } else { "pmsense=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
    code: u8,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
            code: 2,
        }
    }

    fn fatal_stream(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            code: 1,
            ..Self::new(message, hint)
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

struct DecodeArgs {
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    format: Format,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if args.stdout {
        None
    } else {
        Some(args.report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let registry = MetricsRegistry::new();
    let rep = decode_capture_into(&resolved_input, &registry)
        .map_err(|err| capture_error(&resolved_input, err))?;
    let rendered = match args.format {
        Format::Json => serialize_report(&rep, args.pretty, args.compact)?,
        Format::Prometheus => render_prometheus(&registry),
    };

    match report {
        None => print!("{}", rendered),
        Some(report) => {
            write_output(&report, &rendered)?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }

    if args.strict && rep.health.dropped() > 0 {
        return Err(CliError::new(
            format!("{} frame(s) dropped", rep.health.dropped()),
            Some("inspect the health counters in the report".to_string()),
        ));
    }
    Ok(())
}

fn cmd_monitor(
    device: &Path,
    max_readings: Option<u64>,
    metrics_file: Option<PathBuf>,
    interval: Duration,
) -> Result<(), CliError> {
    let mut source = DeviceSource::open(device).map_err(|err| {
        CliError::fatal_stream(
            format!("cannot open {}: {}", device.display(), err),
            Some("check the device path and its permissions".to_string()),
        )
    })?;
    let metrics_file = metrics_file
        .map(|path| MetricsFile::create(path).map(Arc::new))
        .transpose()?;
    let registry = Arc::new(MetricsRegistry::new());
    info!(device = %source.path().display(), "monitoring sensor");

    if let Some(file) = metrics_file.as_ref() {
        spawn_exporter(Arc::clone(&registry), Arc::clone(file), interval);
    }

    let mut sink = |_: &SensorRecord| {};
    let outcome = run_session(&mut source, &registry, &mut sink, max_readings);

    if let Some(file) = metrics_file.as_ref() {
        if let Err(err) = file.write(&registry) {
            error!(error = %err, "final metrics file update failed");
        }
    }

    let mut rep = make_report(&source.path().display().to_string(), None, &registry);
    rep.generated_at = timestamp_now();

    let result = match outcome {
        Ok(summary) => {
            info!(
                forwarded = summary.forwarded,
                dropped = summary.dropped,
                "reading limit reached"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "stream failed, ending session");
            rep.end_reason = Some(err.to_string());
            Err(CliError::fatal_stream(
                format!("stream failed on {}: {}", device.display(), err),
                Some(stream_hint(&err).to_string()),
            ))
        }
    };
    println!("{}", serialize_report(&rep, true, false)?);
    result
}

fn stream_hint(err: &SourceError) -> &'static str {
    match err {
        SourceError::EndOfStream => "the device closed; restart once it is reconnected",
        SourceError::TimedOut => "no data from the sensor; check wiring and power",
        SourceError::Io(_) => "the device reported an I/O error; restart the process",
    }
}

fn capture_error(input: &Path, err: CaptureError) -> CliError {
    match err {
        CaptureError::Source(err) => CliError::fatal_stream(
            format!("stream failed on {}: {}", input.display(), err),
            Some(stream_hint(&err).to_string()),
        ),
        CaptureError::Io(err) => CliError::new(
            format!("cannot read {}: {}", input.display(), err),
            Some("pass a raw capture of the sensor output".to_string()),
        ),
    }
}

fn spawn_exporter(registry: Arc<MetricsRegistry>, file: Arc<MetricsFile>, interval: Duration) {
    thread::spawn(move || {
        loop {
            if let Err(err) = file.write(&registry) {
                error!(error = %err, "metrics file update failed");
            }
            thread::sleep(interval);
        }
    });
}

/// Text exposition file replaced atomically on each update.
struct MetricsFile {
    path: PathBuf,
    // Serializes render+rename so the last writer always holds the newest snapshot.
    lock: Mutex<()>,
}

impl MetricsFile {
    /// Prepare `path` for writing; its directory is created if needed.
    fn create(path: PathBuf) -> Result<Self, CliError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                CliError::new(
                    format!("cannot create metrics directory {}: {}", parent.display(), err),
                    Some("choose a writable --metrics-file path".to_string()),
                )
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    fn write(&self, registry: &MetricsRegistry) -> Result<(), CliError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let tmp = self.path.with_extension("prom.tmp");
        fs::write(&tmp, render_prometheus(registry))
            .with_context(|| format!("Failed to write metrics: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace metrics file: {}", self.path.display()))?;
        Ok(())
    }
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let Some(name) = report_path.file_name() else {
        return Err(CliError::new(
            format!("invalid report path: {}", report_path.display()),
            Some("pass a file path to -o/--report".to_string()),
        ));
    };
    let dir = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A directory that does not exist yet cannot hold the input.
    let Ok(dir) = fs::canonicalize(dir) else {
        return Ok(());
    };
    if dir.join(name) == input_abs {
        return Err(CliError::new(
            format!("report path must differ from input: {}", report_path.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn write_output(report: &Path, rendered: &str) -> Result<(), CliError> {
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(report, rendered)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a raw capture of the sensor output".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use `pmsense monitor` for device nodes".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }
    let invalid = |detail: String| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", detail)),
        )
    };

    let mut matches = Vec::new();
    for entry in glob(&pattern).map_err(|err| invalid(err.msg.to_string()))? {
        let path = entry.map_err(|err| invalid(err.to_string()))?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.as_slice() {
        [] => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        [single] => Ok(single.clone()),
        many => {
            let listed: Vec<String> = many.iter().map(|p| p.display().to_string()).collect();
            Err(CliError::new(
                format!("{} captures match '{}': {}", many.len(), pattern, listed.join(", ")),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;

    use pmsense_core::{CaptureError, SourceError};

    use super::capture_error;

    #[test]
    fn capture_read_failure_is_a_stream_error() {
        let err = CaptureError::Source(SourceError::Io(io::Error::from(
            io::ErrorKind::BrokenPipe,
        )));
        let cli = capture_error(Path::new("capture.bin"), err);
        assert_eq!(cli.code, 1);
        assert!(cli.message.starts_with("stream failed on capture.bin"));
        assert_eq!(
            cli.hint.as_deref(),
            Some("the device reported an I/O error; restart the process")
        );
    }

    #[test]
    fn capture_open_failure_is_a_usage_error() {
        let err = CaptureError::Io(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(capture_error(Path::new("capture.bin"), err).code, 2);
    }
}
