mod config;
mod render;
mod sinks;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zpl_merge_core::{
    AtomicFileWriter, BatchJob, BatchOptions, BatchResult, BindingKind, DataTable, ErrorPolicy,
    MappingSet, MemoryTable, OutputFormat, PrintTarget, SaveTarget, Sink, Template, load_template,
};
use zpl_merge_table::{CsvOptions, read_table};
use zpl_merge_transport::{
    DeviceTransport, RetryTransport, TcpTransport, Transport, TransportConfig,
};

use crate::config::FileConfig;
use crate::render::{
    Format, ProgressLine, render_batch_result, render_error, render_import_error, render_template,
};
use crate::sinks::{StdoutWriter, TransportPrinter};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "zpl-merge",
    version,
    about = "Merge table data into ZPL label templates, then print or save the batch"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log more detail to stderr (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Validate a template and list its placeholders.
    Inspect {
        /// The ZPL template file.
        template: PathBuf,
    },

    /// Render one label per data row and send each to a printer.
    Print {
        #[command(flatten)]
        merge: MergeArgs,
        /// Network printer: IP, IP:PORT, host, or host:PORT (port 9100 by default).
        #[arg(long, short = 'p', conflicts_with = "device")]
        printer: Option<String>,
        /// Local device node or spool file, e.g. /dev/usb/lp0.
        #[arg(long)]
        device: Option<PathBuf>,
        /// Milliseconds to wait between labels [default: 50].
        #[arg(long, value_name = "MS")]
        throttle_ms: Option<u64>,
        /// Send attempts per label, counting the first [default: 3].
        #[arg(long, value_name = "N")]
        retries: Option<u32>,
        /// Connect and write timeout in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Render one label per data row into a single batch file.
    Save {
        #[command(flatten)]
        merge: MergeArgs,
        /// Output directory (created if missing).
        #[arg(long)]
        dir: Option<PathBuf>,
        /// File name without extension [default: Labels_Batch_01].
        #[arg(long)]
        name: Option<String>,
        /// Output format: zpl, txt, or prn [default: zpl].
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Write the batch to stdout instead of a file.
        #[arg(long, conflicts_with_all = ["dir", "name", "format"])]
        stdout: bool,
    },
}

/// Inputs shared by `print` and `save`.
#[derive(Args, Debug)]
struct MergeArgs {
    /// The ZPL template file.
    template: PathBuf,
    /// CSV or spreadsheet (xlsx, xls, ods) with a header row; one label is
    /// rendered per row. Spreadsheets use their first worksheet.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Bind a placeholder: `Name=col:Customer`, `[Lot]=const:A1`, `Note=empty`.
    #[arg(long, short = 'b', value_name = "TOKEN=SOURCE", value_parser = parse_bind)]
    bind: Vec<(String, BindingKind)>,
    /// Do not bind placeholders to same-named columns automatically.
    #[arg(long)]
    no_auto_match: bool,
    /// Keep going when a label fails instead of stopping.
    #[arg(long)]
    continue_on_error: bool,
    /// CSV delimiter (sniffed from the header when omitted).
    #[arg(long, value_name = "CHAR")]
    delimiter: Option<char>,
    /// JSON settings file; flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Parse `TOKEN=SOURCE`; a bare token gets its brackets added.
fn parse_bind(s: &str) -> Result<(String, BindingKind), String> {
    let (token, source) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TOKEN=SOURCE, got '{s}'"))?;
    let token = token.trim();
    if token.is_empty() {
        return Err(format!("missing placeholder name in '{s}'"));
    }
    let token = if token.starts_with('[') && token.ends_with(']') {
        token.to_string()
    } else {
        format!("[{token}]")
    };
    let kind = source.parse::<BindingKind>().map_err(|e| e.to_string())?;
    Ok((token, kind))
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    let outcome = match cli.cmd {
        Cmd::Inspect { template } => cmd_inspect(&template, format),
        Cmd::Print {
            merge,
            printer,
            device,
            throttle_ms,
            retries,
            timeout,
        } => cmd_print(
            &merge,
            PrintFlags {
                printer,
                device,
                throttle_ms,
                retries,
                timeout,
            },
            format,
        ),
        Cmd::Save {
            merge,
            dir,
            name,
            format: file_format,
            stdout,
        } => cmd_save(
            &merge,
            SaveFlags {
                dir,
                name,
                format: file_format,
                stdout,
            },
            format,
        ),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            render_error(&err, format);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_inspect(path: &Path, format: Format) -> Result<ExitCode> {
    match load_template(path) {
        Ok(template) => {
            render_template(&template, &path.display().to_string(), format);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!(error = %err, "template rejected");
            render_import_error(&err.user_message(), format);
            Ok(ExitCode::FAILURE)
        }
    }
}

struct PrintFlags {
    printer: Option<String>,
    device: Option<PathBuf>,
    throttle_ms: Option<u64>,
    retries: Option<u32>,
    timeout: Option<u64>,
}

/// Where `print` sends labels.
#[derive(Debug, PartialEq, Eq)]
enum Destination {
    Printer(String),
    Device(PathBuf),
}

impl Destination {
    /// Either command-line flag wins outright; the config file is consulted
    /// only when neither is given.
    fn choose(
        (flag_printer, flag_device): (Option<String>, Option<PathBuf>),
        (cfg_printer, cfg_device): (Option<String>, Option<PathBuf>),
    ) -> Option<Self> {
        let pick = |printer: Option<String>, device: Option<PathBuf>| match (printer, device) {
            (Some(addr), _) => Some(Destination::Printer(addr)),
            (None, Some(path)) => Some(Destination::Device(path)),
            (None, None) => None,
        };
        pick(flag_printer, flag_device).or_else(|| pick(cfg_printer, cfg_device))
    }
}

fn cmd_print(args: &MergeArgs, flags: PrintFlags, format: Format) -> Result<ExitCode> {
    let cfg = FileConfig::load_optional(args.config.as_deref())?;
    let Some(prepared) = prepare(args, &cfg, format)? else {
        return Ok(ExitCode::FAILURE);
    };

    let mut transport_config = TransportConfig::default();
    if let Some(secs) = flags.timeout.or(cfg.timeout_secs) {
        transport_config.timeouts.connect = Duration::from_secs(secs);
        transport_config.timeouts.write = Duration::from_secs(secs);
    }
    if let Some(n) = flags.retries.or(cfg.retries) {
        transport_config.retry.max_attempts = n.max(1);
    }
    let retry = transport_config.retry.clone();

    let Some(destination) = Destination::choose(
        (flags.printer, flags.device),
        (cfg.printer, cfg.device),
    ) else {
        bail!("Error: no printer selected; pass --printer or --device");
    };
    let (transport, destination) = match destination {
        Destination::Printer(addr) => {
            let tcp = TcpTransport::connect(&addr, transport_config)
                .with_context(|| format!("Error: could not connect to printer {addr}"))?;
            (Box::new(tcp) as Box<dyn Transport>, addr)
        }
        Destination::Device(path) => {
            let dev = DeviceTransport::open(&path)
                .with_context(|| format!("Error: could not open device {}", path.display()))?;
            (
                Box::new(dev) as Box<dyn Transport>,
                path.display().to_string(),
            )
        }
    };

    let mut options = prepared.options.clone();
    if let Some(ms) = flags.throttle_ms.or(cfg.throttle_ms) {
        options.throttle = Duration::from_millis(ms);
    }

    let sink = Sink::print(
        TransportPrinter(RetryTransport::new(transport, retry)),
        PrintTarget::new(destination),
    );
    let result = run_batch(prepared.job(sink).with_options(options), format)?;
    render_batch_result(&result, format, false);
    Ok(exit_code(&result))
}

struct SaveFlags {
    dir: Option<PathBuf>,
    name: Option<String>,
    format: Option<OutputFormat>,
    stdout: bool,
}

fn cmd_save(args: &MergeArgs, flags: SaveFlags, format: Format) -> Result<ExitCode> {
    let cfg = FileConfig::load_optional(args.config.as_deref())?;
    let Some(prepared) = prepare(args, &cfg, format)? else {
        return Ok(ExitCode::FAILURE);
    };
    let options = prepared.options.clone();

    let sink = if flags.stdout {
        Sink::save(StdoutWriter, SaveTarget::new("-"))
    } else {
        let Some(dir) = flags.dir.or(cfg.directory) else {
            bail!("Error: no output directory; pass --dir or --stdout");
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Error: could not create {}", dir.display()))?;
        let mut target = SaveTarget::new(dir);
        if let Some(name) = flags.name.or(cfg.base_name) {
            target = target.with_base_name(name);
        }
        if let Some(file_format) = flags.format.or(cfg.format) {
            target = target.with_format(file_format);
        }
        if !target.is_ready() {
            bail!("Error: output file name must not be blank");
        }
        Sink::save(AtomicFileWriter, target)
    };

    let result = run_batch(prepared.job(sink).with_options(options), format)?;
    render_batch_result(&result, format, flags.stdout);
    Ok(exit_code(&result))
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// A loaded template with its bindings and data, ready to become a job.
struct Prepared {
    template: Template,
    mapping: MappingSet,
    table: Option<Arc<MemoryTable>>,
    options: BatchOptions,
}

impl Prepared {
    fn job(self, sink: Sink) -> BatchJob {
        let job = BatchJob::new(self.template, self.mapping.into_bindings(), sink);
        match self.table {
            Some(table) => job.with_table(table),
            None => job,
        }
    }
}

/// Load the template and table and apply bindings. `None` means the
/// template was rejected and the reason has been reported.
fn prepare(args: &MergeArgs, cfg: &FileConfig, format: Format) -> Result<Option<Prepared>> {
    let template = match load_template(&args.template) {
        Ok(t) => t,
        Err(err) => {
            tracing::debug!(error = %err, "template rejected");
            render_import_error(&err.user_message(), format);
            return Ok(None);
        }
    };

    let table = match &args.data {
        Some(path) => {
            let mut opts = CsvOptions::default();
            if let Some(c) = args.delimiter.or(cfg.delimiter) {
                opts = opts.with_delimiter(delimiter_byte(c)?);
            }
            let table = read_table(path, &opts)
                .with_context(|| format!("Error: could not read data file {}", path.display()))?;
            tracing::info!(
                rows = table.row_count(),
                columns = table.column_names().len(),
                "loaded data"
            );
            Some(Arc::new(table))
        }
        None => None,
    };

    let mut mapping = MappingSet::from_template(&template);
    if !args.no_auto_match
        && let Some(table) = &table
    {
        let matched = mapping.auto_match(table.column_names());
        tracing::info!(matched, "auto-matched placeholders to columns");
    }
    for (token, kind) in &args.bind {
        if let BindingKind::Column(column) = kind
            && let Some(table) = &table
            && !table.has_column(column)
        {
            bail!("Error: column '{column}' not found in data file");
        }
        mapping
            .set(token, kind.clone())
            .with_context(|| format!("Error: cannot bind {token}"))?;
    }

    let mut options = BatchOptions::default();
    if args.continue_on_error || cfg.continue_on_error.unwrap_or(false) {
        options.error_policy = ErrorPolicy::ContinueOnError;
    }

    Ok(Some(Prepared {
        template,
        mapping,
        table,
        options,
    }))
}

fn delimiter_byte(c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        bail!("Error: delimiter must be a single ASCII character, got '{c}'")
    }
}

/// Run on a worker thread, drawing progress from its event stream.
fn run_batch(job: BatchJob, format: Format) -> Result<BatchResult> {
    let handle = job
        .spawn()
        .context("Error: could not start the batch worker")?;
    let mut progress = ProgressLine::new(format);
    for event in handle.events() {
        progress.handle(&event);
    }
    Ok(handle.join())
}

fn exit_code(result: &BatchResult) -> ExitCode {
    if result.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_accepts_bare_and_bracketed_tokens() {
        assert_eq!(
            parse_bind("Name=col:Customer").unwrap(),
            ("[Name]".to_string(), BindingKind::Column("Customer".into()))
        );
        assert_eq!(
            parse_bind("[Lot]=const:A=1").unwrap(),
            ("[Lot]".to_string(), BindingKind::Constant("A=1".into()))
        );
        assert_eq!(
            parse_bind("Note=empty").unwrap().1,
            BindingKind::Empty
        );
    }

    #[test]
    fn bind_rejects_malformed_input() {
        assert!(parse_bind("Name").is_err());
        assert!(parse_bind("=const:x").is_err());
        assert!(parse_bind("Name=column:").is_err());
        assert!(parse_bind("Name=sheet:A").is_err());
    }

    #[test]
    fn delimiter_must_be_ascii() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert!(delimiter_byte('§').is_err());
    }

    #[test]
    fn device_flag_beats_configured_printer() {
        let chosen = Destination::choose(
            (None, Some(PathBuf::from("/tmp/lp0"))),
            (Some("10.0.0.5".into()), None),
        );
        assert_eq!(chosen, Some(Destination::Device(PathBuf::from("/tmp/lp0"))));
    }

    #[test]
    fn config_destination_used_without_flags() {
        assert_eq!(
            Destination::choose((None, None), (None, Some(PathBuf::from("spool")))),
            Some(Destination::Device(PathBuf::from("spool")))
        );
        assert_eq!(
            Destination::choose(
                (Some("printer-1".into()), None),
                (None, Some(PathBuf::from("spool")))
            ),
            Some(Destination::Printer("printer-1".into()))
        );
        assert_eq!(Destination::choose((None, None), (None, None)), None);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
