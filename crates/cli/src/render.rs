//! Terminal and JSON output.
//!
//! Pretty mode writes human-oriented text to stderr and keeps stdout for
//! data (placeholder names, `save --stdout` labels). JSON mode writes one
//! object to stdout per command.

use std::io::{self, IsTerminal, Write};

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use serde::Serialize;
use zpl_merge_core::{BatchEvent, BatchResult, JobState, Progress, Template};

// ── Output format ───────────────────────────────────────────────────────

/// How command results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured terminal output.
    Pretty,
    /// One JSON object on stdout.
    Json,
}

impl Format {
    /// Explicit choice, or pretty for a terminal and JSON for a pipe.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ if io::stdout().is_terminal() => Format::Pretty,
            _ => Format::Json,
        }
    }
}

// ── inspect ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OccurrenceJson<'a> {
    token: &'a str,
    start: usize,
    end: usize,
}

#[derive(Serialize)]
struct InspectJson<'a> {
    ok: bool,
    placeholders: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    occurrences: Vec<OccurrenceJson<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Report an accepted template.
pub(crate) fn render_template(template: &Template, filename: &str, format: Format) {
    match format {
        Format::Pretty => {
            annotate_placeholders(template, filename);
            for token in template.placeholders() {
                println!("{token}");
            }
        }
        Format::Json => {
            let occurrences = template
                .occurrences()
                .map(|o| OccurrenceJson {
                    token: o.token,
                    start: o.span.start,
                    end: o.span.end,
                })
                .collect();
            print_json(&InspectJson {
                ok: true,
                placeholders: template.placeholders(),
                occurrences,
                error: None,
            });
        }
    }
}

/// Report a rejected template.
pub(crate) fn render_import_error(message: &str, format: Format) {
    match format {
        Format::Pretty => eprintln!("{}", message.fg(Color::Red)),
        Format::Json => print_json(&InspectJson {
            ok: false,
            placeholders: &[],
            occurrences: Vec::new(),
            error: Some(message),
        }),
    }
}

/// Underline every placeholder occurrence in the template source.
fn annotate_placeholders(template: &Template, filename: &str) {
    let source = template.text();
    let occurrences: Vec<_> = template.occurrences().collect();
    let Some(first) = occurrences.first() else {
        return;
    };

    let count = template.placeholders().len();
    let plural = if count == 1 { "" } else { "s" };
    let mut report = Report::build(
        ReportKind::Custom("placeholders", Color::Cyan),
        (filename, first.span.clone()),
    )
    .with_config(Config::default().with_compact(false))
    .with_message(format!("{count} editable placeholder{plural}"));

    for (i, occ) in occurrences.iter().enumerate() {
        // Each distinct token keeps one colour across repeats.
        let slot = template
            .placeholders()
            .iter()
            .position(|p| p == occ.token)
            .unwrap_or(i);
        report = report.with_label(
            Label::new((filename, occ.span.clone()))
                .with_message(occ.token)
                .with_color(PALETTE[slot % PALETTE.len()]),
        );
    }

    report
        .finish()
        .eprint((filename, Source::from(source)))
        .ok();
}

const PALETTE: [Color; 4] = [Color::Cyan, Color::Magenta, Color::Green, Color::Yellow];

// ── batch ───────────────────────────────────────────────────────────────

/// Live progress on stderr for pretty mode.
pub(crate) struct ProgressLine {
    enabled: bool,
    drawn: bool,
}

impl ProgressLine {
    /// Draw only when stderr is a terminal and output is pretty.
    pub(crate) fn new(format: Format) -> Self {
        Self {
            enabled: format == Format::Pretty && io::stderr().is_terminal(),
            drawn: false,
        }
    }

    /// Handle one batch event.
    pub(crate) fn handle(&mut self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { total, phase } => {
                tracing::info!(total, %phase, "batch started");
            }
            BatchEvent::Progress(progress) => {
                tracing::debug!(current = progress.current, total = progress.total, "progress");
                self.draw(progress);
            }
            BatchEvent::Finished(_) => self.clear(),
        }
    }

    fn draw(&mut self, progress: &Progress) {
        if !self.enabled {
            return;
        }
        let mut err = io::stderr().lock();
        let _ = write!(
            err,
            "\r{} {:>3.0}%",
            progress.status_text(),
            progress.percent()
        );
        let _ = err.flush();
        self.drawn = true;
    }

    fn clear(&mut self) {
        if self.drawn {
            eprintln!();
            self.drawn = false;
        }
    }
}

#[derive(Serialize)]
struct BatchJson<'a> {
    ok: bool,
    #[serde(flatten)]
    result: &'a BatchResult,
}

/// Report how a batch ended. With `quiet_stdout` the labels went to stdout,
/// so only failures are reported, on stderr.
pub(crate) fn render_batch_result(result: &BatchResult, format: Format, quiet_stdout: bool) {
    if quiet_stdout && !result.is_error() {
        return;
    }
    if format == Format::Json && !quiet_stdout {
        print_json(&BatchJson {
            ok: !result.is_error(),
            result,
        });
        return;
    }

    let color = match result.state {
        JobState::Completed => Color::Green,
        JobState::CompletedWithErrors => Color::Yellow,
        _ => Color::Red,
    };
    eprintln!("{}", result.message.as_str().fg(color));
    for failure in &result.failures {
        eprintln!("  {failure}");
    }
}

// ── errors ──────────────────────────────────────────────────────────────

/// Report a command failure that has no more specific renderer.
pub(crate) fn render_error(err: &anyhow::Error, format: Format) {
    match format {
        Format::Pretty => {
            eprintln!("{}", err.to_string().fg(Color::Red));
            for cause in err.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
        }
        Format::Json => print_json(&serde_json::json!({
            "ok": false,
            "error": "command_failed",
            "message": format!("{err:#}"),
        })),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: could not serialize output: {e}"),
    }
}
