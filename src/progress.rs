//! Pipeline progress reporting for `reel run`.
//!
//! Progress is emitted on **stderr** so the run summary on stdout stays
//! parseable for scripts.

use std::io::Write;

use reel_core::progress::{NoProgress, PipelineEvent, PipelineReporter};

/// Human-friendly progress on stderr: "discover  rottentomatoes:list  42 records".
pub struct StderrProgress;

impl PipelineReporter for StderrProgress {
    fn report(&self, event: PipelineEvent) {
        let line = match &event {
            PipelineEvent::StageStarted { stage } => format!("{}  started\n", stage),
            PipelineEvent::ScraperFinished {
                stage,
                scraper,
                items,
                ok,
            } => {
                if *ok {
                    format!(
                        "{}  {}  {} items\n",
                        stage,
                        scraper,
                        format_number(*items as u64)
                    )
                } else {
                    format!("{}  {}  failed\n", stage, scraper)
                }
            }
            PipelineEvent::Processed { stage, n, total } => format!(
                "{}  {} / {} records\n",
                stage,
                format_number(*n),
                format_number(*total)
            ),
            PipelineEvent::StageFinished { stage } => format!("{}  done\n", stage),
        };
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl PipelineReporter for JsonProgress {
    fn report(&self, event: PipelineEvent) {
        let obj = match &event {
            PipelineEvent::StageStarted { stage } => serde_json::json!({
                "event": "stage_started",
                "stage": stage,
            }),
            PipelineEvent::ScraperFinished {
                stage,
                scraper,
                items,
                ok,
            } => serde_json::json!({
                "event": "scraper_finished",
                "stage": stage,
                "scraper": scraper,
                "items": items,
                "ok": ok,
            }),
            PipelineEvent::Processed { stage, n, total } => serde_json::json!({
                "event": "progress",
                "stage": stage,
                "n": n,
                "total": total,
            }),
            PipelineEvent::StageFinished { stage } => serde_json::json!({
                "event": "stage_finished",
                "stage": stage,
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` value. `auto` picks [`default_for_tty`](Self::default_for_tty).
    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::default_for_tty()),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            "off" => Some(ProgressMode::Off),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn PipelineReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
