use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::enrichment::EnrichmentEvent;

/// Spinner relaying enrichment events to the terminal.
pub struct EnrichmentProgress {
    bar: ProgressBar,
    identifier: String,
    started: Instant,
}

impl EnrichmentProgress {
    pub fn new(identifier: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, identifier: identifier.to_string(), started: Instant::now() }
    }

    /// Hidden variant for non-interactive output.
    pub fn hidden(identifier: &str) -> Self {
        Self { bar: ProgressBar::hidden(), identifier: identifier.to_string(), started: Instant::now() }
    }

    pub fn handle_event(&self, event: &EnrichmentEvent) {
        match event {
            EnrichmentEvent::Initializing => {
                self.bar.set_message(format!("Initializing {}", self.identifier));
            }
            EnrichmentEvent::Processing { stage } => {
                self.bar.set_message(format!("{} {}", stage_label(stage), self.identifier));
            }
            EnrichmentEvent::Analyzed { identifier } => {
                self.bar.set_message(format!("Writing artifacts for {}", identifier));
            }
            EnrichmentEvent::Completed { identifier, files } => {
                self.bar.finish_with_message(format!(
                    "{} {} enriched in {:.1}s ({} files)",
                    style("✓").green(),
                    identifier,
                    self.started.elapsed().as_secs_f64(),
                    files.len()
                ));
            }
            EnrichmentEvent::Failed { error } => {
                self.bar.abandon_with_message(format!("{} {}", style("✗").red(), error));
            }
        }
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }
}

fn stage_label(stage: &str) -> &str {
    match stage {
        "lookup" => "Fetching vulnerability record for",
        "analysis" => "Analyzing",
        "assembly" => "Assembling artifacts for",
        other => other,
    }
}
