//! Terminal display helpers for the assetfinder CLI.
//!
//! Everything here writes to stderr so stdout stays a clean list of
//! hostnames that can be piped into other tools. Uses only the `console`
//! crate.

use assetfinder_lib::Source;
use console::{style, Style, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message.
    pub fn start(message: String) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print how many hostnames were found, to stderr.
pub fn print_summary(hostnames: usize, domains: usize, duration: Duration) {
    eprintln!("{}", style(summary_line(hostnames, domains, duration)).dim());
}

fn summary_line(hostnames: usize, domains: usize, duration: Duration) -> String {
    format!(
        "{} hostname{} from {} domain{} in {:.1}s",
        hostnames,
        plural(hostnames),
        domains,
        plural(domains),
        duration.as_secs_f64()
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

// ── Source listing ───────────────────────────────────────────────────────────

/// Print all built-in sources, then exit.
pub fn print_sources() {
    let heading = Style::new().yellow().bold();
    let name_style = Style::new().green().bold();
    let note_style = Style::new().cyan();

    println!();
    println!("{}", heading.apply_to("Available Sources:"));
    println!();

    for source in Source::all() {
        println!(
            "  {}  {}",
            name_style.apply_to(format!("{:<16}", source.as_str())),
            note_style.apply_to(source_note(source)),
        );
    }

    println!();
    println!("Use: assetfinder --sources crtsh,certspotter <domain>");
}

fn source_note(source: Source) -> &'static str {
    match source {
        Source::Wayback => "opt-in (slow)",
        Source::Facebook => "needs FB_APP_ID and FB_APP_SECRET",
        Source::VirusTotal => "needs VT_API_KEY",
        Source::FindSubDomains => "needs SPYSE_API_TOKEN",
        _ => "default",
    }
}
