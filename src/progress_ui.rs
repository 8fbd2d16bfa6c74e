//! Progress bar rendering for a run's progress stream.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use wayback_mirror_core::{ProgressEvent, ProgressStream};

/// Consumes `stream` until the run ends, drawing a bar on stderr.
///
/// Per-file notices are printed above the bar. Nothing is drawn when `quiet`.
pub(crate) async fn render(mut stream: ProgressStream, quiet: bool) {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    while let Some(event) = stream.next().await {
        match &event {
            ProgressEvent::IndexPage { .. } => bar.set_message(event.to_string()),
            ProgressEvent::Curated { entries } => {
                bar.set_style(
                    ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar.set_length(bar_length(*entries));
                bar.set_message(String::new());
                bar.println(event.to_string());
            }
            ProgressEvent::Downloaded(_) => {
                bar.println(event.to_string());
                bar.inc(1);
            }
            ProgressEvent::Finished { .. } => bar.finish_with_message(event.to_string()),
        }
    }

    if !bar.is_finished() {
        bar.abandon();
    }
}

fn bar_length(entries: usize) -> u64 {
    u64::try_from(entries).unwrap_or(u64::MAX)
}
