//! Progress reporting for pipeline runs
//!
//! The reporter only reads the shared counters; it has no influence on
//! which rows are written or in what order.

use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use super::counters::ProgressCounters;

/// Draw a progress bar until the run finishes or shuts down
pub fn report_progress(counters: &ProgressCounters, label: &str) {
    let total = counters.total();
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_prefix(label.to_string());

    let start = Instant::now();
    let mut last_finished = 0u64;
    let mut last_time = start;

    while !counters.is_shutdown() {
        let (finished, _) = counters.progress();
        pb.set_position(finished);

        let now = Instant::now();
        let interval = now.duration_since(last_time).as_secs_f64();
        if interval >= 0.5 {
            let throughput = (finished - last_finished) as f64 / interval;
            pb.set_message(format!("{} rows/s", format_count(throughput as u64)));
            last_finished = finished;
            last_time = now;
        }

        if finished >= total {
            break;
        }

        thread::sleep(Duration::from_millis(100));
    }

    let (finished, _) = counters.progress();
    pb.set_position(finished);
    if finished >= total {
        pb.finish_with_message("done");
    } else {
        pb.abandon_with_message(format!("stopped at {}", format_count(finished)));
    }
}

/// Format large numbers with thousands separators
/// Examples: 1,234,567 or 987,654
pub fn format_count(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}
