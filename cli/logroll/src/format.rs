//! Formatting of run summaries.

use lr_producer::ProducerStats;
use lr_worker::StatsSnapshot;

/// Format bytes as human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format a large number with commas for readability.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

fn format_seconds(duration: chrono::Duration) -> String {
    format!("{:.2}s", duration.num_milliseconds() as f64 / 1000.0)
}

/// Summary of a producer run.
pub fn producer_summary(stats: &ProducerStats) -> Vec<String> {
    let mut lines = vec![
        "Production completed:".to_string(),
        format!("  Roots processed:     {}", stats.roots_processed),
        format!("  Prefixes discovered: {}", stats.prefixes_discovered),
        format!("  Prefixes finished:   {}", stats.prefixes_finished),
        format!("  Tasks queued:        {}", format_number(stats.tasks_queued as u64)),
        format!("  Objects covered:     {}", format_number(stats.objects_queued as u64)),
        format!("  Bytes covered:       {}", format_bytes(stats.bytes_queued)),
    ];

    if let Some(duration) = stats.duration() {
        lines.push(format!("  Duration:            {}", format_seconds(duration)));
    }

    lines.push(format!("  Errors:              {}", stats.error_count()));
    for error in &stats.errors {
        lines.push(format!("  Error: {}", error));
    }
    lines
}

/// Summary of a worker run.
pub fn worker_summary(stats: &StatsSnapshot) -> Vec<String> {
    let mut lines = vec![
        "Worker completed:".to_string(),
        format!("  Tasks archived:     {}", stats.tasks_succeeded),
        format!("  Tasks failed:       {}", stats.tasks_failed),
        format!("  Malformed messages: {}", stats.malformed_messages),
        format!("  Files archived:     {}", format_number(stats.files_archived)),
        format!("  Bytes downloaded:   {}", format_bytes(stats.bytes_downloaded)),
        format!("  Bytes uploaded:     {}", format_bytes(stats.archive_bytes_uploaded)),
        format!("  Objects deleted:    {}", format_number(stats.objects_deleted)),
    ];

    if stats.delete_failures > 0 {
        lines.push(format!("  Delete failures:    {}", stats.delete_failures));
    }

    if let Some(duration) = stats.duration() {
        lines.push(format!("  Duration:           {}", format_seconds(duration)));
    }

    if stats.transient_errors > 0 || stats.permanent_errors > 0 {
        lines.push(format!(
            "  Errors:             {} transient, {} permanent",
            stats.transient_errors, stats.permanent_errors
        ));
    }
    lines
}
