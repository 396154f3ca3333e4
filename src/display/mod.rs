use owo_colors::OwoColorize;

use crate::board::ProgressSummary;
use crate::notify::{Notification, Severity};
use crate::types::{TicketPriority, TicketStatus};

pub mod tables;

pub use tables::*;

pub fn format_status_colored(status: TicketStatus) -> String {
    format_status_colored_with_format(status, |s| format!("[{}]", s))
}

pub fn format_status_colored_with_format<F>(status: TicketStatus, format_fn: F) -> String
where
    F: Fn(&str) -> String,
{
    let badge = format_fn(status.as_str());
    match status {
        TicketStatus::ToDo => badge.yellow().to_string(),
        TicketStatus::InProgress => badge.cyan().to_string(),
        TicketStatus::Done => badge.green().to_string(),
    }
}

pub fn format_priority_colored(priority: TicketPriority) -> String {
    let label = priority.as_str();
    match priority {
        TicketPriority::High => label.red().to_string(),
        TicketPriority::Medium => label.yellow().to_string(),
        TicketPriority::Low => label.dimmed().to_string(),
    }
}

/// One line per column count, then the completion bar
pub fn format_progress(summary: &ProgressSummary) -> String {
    let mut output = String::new();
    for status in crate::board::COLUMNS {
        output.push_str(&format!(
            "{:<12} {}\n",
            format_status_colored_with_format(status, |s| format!("{s}:")),
            summary.for_status(status)
        ));
    }
    output.push_str(&format!(
        "{} {}",
        progress_bar(summary.completion_percent(), 20),
        format!("{:.0}% complete", summary.completion_percent()).bold()
    ));
    output
}

/// Fixed-width bar such as `[#####---------------]`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn format_notification(notification: &Notification) -> String {
    let message = &notification.message;
    match notification.severity {
        Severity::Success => format!("{} {}", "✓".green(), message),
        Severity::Error => format!("{} {}", "error:".red().bold(), message),
        Severity::Warning => format!("{} {}", "warning:".yellow().bold(), message),
        Severity::Info => format!("{} {}", "info:".blue(), message),
    }
}
