use serde::Serialize;

use crate::limits::{CLOSED_FROM, CLOSED_TO};
use crate::model::*;

/// One line per result.
pub fn render_result(result: &BookingResult) -> String {
    if result.is_success() {
        let tickets = result
            .allocated()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "✅ Client: {} | Requested: {} | Tickets issued: [{}] | Status: CONFIRMED.",
            result.client_name(),
            result.requested(),
            tickets
        )
    } else {
        format!(
            "❌ Client: {} | Requested: {} | Status: REJECTED. Reason: {}",
            result.client_name(),
            result.requested(),
            result.message()
        )
    }
}

pub fn render_banner(now: &str, capacity: u32) -> String {
    format!(
        "=== TICKET BOOKING SYSTEM ===\n\
         Current time: {now}\n\
         Tickets available at start: {capacity}\n\
         Rule: booking is NOT allowed from {} to {}.\n",
        CLOSED_FROM.format("%H:%M"),
        CLOSED_TO.format("%H:%M"),
    )
}

pub fn render_summary(results: &[BookingResult], remaining: u32) -> String {
    let mut out = String::from("=== SUMMARY ===\n");
    for r in results {
        out.push_str(&render_result(r));
        out.push('\n');
    }
    out.push_str(&format!("\nTickets left: {remaining}\n"));
    out.push_str("Thank you! If there were not enough tickets, try a different count or time.\n");
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [BookingResult],
    remaining: u32,
}

pub fn render_json(results: &[BookingResult], remaining: u32) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport { results, remaining })
}
