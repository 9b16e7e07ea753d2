use crate::database::models::CapRecord;
use crate::utils::time::{format_cap_date, format_cap_time};
use chrono::{DateTime, Utc};

/// Substring shared by activity entries and announcements.
pub const CAP_MARKER: &str = "capped";

const MESSAGE_LIMIT: usize = 2000;

pub fn format_cap_announcement(rsn: &str, cap_time: DateTime<Utc>) -> String {
    format!(
        "{} has capped at the citadel on {} at {}.",
        rsn,
        format_cap_date(cap_time),
        format_cap_time(cap_time)
    )
}

/// Names from announcement messages, given newest message first; returned oldest first.
pub fn capped_names<'a, I>(messages: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<String> = messages
        .into_iter()
        .filter(|content| content.contains(CAP_MARKER))
        .flat_map(|content| content.lines())
        .map(|line| match line.find(" has") {
            Some(index) => line[..index].to_string(),
            None => line.to_string(),
        })
        .collect();

    names.reverse();
    names
}

pub fn format_numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(pos, item)| format!("{}. {}\n", pos + 1, item))
        .collect()
}

pub fn format_cap_report(records: &[CapRecord]) -> String {
    records
        .iter()
        .map(|record| match record.last_cap_time {
            Some(cap_time) => format!("{}\n", format_cap_announcement(&record.rsn, cap_time)),
            None => format!("{} not in database.\n", record.rsn),
        })
        .collect()
}

/// Splits `text` on line boundaries into messages Discord will accept.
pub fn chunk_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > MESSAGE_LIMIT {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub fn format_error_message(error: &str) -> String {
    format!("❌ **Error**: {}", error)
}

pub fn format_success_message(message: &str) -> String {
    format!("✅ {}", message)
}
