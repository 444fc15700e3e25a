//! Markdown rendering of letter headers and the letter thread.

use chrono::{Local, NaiveDate};

use crate::state::Letter;

/// Shown in the thread pane before any letter has been sent.
pub const EMPTY_THREAD_PLACEHOLDER: &str = "*No letters yet. Start writing!*";

/// `**Re: {subject} ({turn_type} {turn_number})**` followed by today's date
/// and a horizontal rule.
pub fn format_header(subject: &str, turn_type: &str, turn_number: u32) -> String {
    format_header_on(subject, turn_type, turn_number, Local::now().date_naive())
}

pub fn format_header_on(subject: &str, turn_type: &str, turn_number: u32, date: NaiveDate) -> String {
    format!(
        "**Re: {} ({} {})**\n\n*{}*\n\n---\n\n",
        subject,
        turn_type,
        turn_number,
        date.format("%B %d, %Y")
    )
}

/// The whole thread, oldest letter first.
pub fn render_thread(thread: &[Letter]) -> String {
    if thread.is_empty() {
        return EMPTY_THREAD_PLACEHOLDER.to_string();
    }

    let mut markup = String::from("# Letter Thread\n\n");
    for letter in thread {
        let role = letter.role();
        markup.push_str(&format!(
            "### {} **{}**\n\n{}\n\n---\n\n",
            role.avatar(),
            role.sender(),
            letter.formatted_content()
        ));
    }
    markup
}
