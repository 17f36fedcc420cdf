//! Rendering primitives.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{ContentArrangement, Table};

use super::context::UiContext;
use super::mode::OutputMode;
use super::theme::{styled, styles, Badge};

/// "TaskVault · command" on a terminal, "taskvault command" otherwise.
pub fn header(ctx: &UiContext, command: &str, context: Option<&str>) -> String {
    match ctx.mode {
        OutputMode::Pretty => {
            let title = styled("TaskVault", styles::bold(), ctx.color);
            match context {
                Some(c) => format!("{} \u{00B7} {} ({})", title, command, c),
                None => format!("{} \u{00B7} {}", title, command),
            }
        }
        OutputMode::Plain => format!("taskvault {}", command),
        OutputMode::Json => String::new(),
    }
}

pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let marker = styled(kind.display(ctx.unicode), kind.style(), ctx.color);
    if message.is_empty() {
        marker
    } else {
        format!("{} {}", marker, message)
    }
}

/// `Key: value` on a terminal, `key=value` otherwise.
pub fn kv(ctx: &UiContext, key: &str, value: &str) -> String {
    if ctx.mode.is_pretty() {
        let label = styled(&format!("{}:", key), styles::dim(), ctx.color);
        format!("{} {}", label, value)
    } else {
        format!("{}={}", key.to_lowercase().replace(' ', "_"), value)
    }
}

pub fn hint(ctx: &UiContext, text: &str) -> String {
    if ctx.mode.is_pretty() {
        format!("{} {}", styled("Hint:", styles::dim(), ctx.color), text)
    } else {
        format!("hint={}", text)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
}

impl Column {
    pub const fn new(header: &'static str) -> Self {
        Self { header }
    }
}

/// Bordered table on a terminal, tab-separated rows otherwise.
pub fn table(ctx: &UiContext, columns: &[Column], rows: &[Vec<String>]) -> String {
    if !ctx.mode.is_pretty() {
        return rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut table = Table::new();
    if ctx.unicode {
        table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(ASCII_MARKDOWN);
    }
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(ctx.width.min(u16::MAX as usize) as u16)
        .set_header(columns.iter().map(|c| c.header).collect::<Vec<_>>());
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

/// Print unless the output is JSON or empty.
pub fn print(ctx: &UiContext, text: &str) {
    if !ctx.mode.is_json() && !text.is_empty() {
        println!("{}", text);
    }
}

pub fn blank_line(ctx: &UiContext) {
    if ctx.mode.is_pretty() {
        println!();
    }
}
