use crate::models::HealthRecord;

const HEADERS: [&str; 7] = [
    "Server",
    "Status",
    "Response Time",
    "Last Ping",
    "Uptime",
    "Resource Usage",
    "URL",
];

fn row(record: &HealthRecord) -> [String; 7] {
    [
        record.name.clone(),
        record.status.label().to_string(),
        format!("{}ms", record.response_time_ms),
        record
            .last_ping_at
            .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
        record.uptime_label(),
        record.resource_usage.clone(),
        record.url.clone(),
    ]
}

/// Renders the records as a plain-text table, one row per target.
pub fn render(records: &[HealthRecord]) -> String {
    let rows: Vec<[String; 7]> = records.iter().map(row).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+", separator);

    let format_line = |cells: &[&str]| {
        let inner = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| format!(" {:<width$} ", cell, width = *w))
            .collect::<Vec<_>>()
            .join("|");
        format!("|{}|", inner)
    };

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(separator.clone());
    out.push(format_line(&HEADERS[..]));
    out.push(separator.clone());
    for cells in &rows {
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        out.push(format_line(&cells[..]));
    }
    out.push(separator);
    out.join("\n")
}

pub fn print(records: &[HealthRecord]) {
    println!("\n{}", render(records));
}
