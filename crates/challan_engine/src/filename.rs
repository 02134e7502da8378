/// Windows-safe export file stem, e.g.
/// `challan_data_complete_12vehicles_2026-08-30_10-41`.
pub fn export_file_stem(complete: bool, vehicles: usize, timestamp: &str) -> String {
    let status = if complete { "complete" } else { "partial" };
    format!(
        "challan_data_{status}_{vehicles}vehicles_{}",
        sanitize_stamp(timestamp)
    )
}

fn sanitize_stamp(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_forbidden(c) { '-' } else { c })
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        ' ' | '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
