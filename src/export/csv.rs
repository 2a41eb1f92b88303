//! CSV rendering with RFC 4180 quoting.

use std::io::Write;

use crate::error::Result;

use super::ExportRow;

const HEADER: [&str; 13] = [
    "id",
    "source",
    "text",
    "x1",
    "y1",
    "x2",
    "y2",
    "page",
    "similarity",
    "color",
    "band",
    "area_code",
    "partner_id",
];

/// Render rows as CSV, header first, CRLF line endings.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    push_record(&mut out, HEADER.iter().map(|h| h.to_string()));
    for row in rows {
        push_record(&mut out, fields(row));
    }
    out
}

/// Write rows as CSV.
pub fn write_csv<W: Write>(rows: &[ExportRow], mut writer: W) -> Result<()> {
    writer.write_all(to_csv(rows).as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn fields(row: &ExportRow) -> impl Iterator<Item = String> {
    [
        row.id.clone(),
        row.source.to_string(),
        row.text.clone(),
        format!("{:.1}", row.rect.x1),
        format!("{:.1}", row.rect.y1),
        format!("{:.1}", row.rect.x2),
        format!("{:.1}", row.rect.y2),
        row.page.to_string(),
        format!("{:.3}", row.similarity),
        row.color.clone(),
        row.band.to_string(),
        row.area_code.clone().unwrap_or_default(),
        row.partner_id.clone().unwrap_or_default(),
    ]
    .into_iter()
}

fn push_record(out: &mut String, fields: impl Iterator<Item = String>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(&field));
    }
    out.push_str("\r\n");
}

/// Quote a field when it contains a comma, quote or line break.
fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_header_only() {
        let csv = to_csv(&[]);
        assert!(csv.starts_with("id,source,text,x1"));
        assert!(csv.ends_with("partner_id\r\n"));
    }
}
