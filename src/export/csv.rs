// CSV rendering of `env_logs` records.
//
// Rows are joined with `\n` and the document has no trailing newline. A field
// is quoted only when it contains a comma, a quote or a newline.

use std::borrow::Cow;

use crate::models::{Reading, ReadingField};

pub const DATE_COLUMN: &str = "Date";

pub fn escape_field(raw: &str) -> Cow<'_, str> {
    if raw.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", raw.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(raw)
    }
}

pub fn header(with_date: bool) -> String {
    let labels = ReadingField::ALL.iter().map(|field| field.label());
    if with_date {
        std::iter::once(DATE_COLUMN).chain(labels).collect::<Vec<_>>().join(",")
    } else {
        labels.collect::<Vec<_>>().join(",")
    }
}

fn row(reading: &Reading, date: Option<&str>) -> String {
    let mut fields: Vec<String> = Vec::with_capacity(ReadingField::ALL.len() + 1);
    if let Some(date) = date {
        fields.push(escape_field(date).into_owned());
    }
    for field in ReadingField::ALL {
        let raw = reading.field(field).unwrap_or_default();
        fields.push(escape_field(&raw).into_owned());
    }
    fields.join(",")
}

/// Header plus one row per record.
pub fn render_day<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> String {
    std::iter::once(header(false))
        .chain(readings.into_iter().map(|r| row(r, None)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows of one day in the bulk layout (leading `Date` column), no header.
pub fn bulk_rows<'a>(date: &str, readings: impl IntoIterator<Item = &'a Reading>) -> Vec<String> {
    readings.into_iter().map(|r| row(r, Some(date))).collect()
}

/// Bulk document from pre-rendered rows.
pub fn render_bulk(rows: &[String]) -> String {
    std::iter::once(header(true))
        .chain(rows.iter().cloned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a document produced by the renderers. Quoted fields may contain
/// commas, doubled quotes and newlines.
pub fn parse(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    if content.is_empty() {
        return records;
    }

    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                other => field.push(other),
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            other => field.push(other),
        }
    }

    record.push(field);
    records.push(record);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(escape_field("12000"), "12000");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn day_document_layout() {
        let reading = Reading {
            timestamp: Some(Timestamp::Millis(1_704_067_200_000)),
            pc0_1: Some(12_000.0),
            temperature: Some(27.5),
            ..Reading::default()
        };
        let csv = render_day([&reading]);
        assert_eq!(
            csv,
            "Time,PM2.5,PM10,Pc0.1 (Now),Temp (°C),Humidity (%),Wind (m/s),+15m,+30m,+60m\n\
             1704067200000,,,12000,27.5,,,,,"
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn awkward_text_survives_parse() {
        let reading = Reading {
            timestamp: Some(Timestamp::Text("2024-01-01 08:00, \"local\"\nsite B".into())),
            pm10: Some(40.0),
            ..Reading::default()
        };
        let csv = render_bulk(&bulk_rows("2024-01-01", [&reading]));
        let parsed = parse(&csv);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0][0], "Date");
        assert_eq!(parsed[0].len(), 11);
        assert_eq!(parsed[1][0], "2024-01-01");
        assert_eq!(parsed[1][1], "2024-01-01 08:00, \"local\"\nsite B");
        assert_eq!(parsed[1][3], "40");
        assert_eq!(parsed[1].len(), 11);
    }
}
