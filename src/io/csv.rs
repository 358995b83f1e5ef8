//! Minimal CSV codec for sheet files
//!
//! Covers the RFC 4180 subset the sheet reader/writer need: quoted
//! fields, doubled-quote escapes, embedded newlines and CRLF endings.

/// Parse CSV content into records of fields
pub fn parse(content: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {} // part of CRLF, the '\n' closes the record
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

/// Format records back into CSV with a trailing newline
pub fn format(records: &[Vec<String>]) -> String {
    let mut out = String::new();
    for record in records {
        let line: Vec<String> = record.iter().map(|field| escape(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_records() {
        let records = parse("a,b,c\n1,2,3\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], vec!["a", "b", "c"]);
        assert_eq!(records[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_parse_quoted_fields_with_newlines() {
        let records = parse("header\n\"line one\nline two\"\n");
        assert_eq!(records[1], vec!["line one\nline two"]);
    }

    #[test]
    fn test_parse_escaped_quotes() {
        let records = parse("\"say \"\"hi\"\"\",next\n");
        assert_eq!(records[0], vec!["say \"hi\"", "next"]);
    }

    #[test]
    fn test_parse_crlf() {
        let records = parse("a,b\r\nc,d\r\n");
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_parse_without_trailing_newline() {
        let records = parse("a,b\nc,d");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["c", "d"]);
    }

    #[test]
    fn test_format_escapes_special_fields() {
        let records = vec![vec![
            "plain".to_string(),
            "with,comma".to_string(),
            "multi\nline".to_string(),
        ]];
        assert_eq!(format(&records), "plain,\"with,comma\",\"multi\nline\"\n");
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let records = vec![
            vec!["en-US".to_string(), "de-DE".to_string()],
            vec!["a \"quoted\" word".to_string(), "two\nlines".to_string()],
            vec!["0".to_string(), "false".to_string()],
        ];
        assert_eq!(parse(&format(&records)), records);
    }
}
