//! Minimal RFC 4180 CSV writer.

/// Render one record, CRLF-terminated. Fields containing a comma, a quote
/// or a line break are quoted, with inner quotes doubled.
pub fn write_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

/// Render an optional header followed by rows.
pub fn to_csv<S: AsRef<str>>(header: Option<&[S]>, rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        out.push_str(&write_record(header));
    }
    for row in rows {
        out.push_str(&write_record(row));
    }
    out
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_record() {
        assert_eq!(write_record(&["a", "b", "c"]), "a,b,c\r\n");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(
            write_record(&["Smith, John", "say \"hi\"", "two\nlines", "plain"]),
            "\"Smith, John\",\"say \"\"hi\"\"\",\"two\nlines\",plain\r\n"
        );
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(write_record(&["", "x", ""]), ",x,\r\n");
    }

    #[test]
    fn test_with_header() {
        let rows = vec![
            vec!["1".to_string(), "Ada".to_string()],
            vec!["2".to_string(), "Grace".to_string()],
        ];
        let header = ["id".to_string(), "name".to_string()];
        assert_eq!(
            to_csv(Some(&header[..]), &rows),
            "id,name\r\n1,Ada\r\n2,Grace\r\n"
        );
        assert_eq!(to_csv::<String>(None, &rows), "1,Ada\r\n2,Grace\r\n");
    }
}
