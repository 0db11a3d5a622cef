//! Minimal RFC 4180 CSV reading and field escaping.

use thiserror::Error;

/// Errors raised while reading CSV input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("No columns to parse from file")]
    Empty,

    #[error("Unterminated quoted field starting on line {0}")]
    UnterminatedQuote(usize),

    #[error("Expected {expected} fields in line {line}, saw {found}")]
    TooManyFields {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Split CSV text into records of fields.
///
/// Handles quoted fields, doubled quotes, embedded newlines and both `\n`
/// and `\r\n` line endings. A quote only opens a quoted field at the start
/// of a field; anywhere else it is a literal character. Blank lines are
/// skipped. Each record carries the 1-based line it started on.
pub fn parse_records(input: &str) -> Result<Vec<(usize, Vec<String>)>, CsvError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut quote_line = 0;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
                quote_line = line;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record), record_line);
                field_started = false;
                line += 1;
                record_line = line;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote(quote_line));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record, record_line);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, record: Vec<String>, line: usize) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push((line, record));
    }
}

/// Escape a string for CSV output.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(input: &str) -> Vec<Vec<String>> {
        parse_records(input)
            .unwrap()
            .into_iter()
            .map(|(_, r)| r)
            .collect()
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(
            fields("a,b\n1,2\n"),
            vec![vec!["a", "b"], vec!["1", "2"]]
        );
    }

    #[test]
    fn test_parse_quoted_fields() {
        assert_eq!(
            fields("name,text\n\"Doe, Jane\",\"said \"\"hi\"\"\nand left\"\r\n"),
            vec![
                vec!["name", "text"],
                vec!["Doe, Jane", "said \"hi\"\nand left"],
            ]
        );
    }

    #[test]
    fn test_parse_skips_blank_lines_and_bom() {
        let records = parse_records("\u{feff}id\r\n\r\n1\r\n\n2").unwrap();
        assert_eq!(
            records,
            vec![
                (1, vec!["id".to_string()]),
                (3, vec!["1".to_string()]),
                (5, vec!["2".to_string()]),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_empty_trailing_field() {
        assert_eq!(fields("a,b\n1,\n"), vec![vec!["a", "b"], vec!["1", ""]]);
    }

    #[test]
    fn test_parse_quote_inside_unquoted_field_is_literal() {
        assert_eq!(
            fields("id,height\n1,5'10\" tall\n2,6'\n3,\"quoted\"\n"),
            vec![
                vec!["id", "height"],
                vec!["1", "5'10\" tall"],
                vec!["2", "6'"],
                vec!["3", "quoted"],
            ]
        );
        assert_eq!(fields("a\nsays \"hi\"\n"), vec![vec!["a"], vec!["says \"hi\""]]);
    }

    #[test]
    fn test_parse_unterminated_quote() {
        assert_eq!(
            parse_records("a\n\"open\n"),
            Err(CsvError::UnterminatedQuote(2))
        );
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"x\""), "\"say \"\"x\"\"\"");
        assert_eq!(escape_csv("line\nbreak"), "\"line\nbreak\"");
    }
}
