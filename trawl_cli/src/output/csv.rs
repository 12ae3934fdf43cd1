//! CSV export of a search run.
//!
//! Every field is quoted; reliable links come first, then the remaining unique links,
//! each group in rank order.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use trawl_core::{AggregationRun, Link};

const HEADER: [&str; 5] = ["URL", "Title", "Score", "Is profile page", "Is PDF"];

pub fn write_csv_file(path: &Path, run: &AggregationRun, threshold: usize) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(&mut writer, run, threshold)?;
    writer.flush()
}

pub fn write_csv<W: Write>(out: &mut W, run: &AggregationRun, threshold: usize) -> io::Result<()> {
    write_row(out, HEADER)?;

    let (reliable, rest): (Vec<&Link>, Vec<&Link>) = run
        .unique_links
        .iter()
        .partition(|l| l.is_reliable(threshold));

    for (group, is_reliable) in [(reliable, true), (rest, false)] {
        for link in group {
            let score = link.junk_score().to_string();
            write_row(
                out,
                [
                    link.url(),
                    link.title(),
                    score.as_str(),
                    flag(is_reliable),
                    flag(link.is_document()),
                ],
            )?;
        }
    }
    Ok(())
}

fn write_row<W: Write, const N: usize>(out: &mut W, fields: [&str; N]) -> io::Result<()> {
    let line = fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(",");
    write!(out, "{}\r\n", line)
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Wrap a field in double quotes, doubling any embedded quote.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\", ok"), "\"say \"\"hi\"\", ok\"");
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn test_reliable_rows_come_first() {
        let mut run = AggregationRun::new("john");
        run.unique_links = vec![
            Link::new("https://site.com/johnny", "Johnny's \"page\"", "john", "bing"),
            Link::new("https://github.com/john", "GitHub", "john", "google"),
            Link::new("https://files.org/john-cv.pdf", "CV", "john", "bing"),
        ];

        let mut buf = Vec::new();
        write_csv(&mut buf, &run, 300).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "\"URL\",\"Title\",\"Score\",\"Is profile page\",\"Is PDF\""
        );
        assert!(lines[1].starts_with("\"https://github.com/john\",\"GitHub\",\"80\",\"True\""));
        assert!(lines[2].starts_with("\"https://files.org/john-cv.pdf\""));
        assert!(lines[2].ends_with("\"True\",\"True\""));
        assert_eq!(
            lines[3],
            format!(
                "\"https://site.com/johnny\",\"Johnny's \"\"page\"\"\",\"{}\",\"False\",\"False\"",
                run.unique_links[0].junk_score()
            )
        );
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv_file(&path, &AggregationRun::new("john"), 300).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "\"URL\",\"Title\",\"Score\",\"Is profile page\",\"Is PDF\"\r\n"
        );
    }
}
