use crate::db::Article;

pub const EXPORT_FILENAME: &str = "google_news.csv";

/// Column names, in `Article` field order.
pub const HEADER: [&str; 5] = ["entity_name", "title", "link", "published_at", "source"];

/// Render articles as CSV, header row included.
pub fn to_csv(articles: &[Article]) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for article in articles {
        writer.serialize(article)?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, link: &str) -> Article {
        Article {
            entity_name: "Acme Capital".to_string(),
            title: title.to_string(),
            link: link.to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 10, 10, 8, 30, 0).unwrap(),
            source: "Google News".to_string(),
        }
    }

    #[test]
    fn test_header_and_rows() {
        let csv = to_csv(&[
            article("First", "https://x/1"),
            article("Second", "https://x/2"),
        ])
        .unwrap();

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "entity_name,title,link,published_at,source");
        assert_eq!(
            lines[1],
            "Acme Capital,First,https://x/1,2026-10-10T08:30:00Z,Google News"
        );
    }

    #[test]
    fn test_empty_still_has_header() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(csv, "entity_name,title,link,published_at,source\n");
    }

    #[test]
    fn test_fields_are_quoted() {
        let csv = to_csv(&[article("Acme, \"the\" fund", "https://x/1")]).unwrap();
        assert!(csv.contains(r#""Acme, ""the"" fund""#));
    }

    #[test]
    fn test_header_matches_article_fields() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(article("t", "https://x/1")).unwrap();
        let bytes = writer.into_inner().unwrap();
        let derived = String::from_utf8(bytes).unwrap();

        assert_eq!(derived.lines().next().unwrap(), HEADER.join(","));
    }
}
