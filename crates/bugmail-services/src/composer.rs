//! HTML rendering of a bug report.

use bugmail_core::models::{BugReport, UploadedLink};
use html_escape::{encode_double_quoted_attribute, encode_text};

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<style>
  body {
    font-family: Arial, Helvetica, sans-serif;
    color: #222;
    font-size: 15px;
    line-height: 1.6;
  }
  h2, h3 { margin-top: 18px; margin-bottom: 8px; }
  ul, ol { margin-bottom: 14px; }
  li { margin-bottom: 6px; }
  .emoji { font-size: 18px; vertical-align: middle; }
</style>
</head>
<body>
"#;

const TAIL: &str = "</body>\n</html>\n";

/// Placeholder for the optional notes field.
const EMPTY_NOTES: &str = "-";

/// Renders reports as self-contained HTML documents. Pure; performs no I/O.
pub struct ReportComposer;

impl ReportComposer {
    /// Build the email body for `report`, with an Attachments section listing
    /// `links` in order when there are any.
    ///
    /// All user-supplied text and URLs are HTML-escaped.
    pub fn compose(report: &BugReport, links: &[UploadedLink]) -> String {
        let mut html = String::from(HEAD);

        heading(&mut html, "h2", "&#x1F9ED;", "Summary");
        html.push_str(&format!("<div>{}</div>\n", multiline(&report.summary)));

        heading(&mut html, "h3", "&#x1F98E;", "Steps to Reproduce");
        html.push_str("<ol>\n");
        for step in report.step_lines() {
            html.push_str(&format!("<li>{}</li>\n", encode_text(step)));
        }
        html.push_str("</ol>\n");

        heading(&mut html, "h3", "&#x2705;", "Expected Result");
        single_item(&mut html, &report.expected);

        heading(&mut html, "h3", "&#x274C;", "Actual Result");
        single_item(&mut html, &report.actual);

        heading(&mut html, "h3", "&#x1F4DD;", "Additional Notes");
        if report.notes.trim().is_empty() {
            single_item(&mut html, EMPTY_NOTES);
        } else {
            single_item(&mut html, &report.notes);
        }

        if !links.is_empty() {
            html.push_str(&attachments_section(links));
        }

        html.push_str(TAIL);
        html
    }
}

fn heading(html: &mut String, tag: &str, icon: &str, title: &str) {
    html.push_str(&format!(
        "<{tag}><span class=\"emoji\">{icon}</span> <b>{title}</b></{tag}>\n"
    ));
}

fn single_item(html: &mut String, text: &str) {
    html.push_str(&format!("<ul><li>{}</li></ul>\n", multiline(text)));
}

/// Escape `text` and keep its line breaks as `<br>`.
fn multiline(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| encode_text(line.trim_end()).into_owned())
        .collect::<Vec<_>>()
        .join("<br>\n")
}

fn attachments_section(links: &[UploadedLink]) -> String {
    let mut section =
        String::from("<h3 style=\"margin-top:24px;\"><b>Attachments</b></h3>\n<ul>\n");
    for link in links {
        section.push_str(&format!(
            "<li><a href=\"{}\" target=\"_blank\">{}</a></li>\n",
            encode_double_quoted_attribute(&link.url),
            encode_text(&link.label)
        ));
    }
    section.push_str("</ul>\n");
    section
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> BugReport {
        BugReport {
            summary: "X".to_string(),
            steps: "a\n\nb".to_string(),
            expected: "E".to_string(),
            actual: "A".to_string(),
            notes: String::new(),
        }
    }

    fn link(label: &str, url: &str) -> UploadedLink {
        UploadedLink {
            label: label.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn steps_become_ordered_items_without_blank_lines() {
        let html = ReportComposer::compose(&report(), &[]);
        assert!(html.contains("<ol>\n<li>a</li>\n<li>b</li>\n</ol>"));
        assert_eq!(html.matches("<li>").count(), 2 + 3);
    }

    #[test]
    fn no_links_means_no_attachments_section() {
        let html = ReportComposer::compose(&report(), &[]);
        assert!(!html.contains("Attachments"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn attachments_sit_right_before_closing_body_in_order() {
        let links = vec![
            link("SCREENSHOT1", "https://cdn.example/a.png"),
            link("VIDEO1", "https://cdn.example/c.mp4"),
        ];
        let html = ReportComposer::compose(&report(), &links);

        let section = html.find("<b>Attachments</b>").unwrap();
        let notes = html.find("Additional Notes").unwrap();
        let first = html.find("SCREENSHOT1").unwrap();
        let second = html.find("VIDEO1").unwrap();
        assert!(notes < section && section < first && first < second);
        let last = "<li><a href=\"https://cdn.example/c.mp4\" target=\"_blank\">VIDEO1</a></li>\n";
        assert!(html.contains(&format!("{}</ul>\n</body>", last)));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut r = report();
        r.summary = "<script>alert(1)</script>".to_string();
        r.steps = "click <b>".to_string();
        r.notes = "a & b".to_string();
        let links = vec![link("FILE_<x>.txt", "https://cdn.example/x?a=1&b=\"2\"")];

        let html = ReportComposer::compose(&r, &links);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("<li>click &lt;b&gt;</li>"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("FILE_&lt;x&gt;.txt"));
        assert!(html.contains("href=\"https://cdn.example/x?a=1&amp;b=&quot;2&quot;\""));
    }

    #[test]
    fn line_breaks_are_preserved() {
        let mut r = report();
        r.actual = "first\nsecond".to_string();
        let html = ReportComposer::compose(&r, &[]);
        assert!(html.contains("<ul><li>first<br>\nsecond</li></ul>"));
    }

    #[test]
    fn empty_notes_render_placeholder() {
        let html = ReportComposer::compose(&report(), &[]);
        assert!(html.contains("<b>Additional Notes</b></h3>\n<ul><li>-</li></ul>"));
    }
}
