//! Renders an assembled section tree into one of the three supported
//! output formats. A format conversion failure here never discards the
//! report — `ReportingSystem::generate` keeps whichever formats
//! succeeded (§4.7).

use crate::error::{ReportError, Result};
use crate::types::{ReportFormat, Section};

pub fn render(title: &str, sections: &[Section], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(render_markdown(title, sections, 1)),
        ReportFormat::Html => Ok(render_html(title, sections)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(sections).map_err(|e| ReportError::RenderFailed(e.to_string()).into())
        }
    }
}

fn render_markdown(title: &str, sections: &[Section], depth: usize) -> String {
    let mut out = String::new();
    if depth == 1 {
        out.push_str(&format!("# {title}\n\n"));
    }
    for section in sections {
        out.push_str(&"#".repeat(depth + 1));
        out.push(' ');
        out.push_str(&section.heading);
        out.push_str("\n\n");
        out.push_str(&section.body);
        out.push_str("\n\n");
        if !section.children.is_empty() {
            out.push_str(&render_markdown(title, &section.children, depth + 1));
        }
    }
    out
}

fn render_html(title: &str, sections: &[Section]) -> String {
    let mut out = format!("<html><head><title>{}</title></head><body><h1>{}</h1>", escape(title), escape(title));
    render_html_sections(&mut out, sections, 2);
    out.push_str("</body></html>");
    out
}

fn render_html_sections(out: &mut String, sections: &[Section], level: usize) {
    for section in sections {
        out.push_str(&format!("<h{level}>{}</h{level}>", escape(&section.heading)));
        out.push_str(&format!("<p>{}</p>", escape(&section.body)));
        if !section.children.is_empty() {
            render_html_sections(out, &section.children, level + 1);
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_nests_child_sections() {
        let sections = vec![Section {
            heading: "Top".to_string(),
            body: "body".to_string(),
            children: vec![Section { heading: "Child".to_string(), body: "child body".to_string(), children: vec![] }],
        }];
        let rendered = render_markdown("Report", &sections, 1);
        assert!(rendered.contains("## Top"));
        assert!(rendered.contains("### Child"));
    }

    #[test]
    fn html_escapes_content() {
        let sections = vec![Section { heading: "<script>".to_string(), body: "x".to_string(), children: vec![] }];
        let rendered = render_html("T", &sections);
        assert!(!rendered.contains("<script>"));
    }
}
