//! Index page linking a message's attachments.

use std::fmt::Write;

use crate::capture::attachments::AttachmentRecord;

const TEMPLATE: &str = include_str!("attachments.html");

/// Values substituted into the index template.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub title: String,
    pub attachments: Vec<AttachmentRecord>,
}

/// Render the index page.
///
/// `{{title}}` and `{{attachments}}` are replaced in a single pass, so text
/// inside the substituted values is never expanded again. Unknown
/// placeholders are left as they are.
pub fn render_index(options: IndexOptions) -> Vec<u8> {
    let mut out = String::with_capacity(TEMPLATE.len() + options.attachments.len() * 128);
    let mut rest = TEMPLATE;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };

        match tail[..end].trim() {
            "title" => out.push_str(&html_escape(&options.title)),
            "attachments" => render_rows(&mut out, &options.attachments),
            _ => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &tail[end + 2..];
    }
    out.push_str(rest);

    out.into_bytes()
}

fn render_rows(out: &mut String, records: &[AttachmentRecord]) {
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "<li><a href=\"{}\">{}</a></li>",
            html_escape(&record.artifact_path.to_string_lossy()),
            html_escape(&record.display_name)
        );
    }
}

/// Minimal HTML escaping for text and attribute values.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
