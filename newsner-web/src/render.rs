//! HTML rendering of annotated documents.
//!
//! Produces the highlighted article view: entity spans become `<mark>`
//! elements tinted with the label's color, everything else is escaped text.

use newsner_core::AnnotatedDocument;

/// Minimal HTML escaping for text nodes and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the document text with entity spans wrapped in `<mark>` tags.
///
/// Entities are applied left to right; a span that starts before the cursor
/// (cross-label overlap survived reconciliation) is skipped rather than
/// producing nested markup.
pub fn highlight_html(document: &AnnotatedDocument) -> String {
    let text = &document.text;
    let mut spans: Vec<_> = document.entities.iter().collect();
    spans.sort_by_key(|e| (e.start, e.end));

    let mut html = String::with_capacity(text.len() * 2);
    let mut cursor = 0usize;
    for entity in spans {
        if entity.start < cursor || entity.end > text.len() {
            continue;
        }
        html.push_str(&escape_html(&text[cursor..entity.start]));
        html.push_str(&format!(
            "<mark class=\"ent\" style=\"background:{}\" title=\"{} ({:.2})\">{}<span class=\"tag\">{}</span></mark>",
            entity.label.color(),
            entity.label.name(),
            entity.score,
            escape_html(&text[entity.start..entity.end]),
            entity.label.name(),
        ));
        cursor = entity.end;
    }
    html.push_str(&escape_html(&text[cursor..]));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsner_core::{EntityLabel, EntitySpan};

    fn doc(text: &str, entities: Vec<EntitySpan>) -> AnnotatedDocument {
        AnnotatedDocument {
            text: text.to_string(),
            entities,
            tokens: vec![],
            tags: vec![],
        }
    }

    fn span(text: &str, word: &str, label: EntityLabel) -> EntitySpan {
        let start = text.find(word).unwrap();
        EntitySpan {
            start,
            end: start + word.len(),
            label,
            text: word.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_highlight_wraps_entity() {
        let text = "นายสมชายเดินทาง";
        let html = highlight_html(&doc(text, vec![span(text, "สมชาย", EntityLabel::Person)]));
        assert!(html.starts_with("นาย<mark"));
        assert!(html.contains("สมชาย<span class=\"tag\">PERSON</span>"));
        assert!(html.ends_with("</mark>เดินทาง"));
    }

    #[test]
    fn test_highlight_escapes_surrounding_markup() {
        let text = "<script>สมชาย</script>";
        let html = highlight_html(&doc(text, vec![span(text, "สมชาย", EntityLabel::Person)]));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_overlapping_span_skipped() {
        let text = "กรุงเทพมหานคร";
        let long = EntitySpan {
            start: 0,
            end: text.len(),
            label: EntityLabel::Location,
            text: text.to_string(),
            score: 0.9,
        };
        let short = EntitySpan {
            start: 0,
            end: "กรุงเทพ".len(),
            label: EntityLabel::Organization,
            text: "กรุงเทพ".to_string(),
            score: 0.9,
        };
        let html = highlight_html(&doc(text, vec![long, short]));
        assert_eq!(html.matches("<mark").count(), 1);
    }
}
