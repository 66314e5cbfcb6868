//! Tag scanner: splits a raw template into literal and directive segments.

use crate::error::ScanError;

pub const OPEN: &str = "<%";
pub const CLOSE: &str = "%>";

/// One piece of a template.
///
/// Directive variants hold the interior text exactly as written; whitespace is
/// never trimmed, because it belongs to the directive's own statement or
/// expression text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Raw text outside any directive, emitted verbatim into the output.
    Literal(String),
    /// Interior of `<%= ... %>`; its evaluated result is appended to the output.
    Value(String),
    /// Interior of `<% ... %>`; executed for control flow, appends nothing itself.
    Statement(String),
}

impl Segment {
    /// The exact source span this segment was scanned from.
    ///
    /// Concatenating the spans of all segments, in order, reconstructs the
    /// input template byte-for-byte.
    pub fn source(&self) -> String {
        match self {
            Segment::Literal(text) => text.clone(),
            Segment::Value(expr) => format!("{OPEN}={expr}{CLOSE}"),
            Segment::Statement(stmt) => format!("{OPEN}{stmt}{CLOSE}"),
        }
    }
}

/// Split `template` into an ordered segment sequence.
///
/// Scans left to right for `<%`. Everything between the end of one directive
/// (or the start of the template) and the next `<%` is a literal; empty
/// literals are skipped. A directive whose interior starts with `=` is a
/// value directive, anything else a statement directive. Nested `<%` inside a
/// directive is not recognized; the first `%>` terminates it. An `<%` with no
/// `%>` before end of input fails with the byte offset of the open marker.
pub fn scan(template: &str) -> Result<Vec<Segment>, ScanError> {
    let mut segments = Vec::new();
    let mut rest = template;
    let mut offset = 0;

    while !rest.is_empty() {
        let Some(start) = rest.find(OPEN) else {
            segments.push(Segment::Literal(rest.to_string()));
            break;
        };
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }

        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            return Err(ScanError::UnterminatedDirective {
                offset: offset + start,
            });
        };

        let interior = &after_open[..end];
        match interior.strip_prefix('=') {
            Some(expr) => segments.push(Segment::Value(expr.to_string())),
            None => segments.push(Segment::Statement(interior.to_string())),
        }

        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_only() {
        let segments = scan("hello world").unwrap();
        assert_eq!(segments, vec![Segment::Literal("hello world".to_string())]);
    }

    #[test]
    fn value_and_statement_directives() {
        let segments = scan("<div><%= name %></div><% if (x) { %>!<% } %>").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("<div>".to_string()),
                Segment::Value(" name ".to_string()),
                Segment::Literal("</div>".to_string()),
                Segment::Statement(" if (x) { ".to_string()),
                Segment::Literal("!".to_string()),
                Segment::Statement(" } ".to_string()),
            ]
        );
    }

    #[test]
    fn whitespace_inside_directives_is_preserved() {
        let segments = scan("<%=name%><%=  name  %>").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Value("name".to_string()),
                Segment::Value("  name  ".to_string()),
            ]
        );
    }

    #[test]
    fn adjacent_directives_produce_no_empty_literals() {
        let segments = scan("<% a; %><% b; %>").unwrap();
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| matches!(s, Segment::Statement(_))));
    }

    #[test]
    fn first_close_marker_terminates_a_directive() {
        let segments = scan("<% a <% b %>").unwrap();
        assert_eq!(segments, vec![Segment::Statement(" a <% b ".to_string())]);
    }

    #[test]
    fn round_trip_reconstructs_the_template() {
        let template = "a<%= x %>b<% if (y) { %>c<% } %>\nd'quote'<%empty%>";
        let segments = scan(template).unwrap();
        let rebuilt: String = segments.iter().map(Segment::source).collect();
        assert_eq!(rebuilt, template);
    }

    #[test]
    fn unterminated_directive_reports_open_offset() {
        let err = scan("abc<%= name").unwrap_err();
        assert_eq!(err, ScanError::UnterminatedDirective { offset: 3 });
    }

    #[test]
    fn stray_close_marker_is_literal() {
        let segments = scan("100%> done").unwrap();
        assert_eq!(segments, vec![Segment::Literal("100%> done".to_string())]);
    }
}
