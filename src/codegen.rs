//! Code generator: turns a segment sequence into the source body of a render
//! unit, one statement line per segment.
//!
//! All generated statements are written against two fixed binding names: the
//! output accumulator and the data context. The render unit binds the same
//! names, so generated references resolve when the body runs.

use crate::scanner::Segment;

/// Name the generated code appends to.
pub const ACCUMULATOR: &str = "__out__";
/// Name the generated code reads the caller's data through.
pub const CONTEXT: &str = "__data__";

/// The generated source body: an ordered sequence of statement lines.
///
/// One line per segment, in segment order. Line order is the whole contract;
/// it is what lets control-flow fragments emitted by separate statement
/// directives close over the append statements between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBody {
    lines: Vec<String>,
}

impl SourceBody {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The whole body as one piece of source text.
    pub fn as_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Emit one statement line per segment, in segment order.
///
/// - literals become `__out__ += '...';` with the text escaped,
/// - value directives become `__out__ += (expr);` with the expression spliced
///   in unescaped,
/// - statement directives are emitted verbatim; fragments like `if (x) {` and
///   `} else {` are stitched back into one structure by the brace rules of the
///   generated language when the body is parsed.
///
/// No validation happens here. A directive that splices broken syntax is only
/// caught when the body is compiled.
pub fn generate(segments: &[Segment]) -> SourceBody {
    let lines = segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => {
                format!("{ACCUMULATOR} += '{}';", escape_literal(text))
            }
            Segment::Value(expr) => format!("{ACCUMULATOR} += ({expr});"),
            Segment::Statement(stmt) => stmt.clone(),
        })
        .collect();
    SourceBody { lines }
}

/// Escape literal text for splicing between single quotes.
///
/// The quote character and the backslash are the only bytes that could
/// terminate or extend the generated string literal, so both are
/// backslash-escaped and nothing else is touched. Newlines stay raw; string
/// literals in the generated language span lines.
fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_segment_in_order() {
        let segments = vec![
            Segment::Statement(" if (x) { ".to_string()),
            Segment::Literal("yes".to_string()),
            Segment::Statement(" } ".to_string()),
        ];
        let body = generate(&segments);
        assert_eq!(
            body.lines(),
            &[
                " if (x) { ".to_string(),
                "__out__ += 'yes';".to_string(),
                " } ".to_string(),
            ]
        );
    }

    #[test]
    fn literal_quotes_and_backslashes_are_escaped() {
        let segments = vec![Segment::Literal(r"it's a \ path".to_string())];
        let body = generate(&segments);
        assert_eq!(body.lines(), &[r"__out__ += 'it\'s a \\ path';".to_string()]);
    }

    #[test]
    fn literal_newlines_stay_raw() {
        let segments = vec![Segment::Literal("a\nb".to_string())];
        let body = generate(&segments);
        assert_eq!(body.lines(), &["__out__ += 'a\nb';".to_string()]);
    }

    #[test]
    fn value_expression_is_spliced_unescaped() {
        let segments = vec![Segment::Value(" user.name ".to_string())];
        let body = generate(&segments);
        assert_eq!(body.lines(), &["__out__ += ( user.name );".to_string()]);
    }
}
