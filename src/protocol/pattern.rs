//! SCPI header pattern matching
//!
//! Patterns use the usual notation: upper-case letters are the short form,
//! the whole keyword is the long form, `[...]` marks an optional node and a
//! trailing `?` marks a query. `[ROUTe]:CLOSe?` matches `CLOS?`,
//! `rout:close?` and `:ROUTE:CLOS?`, but not `CLOS` or `CLOS:STAT?`.

use heapless::Vec;

/// Most nodes in a pattern or header
const MAX_NODES: usize = 6;

#[derive(Clone, Copy, Debug)]
struct Node<'a> {
    keyword: &'a str,
    optional: bool,
}

/// Check a received header against a command pattern
#[must_use]
pub fn matches(pattern: &str, header: &str) -> bool {
    let (pattern, pattern_query) = split_query(pattern);
    let (header, header_query) = split_query(header);
    if pattern_query != header_query {
        return false;
    }

    let Some(pattern_nodes) = pattern_nodes(pattern) else {
        return false;
    };

    let header = header.strip_prefix(':').unwrap_or(header);
    let mut header_nodes: Vec<&str, MAX_NODES> = Vec::new();
    for node in header.split(':') {
        if node.is_empty() || header_nodes.push(node).is_err() {
            return false;
        }
    }

    match_nodes(&pattern_nodes, &header_nodes)
}

/// Check one received keyword against a pattern keyword
///
/// The short form is the leading run of characters that are not lower-case.
#[must_use]
pub fn keyword_matches(keyword: &str, input: &str) -> bool {
    let short_len = keyword
        .find(|c: char| c.is_ascii_lowercase())
        .unwrap_or(keyword.len());

    input.eq_ignore_ascii_case(&keyword[..short_len]) || input.eq_ignore_ascii_case(keyword)
}

fn split_query(text: &str) -> (&str, bool) {
    match text.strip_suffix('?') {
        Some(stem) => (stem, true),
        None => (text, false),
    }
}

fn pattern_nodes(pattern: &str) -> Option<Vec<Node<'_>, MAX_NODES>> {
    let mut nodes = Vec::new();
    let mut rest = pattern;

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('[') {
            let end = inner.find(']')?;
            let keyword = inner[..end].trim_start_matches(':');
            nodes
                .push(Node {
                    keyword,
                    optional: true,
                })
                .ok()?;
            rest = &inner[end + 1..];
        } else {
            let text = rest.strip_prefix(':').unwrap_or(rest);
            let end = text.find(&[':', '['][..]).unwrap_or(text.len());
            nodes
                .push(Node {
                    keyword: &text[..end],
                    optional: false,
                })
                .ok()?;
            rest = &text[end..];
        }
    }

    Some(nodes)
}

fn match_nodes(pattern: &[Node<'_>], header: &[&str]) -> bool {
    let Some((node, pattern_rest)) = pattern.split_first() else {
        return header.is_empty();
    };

    let consumed = header
        .split_first()
        .is_some_and(|(input, header_rest)| {
            keyword_matches(node.keyword, input) && match_nodes(pattern_rest, header_rest)
        });

    consumed || (node.optional && match_nodes(pattern_rest, header))
}
