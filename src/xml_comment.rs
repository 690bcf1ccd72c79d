//! Documentation-comment parsing.
//!
//! Comment blobs are XML fragments (`<summary>…</summary><param name="x">…</param>`)
//! without a single root. The blob is wrapped in a synthetic root and parsed;
//! inline tags are rendered to markdown. Anything that fails to parse yields
//! no documentation rather than an error.

use indexmap::IndexMap;
use roxmltree::{Document, Node};

/// Parsed documentation for one symbol. Empty elements are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlComment {
    /// Each `<example>`.
    pub examples: Vec<String>,
    /// Each `<exception cref="…">`.
    pub exceptions: Vec<ExceptionDoc>,
    /// `<param name="…">` descriptions in declaration order.
    pub params: IndexMap<String, String>,
    /// `<remarks>`.
    pub remarks: Option<String>,
    /// `<returns>`.
    pub returns: Option<String>,
    /// Each `<seealso>`, as markdown.
    pub see_also: Vec<String>,
    /// `<summary>`.
    pub summary: Option<String>,
    /// `<typeparam name="…">` descriptions in declaration order.
    pub type_params: IndexMap<String, String>,
    /// `<value>`, the property value description.
    pub value: Option<String>,
}

/// One documented exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionDoc {
    /// Markdown description.
    pub description: String,
    /// Exception type id with any `T:` prefix removed.
    pub type_id: String,
}

impl XmlComment {
    /// Parse a documentation blob. Returns `None` for a missing blob or
    /// one that is not well-formed once wrapped.
    pub fn parse(blob: Option<&str>) -> Option<Self> {
        let blob = blob?;
        let wrapped = format!("<doc>{blob}</doc>");
        let document = match Document::parse(&wrapped) {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(error = %e, "malformed documentation comment ignored");
                return None;
            },
        };

        let mut comment = Self::default();
        for element in document.root_element().children().filter(Node::is_element) {
            let text = render_block(element);
            match element.tag_name().name() {
                "summary" => keep_first(&mut comment.summary, text),
                "remarks" => keep_first(&mut comment.remarks, text),
                "returns" => keep_first(&mut comment.returns, text),
                "value" => keep_first(&mut comment.value, text),
                "example" => comment.examples.extend(non_empty(text)),
                "seealso" => comment.see_also.extend(non_empty(render_reference(element))),
                "exception" => {
                    if let Some(cref) = element.attribute("cref") {
                        comment.exceptions.push(ExceptionDoc {
                            type_id: strip_id_prefix(cref).to_string(),
                            description: text,
                        });
                    }
                },
                "param" => insert_named(&mut comment.params, element, text),
                "typeparam" => insert_named(&mut comment.type_params, element, text),
                _ => {},
            }
        }
        return Some(comment);
    }
}

/// Fill a single-valued slot once; later repeats of the element are ignored.
fn keep_first(slot: &mut Option<String>, text: String) {
    if slot.is_none() {
        *slot = non_empty(text);
    }
}

/// Record a `name`-attributed description; the first occurrence of a name wins.
fn insert_named(map: &mut IndexMap<String, String>, element: Node<'_, '_>, text: String) {
    let Some(name) = element.attribute("name") else {
        return;
    };
    map.entry(name.trim().to_string()).or_insert(text);
}

/// `None` for blank text.
fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    return Some(text);
}

/// Drop the one-letter kind prefix of a documentation id (`T:`, `M:`, `P:` …).
fn strip_id_prefix(id: &str) -> &str {
    let mut chars = id.chars();
    return match (chars.next(), chars.next()) {
        (Some(kind), Some(':')) if kind.is_ascii_uppercase() => chars.as_str(),
        _ => id,
    };
}

/// Render a top-level element's content to tidy markdown.
fn render_block(element: Node<'_, '_>) -> String {
    return tidy(&render_children(element));
}

/// Render mixed content: text runs collapse whitespace, child elements render inline.
fn render_children(node: Node<'_, '_>) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            push_collapsed(&mut out, child.text().unwrap_or_default());
        } else if child.is_element() {
            out.push_str(&render_inline(child));
        }
    }
    return out;
}

/// Render one inline documentation tag.
fn render_inline(element: Node<'_, '_>) -> String {
    return match element.tag_name().name() {
        "c" => format!("`{}`", raw_text(element).trim()),
        "code" => format!("\n\n```\n{}\n```\n\n", dedent(&raw_text(element))),
        "para" => format!("\n\n{}\n\n", render_children(element).trim()),
        "paramref" | "typeparamref" => element
            .attribute("name")
            .map_or_else(String::new, |name| return format!("`{name}`")),
        "see" | "seealso" => render_reference(element),
        _ => render_children(element),
    };
}

/// Render `<see>`/`<seealso>`: href links, cref code spans, or langwords.
fn render_reference(element: Node<'_, '_>) -> String {
    let label = tidy(&render_children(element));
    if let Some(href) = element.attribute("href") {
        let text = if label.is_empty() { href } else { label.as_str() };
        return format!("[{text}]({href})");
    }
    if let Some(cref) = element.attribute("cref") {
        if label.is_empty() {
            return format!("`{}`", strip_id_prefix(cref));
        }
        return label;
    }
    if let Some(word) = element.attribute("langword") {
        return format!("`{word}`");
    }
    return label;
}

/// Concatenated descendant text with whitespace untouched.
fn raw_text(node: Node<'_, '_>) -> String {
    return node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| return n.text())
        .collect();
}

/// Append `text` with every whitespace run reduced to one space.
fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.ends_with(' ') && !out.ends_with('\n') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

/// Remove the common leading indentation of non-blank lines and surrounding blank lines.
fn dedent(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let indent = lines
        .iter()
        .filter(|line| return !line.trim().is_empty())
        .map(|line| return line.len().saturating_sub(line.trim_start().len()))
        .min()
        .unwrap_or(0);
    let body: Vec<&str> = lines
        .iter()
        .map(|line| return line.get(indent..).unwrap_or_else(|| return line.trim_start()))
        .collect();
    return body.join("\n").trim_matches('\n').to_string();
}

/// Trim lines outside code fences and squeeze runs of blank lines.
fn tidy(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            lines.push(line.trim());
            continue;
        }
        if in_fence {
            lines.push(line);
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() && lines.last().is_some_and(|prev| return prev.is_empty()) {
            continue;
        }
        lines.push(trimmed);
    }
    return lines.join("\n").trim().to_string();
}
