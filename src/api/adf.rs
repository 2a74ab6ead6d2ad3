//! Atlassian Document Format (ADF) helpers.
//!
//! Jira stores descriptions and comments as ADF trees. Reading flattens the
//! tree to plain text; writing wraps plain text into a document, turning
//! `@[Display Name]` markers into mention nodes for known users.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

use super::types::User;

static MENTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\[([^\]]+)\]").expect("hardcoded regex pattern is valid"));

/// Flatten an ADF document (or a plain string) to display text.
pub fn to_plain_text(doc: &Value) -> String {
    if let Some(s) = doc.as_str() {
        return s.to_string();
    }
    let mut out = String::new();
    extract_text(doc, &mut out);
    out.trim().to_string()
}

fn extract_children(node: &Value, out: &mut String) {
    if let Some(Value::Array(items)) = node.get("content") {
        for item in items {
            extract_text(item, out);
        }
    }
}

fn extract_text(node: &Value, out: &mut String) {
    match node {
        Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(text) = obj.get("text").and_then(Value::as_str) {
                    out.push_str(text);
                }
            }
            Some("paragraph") | Some("heading") | Some("codeBlock") => {
                extract_children(node, out);
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Some("hardBreak") => out.push('\n'),
            Some("listItem") => {
                out.push_str("• ");
                extract_children(node, out);
            }
            Some("blockquote") => {
                out.push_str("> ");
                extract_children(node, out);
            }
            Some("mention") => {
                if let Some(text) = node.pointer("/attrs/text").and_then(Value::as_str) {
                    if !text.starts_with('@') {
                        out.push('@');
                    }
                    out.push_str(text);
                }
            }
            Some("emoji") => {
                if let Some(short) = node.pointer("/attrs/shortName").and_then(Value::as_str) {
                    out.push_str(short);
                }
            }
            Some("inlineCard") => {
                if let Some(url) = node.pointer("/attrs/url").and_then(Value::as_str) {
                    out.push_str(url);
                }
            }
            Some("mediaGroup") | Some("mediaSingle") => {}
            _ => extract_children(node, out),
        },
        Value::Array(items) => {
            for item in items {
                extract_text(item, out);
            }
        }
        _ => {}
    }
}

fn doc(paragraphs: Vec<Value>) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": paragraphs,
    })
}

fn paragraph(content: Vec<Value>) -> Value {
    json!({ "type": "paragraph", "content": content })
}

fn text_node(text: &str) -> Value {
    json!({ "type": "text", "text": text })
}

/// Wrap plain text into an ADF document, one paragraph per line.
pub fn plain_document(text: &str) -> Value {
    doc(text
        .lines()
        .map(|line| {
            if line.is_empty() {
                paragraph(Vec::new())
            } else {
                paragraph(vec![text_node(line)])
            }
        })
        .collect())
}

/// Build a comment document, resolving `@[Name]` markers against `users`.
///
/// Markers naming an unknown user are kept verbatim as text.
pub fn comment_document(text: &str, users: &[User]) -> Value {
    doc(text
        .lines()
        .map(|line| paragraph(inline_with_mentions(line, users)))
        .collect())
}

fn inline_with_mentions(line: &str, users: &[User]) -> Vec<Value> {
    let mut nodes = Vec::new();
    let mut last_end = 0;

    for caps in MENTION_MARKER.captures_iter(line) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last_end {
            nodes.push(text_node(&line[last_end..whole.start()]));
        }

        match users.iter().find(|u| u.display_name == name.as_str()) {
            Some(user) => nodes.push(json!({
                "type": "mention",
                "attrs": {
                    "id": user.account_id,
                    "text": format!("@{}", user.display_name),
                }
            })),
            None => nodes.push(text_node(whole.as_str())),
        }
        last_end = whole.end();
    }

    if last_end < line.len() {
        nodes.push(text_node(&line[last_end..]));
    }
    nodes
}
