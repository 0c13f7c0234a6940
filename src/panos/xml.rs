//! Helpers over `roxmltree` for XML API `<response>` documents.

use roxmltree::{Document, Node};

use super::ApiError;

/// Parse an XML API body and require `<response status="success">`.
///
/// Error responses are turned into `ApiError::Rejected` carrying the
/// device's `msg` text.
pub fn parse_response(text: &str) -> Result<Document<'_>, ApiError> {
    let doc = Document::parse(text).map_err(|e| ApiError::Parse(format!("invalid XML: {}", e)))?;
    let root = doc.root_element();
    if root.tag_name().name() != "response" {
        return Err(ApiError::Parse(format!(
            "expected <response>, got <{}>",
            root.tag_name().name()
        )));
    }
    match root.attribute("status") {
        Some("success") => Ok(doc),
        Some(_) => Err(ApiError::Rejected(error_message(&doc))),
        None => Err(ApiError::Parse("<response> has no status attribute".to_string())),
    }
}

/// Collected `msg` text of an error response
pub fn error_message(doc: &Document<'_>) -> String {
    let lines: Vec<String> = doc
        .descendants()
        .filter(|n| n.has_tag_name("msg"))
        .flat_map(|msg| {
            let lines: Vec<String> = msg
                .descendants()
                .filter(|n| n.has_tag_name("line"))
                .filter_map(|n| node_text(&n))
                .collect();
            if lines.is_empty() {
                node_text(&msg).into_iter().collect()
            } else {
                lines
            }
        })
        .collect();
    if lines.is_empty() {
        "request rejected".to_string()
    } else {
        lines.join("; ")
    }
}

/// Message of an error body that may or may not be well-formed XML
pub fn error_message_from_text(text: &str) -> String {
    match Document::parse(text) {
        Ok(doc) => error_message(&doc),
        Err(_) => text.trim().chars().take(200).collect(),
    }
}

/// Trimmed, non-empty text of the element reached by following `path`
/// from the document root, one child tag per segment.
pub fn text_at(doc: &Document<'_>, path: &[&str]) -> Option<String> {
    let mut node = doc.root_element();
    for tag in path {
        node = node.children().find(|n| n.has_tag_name(*tag))?;
    }
    node_text(&node)
}

/// Trimmed, non-empty text of the first descendant named `tag`
pub fn first_text(doc: &Document<'_>, tag: &str) -> Option<String> {
    doc.descendants()
        .filter(|n| n.has_tag_name(tag))
        .find_map(|n| node_text(&n))
}

fn node_text(node: &Node<'_, '_>) -> Option<String> {
    let text = node.text()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
