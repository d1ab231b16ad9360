//! DOM overlay target
//!
//! Positions annotations as absolutely placed elements over the video instead
//! of drawing pixels.

use serde::Serialize;

use super::RenderTarget;
use crate::core::annotations::Annotation;

/// One positioned overlay element.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayElement {
    /// `annotation <kind> <style>`
    pub class: String,
    pub left_pct: f64,
    pub top_pct: f64,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Overlay container holding the elements of the current frame.
#[derive(Clone, Debug, Default)]
pub struct OverlayLayer {
    elements: Vec<OverlayElement>,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[OverlayElement] {
        &self.elements
    }

    /// Markup for the layer, one `div` per element.
    pub fn to_html(&self) -> String {
        self.elements
            .iter()
            .map(|e| {
                let description = e
                    .description
                    .as_deref()
                    .map(|d| format!("<div class=\"description\">{}</div>", escape_html(d)))
                    .unwrap_or_default();
                format!(
                    "<div class=\"{}\" style=\"left: {}%; top: {}%;\">{}{}</div>",
                    escape_html(&e.class),
                    e.left_pct,
                    e.top_pct,
                    escape_html(&e.label),
                    description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RenderTarget for OverlayLayer {
    fn begin_frame(&mut self) {
        self.elements.clear();
    }

    fn draw_annotation(&mut self, annotation: &Annotation) {
        self.elements.push(OverlayElement {
            class: format!("annotation {} {}", annotation.kind.as_str(), annotation.style),
            left_pct: annotation.position.x,
            top_pct: annotation.position.y,
            label: annotation.text.clone(),
            description: annotation.description.clone(),
        });
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
