//! The drawing seam
//!
//! Draw-call sequencing is not the engine's job; it hands the settled graph
//! to a [`FrameRenderer`] once per frame. Two renderers ship with the crate:
//! [`HeadlessRenderer`] counts what it would draw, [`RecordingRenderer`] keeps
//! the draw list of every frame for inspection.

use glint_core::{ids, Node, NodeGraph, NodeId, NodeKind, PropertyValue};

/// One node as it reaches the renderer
#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub kind: NodeKind,
    pub depth: usize,
    /// Location relative to the parent
    pub x: f32,
    pub y: f32,
    /// Product of the opacities on the path from the root
    pub opacity: f32,
}

/// Walk the visible part of the tree in draw order
///
/// Invisible nodes are skipped together with their subtree.
pub fn visible_items(graph: &NodeGraph) -> Vec<DrawItem> {
    fn visit(graph: &NodeGraph, id: NodeId, depth: usize, opacity: f32, out: &mut Vec<DrawItem>) {
        let Some(node) = graph.node(id) else {
            return;
        };
        if !node.is_visible() {
            return;
        }
        let opacity = opacity * node.float(ids::OPACITY).unwrap_or(1.0);
        out.push(DrawItem {
            node: id,
            kind: node.kind(),
            depth,
            x: node.float(ids::X).unwrap_or(0.0),
            y: node.float(ids::Y).unwrap_or(0.0),
            opacity,
        });
        for child in node.children() {
            visit(graph, child, depth + 1, opacity, out);
        }
    }

    let mut out = Vec::new();
    if let Some(root) = graph.root() {
        visit(graph, root, 0, 1.0, &mut out);
    }
    out
}

/// Consumes the node graph once per frame on the render thread
pub trait FrameRenderer: Send {
    /// Re-measure a text node whose layout went stale
    fn relayout(&mut self, _node: &Node) {}

    /// Draw the frame; returns the number of nodes drawn
    fn draw(&mut self, graph: &NodeGraph) -> usize;
}

/// Renderer that draws nothing and counts what it would have drawn
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u64,
    relayouts: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn relayouts(&self) -> u64 {
        self.relayouts
    }
}

impl FrameRenderer for HeadlessRenderer {
    fn relayout(&mut self, _node: &Node) {
        self.relayouts += 1;
    }

    fn draw(&mut self, graph: &NodeGraph) -> usize {
        self.frames += 1;
        visible_items(graph).len()
    }
}

/// A laid-out text node, as the recording renderer saw it
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub node: NodeId,
    pub text: String,
    pub font_size: f32,
}

/// Renderer that records every frame's draw list
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Vec<Vec<DrawItem>>,
    layouts: Vec<TextLayout>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Vec<DrawItem>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[DrawItem]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn layouts(&self) -> &[TextLayout] {
        &self.layouts
    }
}

impl FrameRenderer for RecordingRenderer {
    fn relayout(&mut self, node: &Node) {
        let text = node
            .value(ids::TEXT)
            .and_then(PropertyValue::as_text)
            .unwrap_or_default()
            .to_string();
        self.layouts.push(TextLayout {
            node: node.id(),
            text,
            font_size: node.float(ids::FONT_SIZE).unwrap_or_default(),
        });
    }

    fn draw(&mut self, graph: &NodeGraph) -> usize {
        let items = visible_items(graph);
        let count = items.len();
        self.frames.push(items);
        count
    }
}
