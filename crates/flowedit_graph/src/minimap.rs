// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimap projection.
//!
//! Fits the bounding box of every node, plus padding, into the minimap
//! canvas with a uniform scale and maps the visible viewport into the same
//! space. Pure geometry; drawing is left to the caller.

use crate::graph::Graph;
use crate::node::NodeId;
use serde::Serialize;

/// Default node width used when the renderer reports no size
pub const NODE_WIDTH: f32 = 180.0;
/// Default node height used when the renderer reports no size
pub const NODE_HEIGHT: f32 = 60.0;
/// Padding added around the node bounds
pub const MINIMAP_PADDING: f32 = 50.0;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Rectangle from its top-left corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Editor viewport: pan offset, zoom and the size of the visible canvas
///
/// A graph point `p` is drawn at `p * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Horizontal pan in screen pixels
    pub x: f32,
    /// Vertical pan in screen pixels
    pub y: f32,
    /// Zoom factor
    pub zoom: f32,
    /// Canvas width in screen pixels
    pub width: f32,
    /// Canvas height in screen pixels
    pub height: f32,
}

impl Viewport {
    /// Visible area in graph coordinates
    pub fn visible_rect(&self) -> Rect {
        Rect::new(
            -self.x / self.zoom,
            -self.y / self.zoom,
            self.width / self.zoom,
            self.height / self.zoom,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Minimap canvas settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapConfig {
    /// Minimap width
    pub width: f32,
    /// Minimap height
    pub height: f32,
    /// Padding around the node bounds, in graph units
    pub padding: f32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            width: 150.0,
            height: 100.0,
            padding: MINIMAP_PADDING,
        }
    }
}

/// Result of projecting a graph onto the minimap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimapProjection {
    /// Graph units to minimap pixels
    pub scale: f32,
    /// Padded node bounds in graph coordinates
    pub bounds: Rect,
    /// Offset centering the bounds in the minimap
    pub offset: [f32; 2],
    /// Node rectangles in minimap coordinates
    pub nodes: Vec<(NodeId, Rect)>,
    /// Visible viewport in minimap coordinates
    pub viewport: Rect,
}

impl MinimapProjection {
    /// Map a graph point into the minimap
    pub fn to_minimap(&self, point: [f32; 2]) -> [f32; 2] {
        [
            self.offset[0] + (point[0] - self.bounds.x) * self.scale,
            self.offset[1] + (point[1] - self.bounds.y) * self.scale,
        ]
    }

    /// Map a minimap point back into the graph, e.g. for click-to-pan
    pub fn to_graph(&self, point: [f32; 2]) -> [f32; 2] {
        [
            (point[0] - self.offset[0]) / self.scale + self.bounds.x,
            (point[1] - self.offset[1]) / self.scale + self.bounds.y,
        ]
    }

    fn map_rect(&self, rect: Rect) -> Rect {
        let [x, y] = self.to_minimap([rect.x, rect.y]);
        Rect::new(x, y, rect.width * self.scale, rect.height * self.scale)
    }
}

/// Project every node of a graph using the default node size
pub fn project(
    graph: &Graph,
    viewport: &Viewport,
    config: &MinimapConfig,
) -> Option<MinimapProjection> {
    let rects = graph.nodes().map(|node| {
        (
            node.id,
            Rect::new(node.position[0], node.position[1], NODE_WIDTH, NODE_HEIGHT),
        )
    });
    project_rects(rects, viewport, config)
}

/// Project nodes with sizes measured by the renderer
///
/// Returns `None` for an empty graph or a degenerate viewport or canvas.
pub fn project_rects(
    rects: impl IntoIterator<Item = (NodeId, Rect)>,
    viewport: &Viewport,
    config: &MinimapConfig,
) -> Option<MinimapProjection> {
    let rects: Vec<(NodeId, Rect)> = rects.into_iter().collect();
    if rects.is_empty() || viewport.zoom <= 0.0 || config.width <= 0.0 || config.height <= 0.0 {
        return None;
    }

    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (_, rect) in &rects {
        min_x = min_x.min(rect.x);
        min_y = min_y.min(rect.y);
        max_x = max_x.max(rect.right());
        max_y = max_y.max(rect.bottom());
    }

    let bounds = Rect::new(
        min_x - config.padding,
        min_y - config.padding,
        max_x - min_x + 2.0 * config.padding,
        max_y - min_y + 2.0 * config.padding,
    );
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return None;
    }

    // Uniform scale keeps the aspect ratio.
    let scale = (config.width / bounds.width).min(config.height / bounds.height);
    let offset = [
        (config.width - bounds.width * scale) / 2.0,
        (config.height - bounds.height * scale) / 2.0,
    ];

    let mut projection = MinimapProjection {
        scale,
        bounds,
        offset,
        nodes: Vec::with_capacity(rects.len()),
        viewport: Rect::new(0.0, 0.0, 0.0, 0.0),
    };
    projection.viewport = projection.map_rect(viewport.visible_rect());
    projection.nodes = rects
        .into_iter()
        .map(|(id, rect)| (id, projection.map_rect(rect)))
        .collect();
    Some(projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_empty_graph_has_no_projection() {
        let graph = Graph::new("test");
        assert!(project(&graph, &Viewport::default(), &MinimapConfig::default()).is_none());
    }

    #[test]
    fn test_scale_uses_smaller_axis() {
        let a = NodeId::new();
        let b = NodeId::new();
        // 1000 x 100 of content plus padding 0: width is the limiting axis.
        let rects = vec![
            (a, Rect::new(0.0, 0.0, 100.0, 100.0)),
            (b, Rect::new(900.0, 0.0, 100.0, 100.0)),
        ];
        let config = MinimapConfig {
            width: 200.0,
            height: 100.0,
            padding: 0.0,
        };
        let projection = project_rects(rects, &Viewport::default(), &config).unwrap();
        assert!(approx(projection.scale, 0.2));
        // Content is 200 x 20, centered vertically.
        assert!(approx(projection.offset[0], 0.0));
        assert!(approx(projection.offset[1], 40.0));

        let (_, first) = projection.nodes[0];
        assert!(approx(first.x, 0.0));
        assert!(approx(first.y, 40.0));
        assert!(approx(first.width, 20.0));
    }

    #[test]
    fn test_all_nodes_fit_inside_minimap() {
        let mut graph = Graph::new("test");
        for (x, y) in [(-400.0, 30.0), (250.0, -120.0), (900.0, 640.0)] {
            graph.add_node(Node::single("N").with_position(x, y)).unwrap();
        }
        let config = MinimapConfig::default();
        let projection = project(&graph, &Viewport::default(), &config).unwrap();
        for (_, rect) in &projection.nodes {
            assert!(rect.x >= 0.0 && rect.right() <= config.width + 1e-3);
            assert!(rect.y >= 0.0 && rect.bottom() <= config.height + 1e-3);
        }
    }

    #[test]
    fn test_viewport_rect_and_inverse() {
        let id = NodeId::new();
        let rects = vec![(id, Rect::new(0.0, 0.0, 200.0, 100.0))];
        let viewport = Viewport {
            x: -100.0,
            y: -50.0,
            zoom: 2.0,
            width: 400.0,
            height: 200.0,
        };
        let config = MinimapConfig {
            width: 200.0,
            height: 100.0,
            padding: 0.0,
        };
        let projection = project_rects(rects, &viewport, &config).unwrap();
        assert!(approx(projection.scale, 1.0));
        // Visible graph area is (50, 25) sized 200 x 100.
        assert!(approx(projection.viewport.x, 50.0));
        assert!(approx(projection.viewport.y, 25.0));
        assert!(approx(projection.viewport.width, 200.0));

        let back = projection.to_graph(projection.to_minimap([123.0, 45.0]));
        assert!(approx(back[0], 123.0) && approx(back[1], 45.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        let rects = vec![(NodeId::new(), Rect::new(0.0, 0.0, 10.0, 10.0))];
        let zero_zoom = Viewport {
            zoom: 0.0,
            ..Viewport::default()
        };
        assert!(project_rects(rects, &zero_zoom, &MinimapConfig::default()).is_none());
    }
}
