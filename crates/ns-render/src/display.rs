//! Canvas → display list.
//!
//! Flattens the canvas into drawing primitives in painter order (back to
//! front). A frontend walks the list once per frame; nothing here talks to a
//! windowing system.

use kurbo::{Line, Point, Rect};
use ns_core::{Canvas, Color, ItemRef, NodeKind};
use std::cmp::Ordering;

/// One thing to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Link {
        item: ItemRef,
        line: Line,
        color: Color,
        selected: bool,
    },
    Node {
        item: ItemRef,
        bounds: Rect,
        kind: NodeKind,
        label: String,
        selected: bool,
    },
    Text {
        item: ItemRef,
        bounds: Rect,
        content: String,
        color: Color,
        selected: bool,
        editing: bool,
    },
    /// Temporary line shown while a link gesture is in progress.
    RubberBand { line: Line },
    /// Marquee rectangle shown while box-selecting.
    Marquee { rect: Rect },
}

impl Primitive {
    pub fn item(&self) -> Option<ItemRef> {
        match self {
            Primitive::Link { item, .. }
            | Primitive::Node { item, .. }
            | Primitive::Text { item, .. } => Some(*item),
            Primitive::RubberBand { .. } | Primitive::Marquee { .. } => None,
        }
    }
}

/// Transient gesture feedback drawn above every item.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overlay {
    pub rubber_band: Option<Line>,
    pub marquee: Option<(Point, Point)>,
}

/// Every item on the canvas with its z-value, sorted back to front.
///
/// Ties keep a fixed kind order (links, nodes, texts) and arena order within
/// a kind, so the result is deterministic.
pub fn paint_order(canvas: &Canvas) -> Vec<(ItemRef, f64)> {
    let mut items: Vec<(ItemRef, f64)> = Vec::with_capacity(
        canvas.link_count() + canvas.node_count() + canvas.text_count(),
    );
    items.extend(
        canvas
            .links()
            .map(|(link, ..)| (ItemRef::Link(link), ns_core::LINK_Z)),
    );
    items.extend(canvas.nodes().map(|(node, item)| (ItemRef::Node(node), item.z)));
    items.extend(canvas.texts().map(|(text, item)| (ItemRef::Text(text), item.z)));
    items.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    items
}

/// Build the display list for one frame.
pub fn display_list(canvas: &Canvas, selection: &[ItemRef], overlay: &Overlay) -> Vec<Primitive> {
    let selected = |item: ItemRef| selection.contains(&item);
    let mut out = Vec::new();

    for (item, _) in paint_order(canvas) {
        match item {
            ItemRef::Link(link) => {
                if let Some(l) = canvas.link(link) {
                    out.push(Primitive::Link {
                        item,
                        line: l.line(),
                        color: l.color,
                        selected: selected(item),
                    });
                }
            }
            ItemRef::Node(node) => {
                if let Some(n) = canvas.node(node) {
                    out.push(Primitive::Node {
                        item,
                        bounds: n.bounds(),
                        kind: n.kind(),
                        label: n.label().to_string(),
                        selected: selected(item),
                    });
                }
            }
            ItemRef::Text(text) => {
                if let Some(t) = canvas.text(text) {
                    out.push(Primitive::Text {
                        item,
                        bounds: t.bounds(),
                        content: t.content.clone(),
                        color: t.color,
                        selected: selected(item),
                        editing: t.editing,
                    });
                }
            }
        }
    }

    if let Some(line) = overlay.rubber_band {
        out.push(Primitive::RubberBand { line });
    }
    if let Some((a, b)) = overlay.marquee {
        out.push(Primitive::Marquee {
            rect: Rect::from_points(a, b),
        });
    }

    log::trace!("display list: {} primitive(s)", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::{NodeItem, NodeName, TextItem};
    use pretty_assertions::assert_eq;

    fn add(canvas: &mut Canvas, id: &str, x: f64, y: f64) -> ns_core::NodeHandle {
        let name: NodeName = id.parse().unwrap();
        canvas.add_node(NodeItem::new(name, Point::new(x, y))).unwrap()
    }

    #[test]
    fn links_paint_below_nodes_and_texts_above() {
        let mut canvas = Canvas::new();
        let text = canvas.add_text(TextItem::new(Point::new(0.0, 0.0), Color::BLACK));
        let h1 = add(&mut canvas, "h1", 0.0, 0.0);
        let s1 = add(&mut canvas, "s1", 200.0, 0.0);
        let link = canvas.connect(h1, s1, Color::BLACK).unwrap();

        let order: Vec<ItemRef> = paint_order(&canvas).into_iter().map(|(i, _)| i).collect();
        assert_eq!(
            order,
            vec![
                ItemRef::Link(link),
                ItemRef::Node(h1),
                ItemRef::Node(s1),
                ItemRef::Text(text),
            ]
        );
    }

    #[test]
    fn raised_node_paints_last_among_nodes() {
        let mut canvas = Canvas::new();
        let h1 = add(&mut canvas, "h1", 0.0, 0.0);
        let h2 = add(&mut canvas, "h2", 40.0, 0.0);
        canvas.set_node_z(h1, 0.1).unwrap();
        let order: Vec<ItemRef> = paint_order(&canvas).into_iter().map(|(i, _)| i).collect();
        assert_eq!(order, vec![ItemRef::Node(h2), ItemRef::Node(h1)]);
    }

    #[test]
    fn display_list_marks_selection_and_overlay() {
        let mut canvas = Canvas::new();
        let h1 = add(&mut canvas, "h1", 10.0, 20.0);
        let overlay = Overlay {
            rubber_band: Some(Line::new((50.0, 60.0), (300.0, 60.0))),
            marquee: None,
        };
        let list = display_list(&canvas, &[ItemRef::Node(h1)], &overlay);
        assert_eq!(list.len(), 2);
        match &list[0] {
            Primitive::Node {
                bounds,
                label,
                selected,
                kind,
                ..
            } => {
                assert_eq!(*bounds, Rect::new(10.0, 20.0, 90.0, 100.0));
                assert_eq!(label, "h1");
                assert_eq!(*kind, NodeKind::Host);
                assert!(*selected);
            }
            other => panic!("expected node, got {other:?}"),
        }
        assert!(matches!(list[1], Primitive::RubberBand { .. }));
    }

    #[test]
    fn marquee_is_normalized() {
        let overlay = Overlay {
            rubber_band: None,
            marquee: Some((Point::new(100.0, 100.0), Point::new(0.0, 50.0))),
        };
        let list = display_list(&Canvas::new(), &[], &overlay);
        assert_eq!(
            list,
            vec![Primitive::Marquee {
                rect: Rect::new(0.0, 50.0, 100.0, 100.0)
            }]
        );
    }
}
