//! Hit testing: point → item lookup.
//!
//! Reverse-walks the paint order (front to back) so the item drawn on top
//! wins. Nodes and texts are hit inside their bounds; links are hit within a
//! tolerance of their segment.

use crate::display::paint_order;
use kurbo::{Line, ParamCurveNearest, Point, Rect};
use ns_core::{Canvas, ItemRef};

/// Find the topmost item at `point`. Returns `None` on empty canvas.
pub fn hit_test(canvas: &Canvas, point: Point, link_tolerance: f64) -> Option<ItemRef> {
    paint_order(canvas)
        .into_iter()
        .rev()
        .map(|(item, _)| item)
        .find(|&item| item_contains(canvas, item, point, link_tolerance))
}

/// Find the topmost node at `point`, ignoring links and texts.
///
/// Used when finishing a link gesture, where only nodes are valid endpoints.
pub fn hit_test_node(canvas: &Canvas, point: Point) -> Option<ItemRef> {
    paint_order(canvas)
        .into_iter()
        .rev()
        .map(|(item, _)| item)
        .filter(|item| matches!(item, ItemRef::Node(_)))
        .find(|&item| item_contains(canvas, item, point, 0.0))
}

/// Every item touching `rect`, back to front. Used for marquee selection.
pub fn hit_test_rect(canvas: &Canvas, rect: Rect) -> Vec<ItemRef> {
    let rect = rect.abs();
    paint_order(canvas)
        .into_iter()
        .map(|(item, _)| item)
        .filter(|&item| match item {
            ItemRef::Node(n) => canvas.node(n).is_some_and(|n| overlaps(n.bounds(), rect)),
            ItemRef::Text(t) => canvas.text(t).is_some_and(|t| overlaps(t.bounds(), rect)),
            ItemRef::Link(l) => canvas.link(l).is_some_and(|l| segment_touches(l.line(), rect)),
        })
        .collect()
}

fn item_contains(canvas: &Canvas, item: ItemRef, point: Point, tolerance: f64) -> bool {
    match item {
        ItemRef::Node(n) => canvas.node(n).is_some_and(|n| inside(n.bounds(), point)),
        ItemRef::Text(t) => canvas.text(t).is_some_and(|t| inside(t.bounds(), point)),
        ItemRef::Link(l) => canvas.link(l).is_some_and(|l| {
            let nearest = l.line().nearest(point, 1e-6);
            nearest.distance_sq <= tolerance * tolerance
        }),
    }
}

// Closed on every side, unlike `Rect::contains`.
fn inside(r: Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn segment_touches(line: Line, rect: Rect) -> bool {
    if inside(rect, line.p0) || inside(rect, line.p1) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    (0..4).any(|i| segments_cross(line, Line::new(corners[i], corners[(i + 1) % 4])))
}

fn segments_cross(a: Line, b: Line) -> bool {
    let orient = |p: Point, q: Point, r: Point| (q - p).cross(r - p);
    let d1 = orient(b.p0, b.p1, a.p0);
    let d2 = orient(b.p0, b.p1, a.p1);
    let d3 = orient(a.p0, a.p1, b.p0);
    let d4 = orient(a.p0, a.p1, b.p1);
    (d1 * d2 <= 0.0) && (d3 * d4 <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::{Color, NodeHandle, NodeItem, NodeName, TextItem};

    fn add(canvas: &mut Canvas, id: &str, x: f64, y: f64) -> NodeHandle {
        let name: NodeName = id.parse().unwrap();
        canvas.add_node(NodeItem::new(name, Point::new(x, y))).unwrap()
    }

    fn two_nodes_and_link() -> (Canvas, NodeHandle, NodeHandle, ItemRef) {
        let mut canvas = Canvas::new();
        let h1 = add(&mut canvas, "h1", 0.0, 0.0);
        let s1 = add(&mut canvas, "s1", 400.0, 0.0);
        let link = canvas.connect(h1, s1, Color::BLACK).unwrap();
        (canvas, h1, s1, ItemRef::Link(link))
    }

    #[test]
    fn hit_node_inside_bounds() {
        let (canvas, h1, s1, _) = two_nodes_and_link();
        assert_eq!(hit_test(&canvas, Point::new(10.0, 10.0), 4.0), Some(ItemRef::Node(h1)));
        assert_eq!(hit_test(&canvas, Point::new(480.0, 80.0), 4.0), Some(ItemRef::Node(s1)));
    }

    #[test]
    fn hit_link_within_tolerance() {
        // Link runs from (40, 40) to (440, 40).
        let (canvas, _, _, link) = two_nodes_and_link();
        assert_eq!(hit_test(&canvas, Point::new(200.0, 43.0), 4.0), Some(link));
        assert_eq!(hit_test(&canvas, Point::new(200.0, 50.0), 4.0), None);
    }

    #[test]
    fn node_wins_over_link_underneath() {
        let (canvas, h1, _, _) = two_nodes_and_link();
        assert_eq!(hit_test(&canvas, Point::new(60.0, 40.0), 4.0), Some(ItemRef::Node(h1)));
    }

    #[test]
    fn text_wins_over_node() {
        let (mut canvas, _, _, _) = two_nodes_and_link();
        let mut text = TextItem::new(Point::new(0.0, 0.0), Color::BLACK);
        text.content = "core".into();
        let t = canvas.add_text(text);
        assert_eq!(hit_test(&canvas, Point::new(5.0, 5.0), 4.0), Some(ItemRef::Text(t)));
        assert!(hit_test_node(&canvas, Point::new(5.0, 5.0)).is_some_and(|i| i.as_node().is_some()));
    }

    #[test]
    fn raised_node_wins_overlap() {
        let mut canvas = Canvas::new();
        let h1 = add(&mut canvas, "h1", 0.0, 0.0);
        let h2 = add(&mut canvas, "h2", 40.0, 0.0);
        assert_eq!(hit_test(&canvas, Point::new(60.0, 10.0), 4.0), Some(ItemRef::Node(h2)));
        canvas.set_node_z(h1, 0.1).unwrap();
        assert_eq!(hit_test(&canvas, Point::new(60.0, 10.0), 4.0), Some(ItemRef::Node(h1)));
    }

    #[test]
    fn empty_space_misses() {
        let (canvas, ..) = two_nodes_and_link();
        assert_eq!(hit_test(&canvas, Point::new(200.0, 300.0), 4.0), None);
        assert_eq!(hit_test_node(&canvas, Point::new(200.0, 40.0)), None);
    }

    #[test]
    fn marquee_collects_touched_items() {
        let (canvas, h1, s1, link) = two_nodes_and_link();
        let hits = hit_test_rect(&canvas, Rect::new(150.0, 0.0, 250.0, 100.0));
        assert_eq!(hits, vec![link]);

        let hits = hit_test_rect(&canvas, Rect::new(-10.0, -10.0, 500.0, 100.0));
        assert_eq!(hits, vec![link, ItemRef::Node(h1), ItemRef::Node(s1)]);

        assert!(hit_test_rect(&canvas, Rect::new(0.0, 200.0, 500.0, 300.0)).is_empty());
    }
}
