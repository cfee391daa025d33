//! The canvas arena and its connection registry.
//!
//! Nodes and links are stored in a `petgraph` stable undirected graph so
//! handles survive unrelated removals. Each node additionally keeps the list
//! of its incident link handles (the connection registry). The registry is
//! kept as the exact inverse of the link set: establishing a link registers
//! it on both endpoints, tearing one down unregisters it from both.
//!
//! Deleting a node is a three-step protocol driven by the caller:
//!
//! 1. [`Canvas::remove_all_links`] detaches every incident link from both of
//!    its endpoints and hands the handles back,
//! 2. [`Canvas::destroy_link`] drops each detached link from the arena,
//! 3. [`Canvas::remove_node`] removes the now isolated node.

use crate::error::StateError;
use crate::model::*;
use crate::name::NodeName;
use kurbo::{Line, Point, Vec2};
use petgraph::stable_graph::StableUnGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct Canvas {
    graph: StableUnGraph<NodeItem, LinkItem>,
    names: HashMap<NodeName, NodeHandle>,
    texts: BTreeMap<TextHandle, TextItem>,
    next_text: u32,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0 && self.texts.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    /// Drop every item. Text handles keep counting so stale handles never
    /// alias a new annotation.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.names.clear();
        self.texts.clear();
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: NodeItem) -> Result<NodeHandle, StateError> {
        let name = node.name();
        if self.names.contains_key(&name) {
            return Err(StateError::AlreadyAllocated(name));
        }
        let handle = NodeHandle(self.graph.add_node(node));
        self.names.insert(name, handle);
        Ok(handle)
    }

    /// Remove an isolated node. Fails if any link still touches it.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<NodeItem, StateError> {
        let node = self.node_ref(handle)?;
        let count = node.links.len().max(self.graph.edges(handle.0).count());
        if count > 0 {
            return Err(StateError::NodeHasLinks {
                node: handle.index(),
                count,
            });
        }
        let removed = self
            .graph
            .remove_node(handle.0)
            .ok_or(StateError::UnknownNode(handle.index()))?;
        self.names.remove(&removed.name());
        Ok(removed)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&NodeItem> {
        self.graph.node_weight(handle.0)
    }

    pub fn node_by_name(&self, name: NodeName) -> Option<NodeHandle> {
        self.names.get(&name).copied()
    }

    pub fn contains_node(&self, handle: NodeHandle) -> bool {
        self.graph.contains_node(handle.0)
    }

    /// Nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &NodeItem)> + '_ {
        self.graph
            .node_indices()
            .map(|idx| (NodeHandle(idx), &self.graph[idx]))
    }

    /// Move a node and recompute the geometry of its incident links.
    pub fn set_node_position(&mut self, handle: NodeHandle, position: Point) -> Result<(), StateError> {
        self.node_mut(handle)?.position = position;
        self.refresh_links(handle)
    }

    pub fn translate_node(&mut self, handle: NodeHandle, delta: Vec2) -> Result<(), StateError> {
        let position = self.node_ref(handle)?.position + delta;
        self.set_node_position(handle, position)
    }

    pub fn set_node_z(&mut self, handle: NodeHandle, z: f64) -> Result<(), StateError> {
        self.node_mut(handle)?.z = z;
        Ok(())
    }

    /// Rename a node, keeping the name index and label in sync.
    pub fn rename_node(&mut self, handle: NodeHandle, name: NodeName) -> Result<(), StateError> {
        if let Some(existing) = self.node_by_name(name)
            && existing != handle
        {
            return Err(StateError::AlreadyAllocated(name));
        }
        let node = self.node_mut(handle)?;
        let old = node.name();
        node.set_name(name);
        self.names.remove(&old);
        self.names.insert(name, handle);
        Ok(())
    }

    fn node_ref(&self, handle: NodeHandle) -> Result<&NodeItem, StateError> {
        self.graph
            .node_weight(handle.0)
            .ok_or(StateError::UnknownNode(handle.index()))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut NodeItem, StateError> {
        self.graph
            .node_weight_mut(handle.0)
            .ok_or(StateError::UnknownNode(handle.index()))
    }

    // ─── Links ───────────────────────────────────────────────────────────

    /// Create a link between two distinct live nodes and register it on both.
    pub fn connect(
        &mut self,
        a: NodeHandle,
        b: NodeHandle,
        color: Color,
    ) -> Result<LinkHandle, StateError> {
        self.node_ref(a)?;
        self.node_ref(b)?;
        if a == b {
            return Err(StateError::SelfLink(a.index()));
        }
        let link = LinkHandle(self.graph.add_edge(a.0, b.0, LinkItem::new(color)));
        self.add_link(a, link)?;
        self.add_link(b, link)?;
        self.update_link_geometry(link)?;
        Ok(link)
    }

    /// Unregister a link from both endpoints and drop it from the arena.
    pub fn disconnect(&mut self, link: LinkHandle) -> Result<LinkItem, StateError> {
        let (a, b) = self.endpoints(link)?;
        self.remove_link(a, link)?;
        self.remove_link(b, link)?;
        self.destroy_link(link)
    }

    /// Drop a link that has already been unregistered from both endpoints.
    pub fn destroy_link(&mut self, link: LinkHandle) -> Result<LinkItem, StateError> {
        let (a, b) = self.endpoints(link)?;
        let registered = [a, b]
            .iter()
            .any(|n| self.graph[n.0].links.contains(&link));
        if registered {
            return Err(StateError::LinkStillRegistered(link.index()));
        }
        self.graph
            .remove_edge(link.0)
            .ok_or(StateError::UnknownLink(link.index()))
    }

    pub fn link(&self, link: LinkHandle) -> Option<&LinkItem> {
        self.graph.edge_weight(link.0)
    }

    pub fn contains_link(&self, link: LinkHandle) -> bool {
        self.graph.edge_weight(link.0).is_some()
    }

    pub fn set_link_color(&mut self, link: LinkHandle, color: Color) -> Result<(), StateError> {
        self.graph
            .edge_weight_mut(link.0)
            .ok_or(StateError::UnknownLink(link.index()))?
            .color = color;
        Ok(())
    }

    /// The two endpoints of a link, in creation order.
    pub fn endpoints(&self, link: LinkHandle) -> Result<(NodeHandle, NodeHandle), StateError> {
        self.graph
            .edge_endpoints(link.0)
            .map(|(a, b)| (NodeHandle(a), NodeHandle(b)))
            .ok_or(StateError::UnknownLink(link.index()))
    }

    /// Links in arena order with their endpoints.
    pub fn links(&self) -> impl Iterator<Item = (LinkHandle, NodeHandle, NodeHandle, &LinkItem)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                LinkHandle(e.id()),
                NodeHandle(e.source()),
                NodeHandle(e.target()),
                e.weight(),
            )
        })
    }

    /// Every link as a pair of endpoint names.
    pub fn link_names(&self) -> Vec<(NodeName, NodeName)> {
        self.links()
            .map(|(_, a, b, _)| (self.graph[a.0].name(), self.graph[b.0].name()))
            .collect()
    }

    // ─── Connection registry ─────────────────────────────────────────────

    /// Register `link` as incident on `node`.
    pub fn add_link(&mut self, node: NodeHandle, link: LinkHandle) -> Result<(), StateError> {
        let (a, b) = self.endpoints(link)?;
        if node != a && node != b {
            return Err(StateError::LinkNotIncident {
                node: node.index(),
                link: link.index(),
            });
        }
        let item = self.node_mut(node)?;
        if item.links.contains(&link) {
            return Err(StateError::LinkAlreadyRegistered {
                node: node.index(),
                link: link.index(),
            });
        }
        item.links.push(link);
        Ok(())
    }

    /// Unregister `link` from `node`.
    pub fn remove_link(&mut self, node: NodeHandle, link: LinkHandle) -> Result<(), StateError> {
        let item = self.node_mut(node)?;
        let pos = item
            .links
            .iter()
            .position(|l| *l == link)
            .ok_or(StateError::LinkNotIncident {
                node: node.index(),
                link: link.index(),
            })?;
        item.links.remove(pos);
        Ok(())
    }

    /// Detach every link incident on `node` from both of its endpoints and
    /// return the detached handles for the caller to destroy.
    ///
    /// Validates every incident link before mutating anything.
    pub fn remove_all_links(&mut self, node: NodeHandle) -> Result<Vec<LinkHandle>, StateError> {
        let links: Vec<LinkHandle> = self.node_ref(node)?.links.to_vec();
        let mut detach = Vec::with_capacity(links.len());
        for &link in &links {
            let (a, b) = self.endpoints(link)?;
            let other = if a == node { b } else { a };
            if !self.node_ref(other)?.links.contains(&link) {
                return Err(StateError::LinkNotIncident {
                    node: other.index(),
                    link: link.index(),
                });
            }
            detach.push((other, link));
        }
        for (other, link) in detach {
            self.remove_link(other, link)?;
        }
        self.node_mut(node)?.links.clear();
        Ok(links)
    }

    /// Recompute the rendered segment of every link incident on `node`.
    pub fn refresh_links(&mut self, node: NodeHandle) -> Result<(), StateError> {
        let links = self.node_ref(node)?.links.clone();
        for link in links {
            self.update_link_geometry(link)?;
        }
        Ok(())
    }

    fn update_link_geometry(&mut self, link: LinkHandle) -> Result<(), StateError> {
        let (a, b) = self.endpoints(link)?;
        let line = Line::new(self.graph[a.0].center(), self.graph[b.0].center());
        self.graph
            .edge_weight_mut(link.0)
            .ok_or(StateError::UnknownLink(link.index()))?
            .line = line;
        Ok(())
    }

    /// Verify the registry is the exact inverse of the link set.
    pub fn check_consistency(&self) -> Result<(), StateError> {
        for (link, a, b, _) in self.links() {
            if a == b {
                return Err(StateError::SelfLink(a.index()));
            }
            for n in [a, b] {
                if !self.graph[n.0].links.contains(&link) {
                    return Err(StateError::LinkNotIncident {
                        node: n.index(),
                        link: link.index(),
                    });
                }
            }
        }
        for (node, item) in self.nodes() {
            for &link in &item.links {
                let (a, b) = self.endpoints(link)?;
                if node != a && node != b {
                    return Err(StateError::LinkNotIncident {
                        node: node.index(),
                        link: link.index(),
                    });
                }
            }
        }
        Ok(())
    }

    // ─── Text annotations ────────────────────────────────────────────────

    pub fn add_text(&mut self, text: TextItem) -> TextHandle {
        let handle = TextHandle(self.next_text);
        self.next_text += 1;
        self.texts.insert(handle, text);
        handle
    }

    pub fn remove_text(&mut self, handle: TextHandle) -> Result<TextItem, StateError> {
        self.texts
            .remove(&handle)
            .ok_or(StateError::UnknownText(handle.index()))
    }

    pub fn text(&self, handle: TextHandle) -> Option<&TextItem> {
        self.texts.get(&handle)
    }

    pub fn text_mut(&mut self, handle: TextHandle) -> Option<&mut TextItem> {
        self.texts.get_mut(&handle)
    }

    pub fn texts(&self) -> impl Iterator<Item = (TextHandle, &TextItem)> + '_ {
        self.texts.iter().map(|(h, t)| (*h, t))
    }

    // ─── Items ───────────────────────────────────────────────────────────

    pub fn contains(&self, item: ItemRef) -> bool {
        match item {
            ItemRef::Node(n) => self.contains_node(n),
            ItemRef::Link(l) => self.contains_link(l),
            ItemRef::Text(t) => self.texts.contains_key(&t),
        }
    }

    pub fn z_of(&self, item: ItemRef) -> Option<f64> {
        match item {
            ItemRef::Node(n) => self.node(n).map(|n| n.z),
            ItemRef::Link(l) => self.link(l).map(|_| LINK_Z),
            ItemRef::Text(t) => self.text(t).map(|t| t.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(canvas: &mut Canvas, id: &str, x: f64, y: f64) -> NodeHandle {
        canvas
            .add_node(NodeItem::new(id.parse().unwrap(), Point::new(x, y)))
            .unwrap()
    }

    #[test]
    fn connect_registers_both_endpoints() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        let s1 = node(&mut canvas, "s1", 200.0, 0.0);

        let link = canvas.connect(h1, s1, Color::BLACK).unwrap();

        assert_eq!(canvas.node(h1).unwrap().links(), &[link]);
        assert_eq!(canvas.node(s1).unwrap().links(), &[link]);
        assert_eq!(
            canvas.link(link).unwrap().line(),
            Line::new(Point::new(40.0, 40.0), Point::new(240.0, 40.0))
        );
        canvas.check_consistency().unwrap();
    }

    #[test]
    fn links_iterate_with_their_endpoints() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        let h2 = node(&mut canvas, "h2", 0.0, 200.0);
        let s1 = node(&mut canvas, "s1", 200.0, 0.0);
        let l1 = canvas.connect(h1, s1, Color::BLACK).unwrap();
        let l2 = canvas.connect(s1, h2, Color::BLACK).unwrap();

        let listed: Vec<_> = canvas.links().map(|(l, a, b, _)| (l, a, b)).collect();
        assert_eq!(listed, vec![(l1, h1, s1), (l2, s1, h2)]);

        let names: Vec<String> = canvas
            .link_names()
            .into_iter()
            .map(|(a, b)| format!("{a}-{b}"))
            .collect();
        assert_eq!(names, ["h1-s1", "s1-h2"]);
    }

    #[test]
    fn self_links_are_rejected() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        assert_eq!(
            canvas.connect(h1, h1, Color::BLACK),
            Err(StateError::SelfLink(h1.index()))
        );
        assert_eq!(canvas.link_count(), 0);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut canvas = Canvas::new();
        node(&mut canvas, "h1", 0.0, 0.0);
        let err = canvas
            .add_node(NodeItem::new("h1".parse().unwrap(), Point::ZERO))
            .unwrap_err();
        assert_eq!(err, StateError::AlreadyAllocated("h1".parse().unwrap()));
    }

    #[test]
    fn remove_all_links_detaches_from_both_sides() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        let h2 = node(&mut canvas, "h2", 0.0, 200.0);
        let s1 = node(&mut canvas, "s1", 200.0, 100.0);
        let l1 = canvas.connect(h1, s1, Color::BLACK).unwrap();
        let l2 = canvas.connect(h2, s1, Color::BLACK).unwrap();

        let mut removed = canvas.remove_all_links(s1).unwrap();
        removed.sort();
        assert_eq!(removed, vec![l1, l2]);
        assert!(canvas.node(h1).unwrap().links().is_empty());
        assert!(canvas.node(h2).unwrap().links().is_empty());
        assert!(canvas.node(s1).unwrap().links().is_empty());

        // Links are detached but not yet destroyed.
        assert_eq!(canvas.link_count(), 2);
        assert!(matches!(
            canvas.remove_node(s1),
            Err(StateError::NodeHasLinks { .. })
        ));

        for link in removed {
            canvas.destroy_link(link).unwrap();
        }
        let s1_item = canvas.remove_node(s1).unwrap();
        assert_eq!(s1_item.label(), "s1");
        assert_eq!(canvas.node_by_name("s1".parse().unwrap()), None);
        canvas.check_consistency().unwrap();
    }

    #[test]
    fn destroying_a_registered_link_is_rejected() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        let s1 = node(&mut canvas, "s1", 100.0, 0.0);
        let link = canvas.connect(h1, s1, Color::BLACK).unwrap();
        assert_eq!(
            canvas.destroy_link(link),
            Err(StateError::LinkStillRegistered(link.index()))
        );
        canvas.disconnect(link).unwrap();
        assert_eq!(canvas.link_count(), 0);
        assert!(canvas.node(h1).unwrap().links().is_empty());
    }

    #[test]
    fn removing_unregistered_link_is_rejected() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        let h2 = node(&mut canvas, "h2", 0.0, 0.0);
        let s1 = node(&mut canvas, "s1", 100.0, 0.0);
        let link = canvas.connect(h1, s1, Color::BLACK).unwrap();
        assert!(matches!(
            canvas.remove_link(h2, link),
            Err(StateError::LinkNotIncident { .. })
        ));
        assert!(matches!(
            canvas.add_link(h1, link),
            Err(StateError::LinkAlreadyRegistered { .. })
        ));
    }

    #[test]
    fn moving_a_node_recomputes_incident_links() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        let s1 = node(&mut canvas, "s1", 200.0, 0.0);
        let link = canvas.connect(h1, s1, Color::BLACK).unwrap();

        canvas.translate_node(s1, Vec2::new(0.0, 100.0)).unwrap();
        assert_eq!(
            canvas.link(link).unwrap().line(),
            Line::new(Point::new(40.0, 40.0), Point::new(240.0, 140.0))
        );
    }

    #[test]
    fn rename_keeps_index_in_sync() {
        let mut canvas = Canvas::new();
        let h1 = node(&mut canvas, "h1", 0.0, 0.0);
        canvas.rename_node(h1, "h4".parse().unwrap()).unwrap();
        assert_eq!(canvas.node_by_name("h4".parse().unwrap()), Some(h1));
        assert_eq!(canvas.node_by_name("h1".parse().unwrap()), None);
        assert_eq!(canvas.node(h1).unwrap().label(), "h4");
    }

    #[test]
    fn texts_have_stable_handles() {
        let mut canvas = Canvas::new();
        let a = canvas.add_text(TextItem::new(Point::ZERO, Color::BLACK));
        canvas.remove_text(a).unwrap();
        let b = canvas.add_text(TextItem::new(Point::ZERO, Color::BLACK));
        assert_ne!(a, b);
        assert_eq!(canvas.remove_text(a), Err(StateError::UnknownText(a.index())));
    }
}
