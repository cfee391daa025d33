//! The diagram controller: the editing state machine.
//!
//! Owns the canvas, the id allocator, the active mode and its tools, and the
//! outgoing event queue. Every mutation of the canvas goes through here.
//!
//! Node deletion follows a fixed order: detach all incident links from both
//! endpoints, destroy those links, release the node's id, remove the node.
//!
//! Internal bookkeeping failures (`StateError`) are bugs. They are routed
//! through [`invariant`], which logs at `error` and trips a debug assertion;
//! release builds log and skip the failed step.

use crate::events::DiagramEvent;
use crate::input::{InputEvent, Modifiers};
use crate::layout::{LayoutRequest, LayoutResult};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{CanvasCommand, LinkTool, Mode, NodeTool, SelectTool, Selection, TextTool, Tool};
use ns_core::{
    Canvas, Color, EditorConfig, Error, FormatError, ItemRef, LinkHandle, NodeHandle,
    NodeIdAllocator, NodeItem, NodeKind, NodeName, Point, Rect, StateError, StoreError,
    TextHandle, TextItem, Topology, Vec2, store, topology,
};
use ns_render::{Overlay, Primitive, hit_test, hit_test_node, hit_test_rect};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::Child;

fn invariant<T>(context: &str, result: Result<T, StateError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::error!("invariant violated while {context}: {err}");
            debug_assert!(false, "invariant violated while {context}: {err}");
            None
        }
    }
}

// Strict: touching edges do not count as overlap.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

pub struct DiagramController {
    canvas: Canvas,
    ids: NodeIdAllocator,
    config: EditorConfig,
    mode: Mode,
    select: SelectTool,
    node_tool: NodeTool,
    link_tool: LinkTool,
    text_tool: TextTool,
    /// Text annotation that currently has keyboard focus.
    editing: Option<TextHandle>,
    link_color: Color,
    text_color: Color,
    layout_generation: u64,
    events: VecDeque<DiagramEvent>,
}

impl Default for DiagramController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl DiagramController {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            canvas: Canvas::new(),
            ids: NodeIdAllocator::new(),
            mode: Mode::Select,
            select: SelectTool::new(),
            node_tool: NodeTool::new(NodeKind::Host),
            link_tool: LinkTool::new(),
            text_tool: TextTool::new(),
            editing: None,
            link_color: config.link_color,
            text_color: config.text_color,
            layout_generation: 0,
            events: VecDeque::new(),
            config,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn allocator(&self) -> &NodeIdAllocator {
        &self.ids
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selection(&self) -> &[ItemRef] {
        &self.select.selected
    }

    pub fn editing_text(&self) -> Option<TextHandle> {
        self.editing
    }

    pub fn link_color(&self) -> Color {
        self.link_color
    }

    pub fn text_color(&self) -> Color {
        self.text_color
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<DiagramEvent> {
        self.events.drain(..).collect()
    }

    // ─── Modes and input ─────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.active_tool().cancel();
        if let Mode::InsertNode(kind) = mode {
            self.node_tool.kind = kind;
        }
        self.mode = mode;
        let mode = self.active_tool().mode();
        log::debug!("mode: {mode}");
        self.events.push_back(DiagramEvent::ModeChanged(mode));
    }

    fn active_tool(&mut self) -> &mut dyn Tool {
        match self.mode {
            Mode::Select => &mut self.select,
            Mode::InsertNode(_) => &mut self.node_tool,
            Mode::InsertLink => &mut self.link_tool,
            Mode::InsertText => &mut self.text_tool,
        }
    }

    /// Feed one input event through the active tool.
    ///
    /// Returns shortcut actions the controller cannot complete on its own
    /// (save, load, run): the UI supplies a path and calls back.
    pub fn handle_input(&mut self, event: &InputEvent) -> Option<ShortcutAction> {
        if let InputEvent::Key { key, .. } = event {
            return self.handle_key(key, event.modifiers());
        }
        let pos = event.position()?;

        let hit = match self.mode {
            Mode::InsertLink => hit_test_node(&self.canvas, pos),
            _ => hit_test(&self.canvas, pos, self.config.link_pick_tolerance),
        };

        // A press anywhere else takes focus away from the text being edited.
        if matches!(event, InputEvent::PointerDown { .. })
            && let Some(text) = self.editing
            && hit != Some(ItemRef::Text(text))
        {
            self.finish_text_edit(text);
        }

        let before = self.select.selected.clone();
        let commands = self.active_tool().handle(event, hit);
        for command in commands {
            self.apply(command);
        }
        self.notify_selection(&before);
        None
    }

    fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if let Some(text) = self.editing {
            // Keystrokes belong to the text editor; the UI forwards content
            // through `set_text`.
            if key == "Escape" {
                self.finish_text_edit(text);
            }
            return None;
        }
        let action = ShortcutMap::resolve(key, modifiers)?;
        log::debug!("shortcut {key:?} -> {action:?}");
        self.execute(action)
    }

    /// Run a shortcut action. File actions are returned unexecuted.
    pub fn execute(&mut self, action: ShortcutAction) -> Option<ShortcutAction> {
        match action {
            ShortcutAction::ModeSelect => self.set_mode(Mode::Select),
            ShortcutAction::ModeInsertNode(kind) => self.set_mode(Mode::InsertNode(kind)),
            ShortcutAction::ModeInsertLink => self.set_mode(Mode::InsertLink),
            ShortcutAction::ModeInsertText => self.set_mode(Mode::InsertText),
            ShortcutAction::Delete if self.mode == Mode::Select => self.delete_selection(),
            ShortcutAction::Delete => log::debug!("delete ignored in {} mode", self.mode),
            ShortcutAction::Deselect => {
                self.set_mode(Mode::Select);
                self.set_selection(std::iter::empty());
            }
            ShortcutAction::BringToFront => self.bring_to_front(),
            ShortcutAction::SendToBack => self.send_to_back(),
            ShortcutAction::ClearCanvas => self.clear(),
            ShortcutAction::Save | ShortcutAction::Load | ShortcutAction::Run => {
                return Some(action);
            }
        }
        None
    }

    fn apply(&mut self, command: CanvasCommand) {
        match command {
            CanvasCommand::Translate { items, delta } => self.translate(&items, delta),
            CanvasCommand::SelectRect { rect, extend } => {
                let hits = hit_test_rect(&self.canvas, rect);
                if !extend {
                    self.select.selected.clear();
                }
                for item in hits {
                    if !self.select.selected.contains(&item) {
                        self.select.selected.push(item);
                    }
                }
            }
            CanvasCommand::InsertNode { kind, at } => {
                self.insert_node(kind, at);
            }
            CanvasCommand::Connect { from, to } => {
                self.connect(from, to);
                self.set_mode(Mode::Select);
            }
            CanvasCommand::InsertText { at } => {
                self.insert_text(at);
                self.set_mode(Mode::Select);
            }
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Replace the selection. Items no longer on the canvas are skipped.
    pub fn set_selection(&mut self, items: impl IntoIterator<Item = ItemRef>) {
        let before = self.select.selected.clone();
        self.select.selected = items
            .into_iter()
            .filter(|item| self.canvas.contains(*item))
            .collect();
        self.notify_selection(&before);
    }

    fn notify_selection(&mut self, before: &Selection) {
        if self.select.selected != *before {
            self.events
                .push_back(DiagramEvent::SelectionChanged(self.select.selected.to_vec()));
        }
    }

    fn translate(&mut self, items: &[ItemRef], delta: Vec2) {
        for &item in items {
            match item {
                ItemRef::Node(node) => {
                    invariant("moving a node", self.canvas.translate_node(node, delta));
                }
                ItemRef::Text(text) => {
                    if let Some(text) = self.canvas.text_mut(text) {
                        text.position += delta;
                    }
                }
                // Links follow their endpoints.
                ItemRef::Link(_) => {}
            }
        }
    }

    // ─── Insertion ───────────────────────────────────────────────────────

    /// Insert a node of `kind` with its top-left corner at `at`.
    pub fn insert_node(&mut self, kind: NodeKind, at: Point) -> Option<NodeHandle> {
        let name = match self.ids.allocate(kind) {
            Ok(name) => name,
            Err(err) => {
                log::warn!("cannot insert a {kind}: {err}");
                self.events
                    .push_back(DiagramEvent::error(format!("insert failed: {err}")));
                return None;
            }
        };
        let Some(node) = invariant("inserting a node", self.canvas.add_node(NodeItem::new(name, at)))
        else {
            invariant("returning an unused id", self.ids.release(name));
            return None;
        };
        log::debug!("inserted {name} at ({}, {})", at.x, at.y);
        self.events.push_back(DiagramEvent::NodeInserted { node, name });
        Some(node)
    }

    /// Link two distinct nodes with the current link color.
    pub fn connect(&mut self, from: NodeHandle, to: NodeHandle) -> Option<LinkHandle> {
        let link = invariant("linking nodes", self.canvas.connect(from, to, self.link_color))?;
        let between = (self.canvas.node(from)?.name(), self.canvas.node(to)?.name());
        log::debug!("linked {} - {}", between.0, between.1);
        self.events.push_back(DiagramEvent::LinkCreated { link, between });
        Some(link)
    }

    /// Insert an empty text annotation and give it focus.
    pub fn insert_text(&mut self, at: Point) -> TextHandle {
        if let Some(previous) = self.editing {
            self.finish_text_edit(previous);
        }
        let mut item = TextItem::new(at, self.text_color);
        item.editing = true;
        let text = self.canvas.add_text(item);
        self.editing = Some(text);
        log::debug!("inserted text {text:?}");
        self.events.push_back(DiagramEvent::TextInserted(text));
        text
    }

    /// Give an existing text annotation focus again.
    pub fn edit_text(&mut self, text: TextHandle) -> Result<(), StateError> {
        if let Some(previous) = self.editing
            && previous != text
        {
            self.finish_text_edit(previous);
        }
        self.canvas
            .text_mut(text)
            .ok_or(StateError::UnknownText(text.index()))?
            .editing = true;
        self.editing = Some(text);
        Ok(())
    }

    pub fn set_text(&mut self, text: TextHandle, content: &str) -> Result<(), StateError> {
        self.canvas
            .text_mut(text)
            .ok_or(StateError::UnknownText(text.index()))?
            .content = content.to_string();
        Ok(())
    }

    /// The annotation lost focus. Empty annotations are deleted.
    pub fn finish_text_edit(&mut self, text: TextHandle) {
        if self.editing == Some(text) {
            self.editing = None;
        }
        let Some(item) = self.canvas.text_mut(text) else {
            return;
        };
        item.editing = false;
        if !item.content.is_empty() {
            return;
        }
        if invariant("dropping an empty text", self.canvas.remove_text(text)).is_some() {
            log::debug!("dropped empty text {text:?}");
            let before = self.select.selected.clone();
            self.select.selected.retain(|item| *item != ItemRef::Text(text));
            self.notify_selection(&before);
            self.events.push_back(DiagramEvent::ItemsDeleted {
                nodes: vec![],
                links: 0,
                texts: 1,
            });
        }
    }

    // ─── Deletion ────────────────────────────────────────────────────────

    /// Delete every selected item. Deleting a node also deletes its links.
    pub fn delete_selection(&mut self) {
        if self.select.selected.is_empty() {
            return;
        }
        // A half-finished link gesture may hold one of the doomed nodes.
        self.link_tool.cancel();
        let selected: Vec<ItemRef> = self.select.selected.drain(..).collect();
        let mut nodes = Vec::new();
        let mut links = 0;
        let mut texts = 0;

        for item in selected {
            // A selected link may already be gone with one of its endpoints.
            if !self.canvas.contains(item) {
                continue;
            }
            match item {
                ItemRef::Node(node) => {
                    if let Some((name, cascaded)) = self.delete_node(node) {
                        nodes.push(name);
                        links += cascaded;
                    }
                }
                ItemRef::Link(link) => {
                    if invariant("deleting a link", self.canvas.disconnect(link)).is_some() {
                        links += 1;
                    }
                }
                ItemRef::Text(text) => {
                    if self.editing == Some(text) {
                        self.editing = None;
                    }
                    if invariant("deleting a text", self.canvas.remove_text(text)).is_some() {
                        texts += 1;
                    }
                }
            }
        }

        log::debug!(
            "deleted {} node(s), {links} link(s), {texts} text(s)",
            nodes.len()
        );
        self.events.push_back(DiagramEvent::SelectionChanged(vec![]));
        self.events
            .push_back(DiagramEvent::ItemsDeleted { nodes, links, texts });
    }

    fn delete_node(&mut self, node: NodeHandle) -> Option<(NodeName, usize)> {
        let name = self.canvas.node(node)?.name();
        let links = invariant("detaching links", self.canvas.remove_all_links(node))?;
        for &link in &links {
            invariant("destroying a link", self.canvas.destroy_link(link));
        }
        invariant("releasing an id", self.ids.release(name));
        invariant("removing a node", self.canvas.remove_node(node))?;
        Some((name, links.len()))
    }

    // ─── Z-order and colors ──────────────────────────────────────────────

    /// Raise the first selected item above the nodes it overlaps.
    pub fn bring_to_front(&mut self) {
        self.restack(true);
    }

    /// Lower the first selected item below the nodes it overlaps.
    pub fn send_to_back(&mut self) {
        self.restack(false);
    }

    fn restack(&mut self, front: bool) {
        let Some(item) = self.select.first_selected() else {
            return;
        };
        let bounds = match item {
            ItemRef::Node(node) => self.canvas.node(node).map(|n| n.bounds()),
            ItemRef::Text(text) => self.canvas.text(text).map(|t| t.bounds()),
            ItemRef::Link(_) => {
                log::debug!("links keep their fixed z-order");
                return;
            }
        };
        let Some(bounds) = bounds else {
            return;
        };

        let others = self
            .canvas
            .nodes()
            .filter(|(handle, node)| ItemRef::Node(*handle) != item && overlaps(node.bounds(), bounds))
            .map(|(_, node)| node.z);
        let z = if front {
            let highest = others.fold(f64::NEG_INFINITY, f64::max);
            if highest >= 0.0 { highest + 0.1 } else { 0.0 }
        } else {
            let lowest = others.fold(f64::INFINITY, f64::min);
            if lowest <= 0.0 { lowest - 0.1 } else { 0.0 }
        };

        match item {
            ItemRef::Node(node) => {
                invariant("restacking a node", self.canvas.set_node_z(node, z));
            }
            ItemRef::Text(text) => {
                if let Some(text) = self.canvas.text_mut(text) {
                    text.z = z;
                }
            }
            ItemRef::Link(_) => {}
        }
        log::debug!("{item:?} z -> {z}");
    }

    /// Color for new links; also recolors selected links.
    pub fn set_link_color(&mut self, color: Color) {
        self.link_color = color;
        for item in self.select.selected.clone() {
            if let ItemRef::Link(link) = item {
                invariant("recoloring a link", self.canvas.set_link_color(link, color));
            }
        }
    }

    /// Color for new text annotations; also recolors selected texts.
    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
        for item in self.select.selected.clone() {
            if let ItemRef::Text(text) = item
                && let Some(text) = self.canvas.text_mut(text)
            {
                text.color = color;
            }
        }
    }

    // ─── Whole-canvas operations ─────────────────────────────────────────

    /// Remove everything and restart both id pools at 1.
    pub fn clear(&mut self) {
        self.reset_canvas();
        log::info!("canvas cleared");
        self.events
            .push_back(DiagramEvent::CanvasReplaced { nodes: 0, links: 0 });
    }

    fn reset_canvas(&mut self) {
        self.select.cancel();
        self.link_tool.cancel();
        self.canvas.clear();
        self.ids.reset();
        self.editing = None;
        // Anything still computing belongs to the old canvas.
        self.layout_generation += 1;
        self.set_selection(std::iter::empty());
    }

    /// The live graph in canonical form.
    pub fn topology(&self) -> Topology {
        Topology::from_canvas(&self.canvas)
    }

    /// Start a layout for `topology`, superseding any earlier request.
    pub fn request_layout(&mut self, topology: Topology) -> LayoutRequest {
        self.layout_generation += 1;
        LayoutRequest::new(
            self.layout_generation,
            topology.canonicalize(),
            self.config.layout.clone(),
        )
    }

    /// Replace the canvas with a computed layout. Returns `false` (and
    /// changes nothing) if a newer request has been made since.
    pub fn apply_layout(&mut self, result: LayoutResult) -> bool {
        if result.generation != self.layout_generation {
            log::debug!(
                "dropping stale layout #{} (latest #{})",
                result.generation,
                self.layout_generation
            );
            return false;
        }
        self.materialize(&result.topology, &result.positions);
        true
    }

    fn materialize(&mut self, topology: &Topology, positions: &std::collections::BTreeMap<NodeName, Point>) {
        let generation = self.layout_generation;
        self.reset_canvas();
        self.layout_generation = generation;

        let fallback = {
            let offset = self.config.layout.transform.offset;
            Point::new(offset, offset)
        };
        let mut handles: HashMap<NodeName, NodeHandle> = HashMap::new();
        for name in topology.nodes() {
            let at = positions.get(&name).copied().unwrap_or(fallback);
            invariant("reserving a loaded id", self.ids.reserve(name));
            if let Some(node) = invariant("placing a loaded node", self.canvas.add_node(NodeItem::new(name, at))) {
                handles.insert(name, node);
            }
        }
        for edge in topology.edges() {
            let (a, b) = edge.endpoints();
            if let (Some(&a), Some(&b)) = (handles.get(&a), handles.get(&b)) {
                invariant("linking loaded nodes", self.canvas.connect(a, b, self.link_color));
            }
        }

        let (nodes, links) = (self.canvas.node_count(), self.canvas.link_count());
        log::info!("canvas replaced: {nodes} node(s), {links} link(s)");
        self.events
            .push_back(DiagramEvent::CanvasReplaced { nodes, links });
    }

    fn replace_with(&mut self, topology: Topology) {
        let request = self.request_layout(topology);
        let result = request.compute();
        self.apply_layout(result);
    }

    /// Replace the canvas with a validated topology. On error the canvas is
    /// left untouched.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        match topology::load(bytes) {
            Ok(topology) => {
                self.replace_with(topology);
                Ok(())
            }
            Err(err) => {
                log::warn!("rejected topology: {err}");
                self.events
                    .push_back(DiagramEvent::error(format!("load failed: {err}")));
                Err(err)
            }
        }
    }

    pub fn load_from(&mut self, path: &Path) -> Result<(), StoreError> {
        match store::load_topology(path) {
            Ok(topology) => {
                self.replace_with(topology);
                self.events
                    .push_back(DiagramEvent::info(format!("loaded {}", path.display())));
                Ok(())
            }
            Err(err) => {
                log::warn!("{err}");
                self.events
                    .push_back(DiagramEvent::error(format!("load failed: {err}")));
                Err(err)
            }
        }
    }

    /// Save the canonical topology. Returns the path actually written.
    pub fn save_to(&mut self, path: &Path) -> Result<PathBuf, StoreError> {
        match store::save_topology(path, &self.topology()) {
            Ok(written) => {
                self.events
                    .push_back(DiagramEvent::info(format!("saved {}", written.display())));
                Ok(written)
            }
            Err(err) => {
                log::warn!("{err}");
                self.events
                    .push_back(DiagramEvent::error(format!("save failed: {err}")));
                Err(err)
            }
        }
    }

    /// Save to `path`, then hand the file to the emulator.
    pub fn run(&mut self, path: &Path) -> Result<Child, Error> {
        let written = self.save_to(path)?;
        match ns_core::launch(&self.config.emulator, &written) {
            Ok(child) => {
                self.events
                    .push_back(DiagramEvent::info(format!("emulator started on {}", written.display())));
                Ok(child)
            }
            Err(err) => {
                log::warn!("{err}");
                self.events
                    .push_back(DiagramEvent::error(format!("run failed: {err}")));
                Err(err.into())
            }
        }
    }

    /// Replace the canvas with a flat topology. Only `s1` is wired; asking
    /// for more switches queues a warning.
    pub fn generate_flat(&mut self, hosts: u32, switches: u32) {
        if switches > 1 {
            self.events.push_back(DiagramEvent::warning(format!(
                "flat topology wires only s1; {} extra switch(es) ignored",
                switches - 1
            )));
        }
        self.replace_with(ns_core::generate_flat(hosts, switches));
    }

    pub fn generate_subnet(&mut self, subnets: u32, hosts_per_subnet: u32) {
        self.replace_with(ns_core::generate_subnet(subnets, hosts_per_subnet));
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn overlay(&self) -> Overlay {
        Overlay {
            rubber_band: self.link_tool.rubber_band(),
            marquee: self.select.marquee(),
        }
    }

    pub fn display_list(&self) -> Vec<Primitive> {
        ns_render::display_list(&self.canvas, &self.select.selected, &self.overlay())
    }
}
