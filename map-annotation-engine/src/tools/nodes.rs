use bevy::prelude::*;

/// An editable control point in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: u32,
    pub position: Vec2,
}

/// Ordered node list with stable ids.
#[derive(Debug, Clone, Default)]
pub struct NodeList {
    nodes: Vec<Node>,
    next_id: u32,
}

impl NodeList {
    pub fn push(&mut self, position: Vec2) -> usize {
        self.nodes.push(Node {
            id: self.next_id,
            position,
        });
        self.next_id += 1;
        self.nodes.len() - 1
    }

    /// Index of the node nearest to `world` within `radius` metres.
    pub fn hit(&self, world: Vec2, radius: f32) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (index, node.position.distance(world)))
            .filter(|(_, distance)| *distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub fn move_node(&mut self, index: usize, position: Vec2) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        node.position = position;
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<Node> {
        (index < self.nodes.len()).then(|| self.nodes.remove(index))
    }

    /// Replace the list with `points`, e.g. when loading a committed zone for editing.
    pub fn replace_all(&mut self, points: &[Vec2]) {
        self.nodes.clear();
        for point in points {
            self.push(*point);
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn last(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.nodes.iter().map(|n| n.position).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Interaction state shared by every node-based tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeEditState {
    #[default]
    Idle,
    /// Pointer pressed on an existing node.
    NodeSelected(usize),
    /// Pointer moved while holding a node.
    Dragging(usize),
}

/// What a pointer event did to the node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeChange {
    Added(usize),
    Selected(usize),
    Moved(usize),
    Released(usize),
    /// Cursor moved without holding a node.
    Hover,
    None,
}

/// Node list plus the click/select/drag state machine.
///
/// Down on empty space appends a node, down within `node_radius` of a node
/// selects it, moving while selected drags it, up returns to idle. The last
/// touched node stays addressable through [`NodeEditor::selected`] for deletion.
#[derive(Debug, Clone)]
pub struct NodeEditor {
    nodes: NodeList,
    state: NodeEditState,
    node_radius: f32,
    selected: Option<usize>,
    hover: Option<Vec2>,
}

impl NodeEditor {
    pub fn new(node_radius: f32) -> Self {
        Self {
            nodes: NodeList::default(),
            state: NodeEditState::Idle,
            node_radius,
            selected: None,
            hover: None,
        }
    }

    pub fn pointer_down(&mut self, world: Vec2) -> NodeChange {
        if let Some(index) = self.select_at(world) {
            return NodeChange::Selected(index);
        }

        let index = self.nodes.push(world);
        self.selected = Some(index);
        self.state = NodeEditState::Idle;
        NodeChange::Added(index)
    }

    /// Select the node under `world` without ever creating one.
    pub fn select_at(&mut self, world: Vec2) -> Option<usize> {
        let index = self.nodes.hit(world, self.node_radius)?;
        self.state = NodeEditState::NodeSelected(index);
        self.selected = Some(index);
        Some(index)
    }

    pub fn pointer_move(&mut self, world: Vec2) -> NodeChange {
        match self.state {
            NodeEditState::NodeSelected(index) | NodeEditState::Dragging(index) => {
                self.nodes.move_node(index, world);
                self.state = NodeEditState::Dragging(index);
                NodeChange::Moved(index)
            }
            NodeEditState::Idle => {
                self.hover = Some(world);
                NodeChange::Hover
            }
        }
    }

    pub fn pointer_up(&mut self) -> NodeChange {
        match std::mem::take(&mut self.state) {
            NodeEditState::NodeSelected(index) | NodeEditState::Dragging(index) => {
                NodeChange::Released(index)
            }
            NodeEditState::Idle => NodeChange::None,
        }
    }

    /// Remove the last touched node.
    pub fn delete_selected(&mut self) -> Option<Node> {
        let index = self.selected.take()?;
        self.state = NodeEditState::Idle;
        self.nodes.remove(index)
    }

    pub fn load(&mut self, points: &[Vec2]) {
        self.clear();
        self.nodes.replace_all(points);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.state = NodeEditState::Idle;
        self.selected = None;
        self.hover = None;
    }

    pub fn nodes(&self) -> &NodeList {
        &self.nodes
    }

    pub fn state(&self) -> NodeEditState {
        self.state
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hover(&self) -> Option<Vec2> {
        self.hover
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.nodes.positions()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
