//! Arena-backed search tree of alternating decision and chance nodes.
//!
//! Nodes live in two flat vectors and refer to their children through typed
//! indices, keeping exclusive-ownership semantics without pointer juggling.
//! A tree is created fresh for one planning call and either dropped with it
//! or carried to the next call by the tree-reuse variant.

use rand::{Rng, rngs::StdRng};

use crate::state::{Action, State};

/// Index of a decision node within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionId(usize);

/// Index of a chance node within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChanceId(usize);

/// "What do I do here": a state plus the actions not yet tried from it.
#[derive(Debug, Clone)]
pub struct DecisionNode {
    state: State,
    depth: u32,
    untried: Vec<Action>,
    children: Vec<ChanceId>,
}

impl DecisionNode {
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn untried_actions(&self) -> &[Action] {
        &self.untried
    }

    pub fn children(&self) -> &[ChanceId] {
        &self.children
    }

    /// A decision node stays a leaf until every legal action has been tried.
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }
}

/// "What happened when I did that": one (state, action) pair's sampled
/// outcomes.
#[derive(Debug, Clone)]
pub struct ChanceNode {
    state: State,
    action: Action,
    depth: u32,
    sampled_returns: Vec<f64>,
    children: Vec<DecisionId>,
}

impl ChanceNode {
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn children(&self) -> &[DecisionId] {
        &self.children
    }

    pub fn sampled_returns(&self) -> &[f64] {
        &self.sampled_returns
    }

    pub fn visits(&self) -> usize {
        self.sampled_returns.len()
    }

    pub fn push_return(&mut self, value: f64) {
        self.sampled_returns.push(value);
    }

    /// Arithmetic mean of the accumulated sampled returns.
    ///
    /// # Panics
    ///
    /// Panics if no sample has been recorded yet; the value of an unsampled
    /// chance node is undefined and callers must guard.
    pub fn mean_return(&self) -> f64 {
        assert!(
            !self.sampled_returns.is_empty(),
            "value queried on a chance node with no sampled returns"
        );
        self.sampled_returns.iter().sum::<f64>() / self.sampled_returns.len() as f64
    }
}

/// The caller-owned arena holding one planning call's tree.
#[derive(Debug, Clone)]
pub struct SearchTree {
    decisions: Vec<DecisionNode>,
    chances: Vec<ChanceNode>,
    root: DecisionId,
}

impl SearchTree {
    /// Start a tree at the given root state with its legal actions.
    pub fn new(root_state: State, untried: Vec<Action>) -> Self {
        Self {
            decisions: vec![DecisionNode {
                state: root_state,
                depth: 0,
                untried,
                children: Vec::new(),
            }],
            chances: Vec::new(),
            root: DecisionId(0),
        }
    }

    pub fn root(&self) -> DecisionId {
        self.root
    }

    pub fn decision(&self, id: DecisionId) -> &DecisionNode {
        &self.decisions[id.0]
    }

    pub fn chance(&self, id: ChanceId) -> &ChanceNode {
        &self.chances[id.0]
    }

    pub fn chance_mut(&mut self, id: ChanceId) -> &mut ChanceNode {
        &mut self.chances[id.0]
    }

    /// All chance nodes, in creation order.
    pub fn chance_nodes(&self) -> impl Iterator<Item = &ChanceNode> {
        self.chances.iter()
    }

    /// Expand a decision node: draw one untried action uniformly at random,
    /// remove it from the untried set, and attach a fresh chance node.
    ///
    /// # Panics
    ///
    /// Panics if the node is already fully expanded; the tree policy must
    /// check first.
    pub fn expand(&mut self, id: DecisionId, rng: &mut StdRng) -> ChanceId {
        let node = &mut self.decisions[id.0];
        assert!(
            !node.untried.is_empty(),
            "expand called on a fully expanded decision node"
        );
        let index = rng.random_range(0..node.untried.len());
        let action = node.untried.swap_remove(index);
        let child = ChanceNode {
            state: node.state,
            action,
            depth: node.depth,
            sampled_returns: Vec::new(),
            children: Vec::new(),
        };
        let child_id = ChanceId(self.chances.len());
        self.chances.push(child);
        self.decisions[id.0].children.push(child_id);
        child_id
    }

    /// The decision child of `id` labelled with `state`, if one was already
    /// sampled. State comparison is exact.
    pub fn find_decision_child(&self, id: ChanceId, state: &State) -> Option<DecisionId> {
        self.chances[id.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.decisions[child.0].state == *state)
    }

    /// Attach a new decision child for a freshly sampled resulting state.
    pub fn add_decision_child(
        &mut self,
        id: ChanceId,
        state: State,
        untried: Vec<Action>,
    ) -> DecisionId {
        let depth = self.chances[id.0].depth + 1;
        let child_id = DecisionId(self.decisions.len());
        self.decisions.push(DecisionNode {
            state,
            depth,
            untried,
            children: Vec::new(),
        });
        self.chances[id.0].children.push(child_id);
        child_id
    }

    /// A decision node's value: the maximum raw mean over its children.
    /// `None` while the node has no children.
    pub fn decision_value(&self, id: DecisionId) -> Option<f64> {
        self.decisions[id.0]
            .children
            .iter()
            .map(|&child| self.chances[child.0].mean_return())
            .fold(None, |best, value| {
                Some(best.map_or(value, |b: f64| b.max(value)))
            })
    }

    /// Copy the subtree rooted at `root` into a fresh arena, re-rooting it
    /// at depth zero.
    pub fn extract_subtree(&self, root: DecisionId) -> SearchTree {
        let source = &self.decisions[root.0];
        let mut tree = SearchTree::new(source.state, source.untried.clone());
        let depth_shift = source.depth;
        for &chance in &source.children {
            self.copy_chance_into(chance, tree.root, depth_shift, &mut tree);
        }
        tree
    }

    fn copy_chance_into(
        &self,
        source: ChanceId,
        parent: DecisionId,
        depth_shift: u32,
        tree: &mut SearchTree,
    ) {
        let node = &self.chances[source.0];
        let copied = ChanceId(tree.chances.len());
        tree.chances.push(ChanceNode {
            state: node.state,
            action: node.action.clone(),
            depth: node.depth - depth_shift,
            sampled_returns: node.sampled_returns.clone(),
            children: Vec::new(),
        });
        tree.decisions[parent.0].children.push(copied);
        for &child in &node.children {
            let decision = &self.decisions[child.0];
            let copied_child = DecisionId(tree.decisions.len());
            tree.decisions.push(DecisionNode {
                state: decision.state,
                depth: decision.depth - depth_shift,
                untried: decision.untried.clone(),
                children: Vec::new(),
            });
            tree.chances[copied.0].children.push(copied_child);
            for &grandchild in &decision.children {
                self.copy_chance_into(grandchild, copied_child, depth_shift, tree);
            }
        }
    }
}
