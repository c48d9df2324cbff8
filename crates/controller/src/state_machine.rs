//! Generic state machine with guarded transitions.
//!
//! States are identified by a key (usually a small enum). Each key owns at
//! most one node holding the state's behavior and its outgoing transitions.
//! Transitions are plain predicates over a context `C` that the owner passes
//! in on every call, so predicates and state hooks never hold references into
//! the owner.
//!
//! # Evaluation order
//!
//! [`StateMachine::update`] checks "any" transitions first, then the current
//! node's transitions, both in registration order. The first predicate that
//! returns `true` wins. A winning transition that targets the current state
//! does nothing (no `exit`/`enter`), and it still shadows later transitions.
//!
//! [`StateMachine::fixed_update`] never evaluates transitions.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Behavior attached to a state. All hooks default to no-ops.
pub trait State<C> {
    fn enter(&mut self, _ctx: &mut C) {}
    fn update(&mut self, _ctx: &mut C) {}
    fn fixed_update(&mut self, _ctx: &mut C) {}
    fn exit(&mut self, _ctx: &mut C) {}
}

/// Transition guard, evaluated once per [`StateMachine::update`].
pub type Predicate<C> = Box<dyn Fn(&C) -> bool>;

struct Transition<K, C> {
    to: K,
    condition: Predicate<C>,
}

struct StateNode<K, C> {
    /// `None` until a behavior is registered; such nodes act as empty states.
    state: Option<Box<dyn State<C>>>,
    transitions: Vec<Transition<K, C>>,
}

impl<K, C> StateNode<K, C> {
    fn empty() -> Self {
        Self {
            state: None,
            transitions: Vec::new(),
        }
    }
}

/// Keyed state graph driving one current state.
pub struct StateMachine<K, C> {
    current: Option<K>,
    nodes: HashMap<K, StateNode<K, C>>,
    any_transitions: Vec<Transition<K, C>>,
}

impl<K, C> Default for StateMachine<K, C> {
    fn default() -> Self {
        Self {
            current: None,
            nodes: HashMap::new(),
            any_transitions: Vec::new(),
        }
    }
}

impl<K, C> StateMachine<K, C>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach behavior to `key`.
    ///
    /// Only the first registration for a key is kept; later ones are ignored
    /// and `false` is returned.
    pub fn add_state<S>(&mut self, key: K, state: S) -> bool
    where
        S: State<C> + 'static,
    {
        let node = self.node_mut(key);
        if node.state.is_some() {
            log::debug!("state {key:?} already registered, keeping the existing one");
            return false;
        }
        node.state = Some(Box::new(state));
        true
    }

    /// Register a transition from `from` to `to`, taken when `condition` holds.
    pub fn at<F>(&mut self, from: K, to: K, condition: F)
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.node_mut(to);
        self.node_mut(from).transitions.push(Transition {
            to,
            condition: Box::new(condition),
        });
    }

    /// Register a transition to `to` that is checked from every state, before
    /// the current state's own transitions.
    pub fn any<F>(&mut self, to: K, condition: F)
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.node_mut(to);
        self.any_transitions.push(Transition {
            to,
            condition: Box::new(condition),
        });
    }

    /// Make `key` current and run its `enter` hook. The previous state, if
    /// any, is not exited; this is meant for initialization.
    pub fn set_state(&mut self, key: K, ctx: &mut C) {
        self.current = Some(key);
        if let Some(state) = self.node_mut(key).state.as_deref_mut() {
            state.enter(ctx);
        }
    }

    /// Evaluate transitions, switch if needed, then run the current state's
    /// `update` hook.
    ///
    /// Returns the state that was entered, if a switch happened.
    pub fn update(&mut self, ctx: &mut C) -> Option<K> {
        let current = self.current?;

        let entered = match self.transition_target(current, ctx) {
            Some(to) if to != current => {
                self.change_state(current, to, ctx);
                Some(to)
            }
            _ => None,
        };

        if let Some(key) = self.current {
            if let Some(state) = self.behavior_mut(key) {
                state.update(ctx);
            }
        }

        entered
    }

    /// Run the current state's `fixed_update` hook. Never transitions.
    pub fn fixed_update(&mut self, ctx: &mut C) {
        if let Some(key) = self.current {
            if let Some(state) = self.behavior_mut(key) {
                state.fixed_update(ctx);
            }
        }
    }

    /// The current state, or `None` before [`StateMachine::set_state`].
    #[inline]
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// Check if `key` is the current state.
    #[inline]
    pub fn is_in(&self, key: K) -> bool {
        self.current == Some(key)
    }

    /// Number of distinct states known to the machine.
    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of transitions leaving `key` (excluding "any" transitions).
    pub fn transition_count(&self, key: K) -> usize {
        self.nodes.get(&key).map_or(0, |node| node.transitions.len())
    }

    fn transition_target(&self, current: K, ctx: &C) -> Option<K> {
        let local = self
            .nodes
            .get(&current)
            .into_iter()
            .flat_map(|node| node.transitions.iter());

        self.any_transitions
            .iter()
            .chain(local)
            .find(|transition| (transition.condition)(ctx))
            .map(|transition| transition.to)
    }

    fn change_state(&mut self, from: K, to: K, ctx: &mut C) {
        if let Some(state) = self.behavior_mut(from) {
            state.exit(ctx);
        }
        self.current = Some(to);
        if let Some(state) = self.behavior_mut(to) {
            state.enter(ctx);
        }
    }

    fn behavior_mut(&mut self, key: K) -> Option<&mut (dyn State<C> + 'static)> {
        self.nodes.get_mut(&key).and_then(|node| node.state.as_deref_mut())
    }

    fn node_mut(&mut self, key: K) -> &mut StateNode<K, C> {
        self.nodes.entry(key).or_insert_with(StateNode::empty)
    }
}

impl<K: fmt::Debug, C> fmt::Debug for StateMachine<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("states", &self.nodes.len())
            .field("any_transitions", &self.any_transitions.len())
            .finish()
    }
}
