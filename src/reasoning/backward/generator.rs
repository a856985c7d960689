//! Generators and consumer frames
//!
//! A [`Generator`] is the table entry for one normalized goal: its answers in
//! discovery order, the duplicate guard, and the interpreter still searching
//! for more. A [`ConsumerFrame`] is a suspended rule continuation waiting on
//! another generator's answers. Both live in arenas owned by the engine and
//! refer to each other by index.

use std::fmt;

use fnv::FnvHashSet;

use super::interpreter::{Cursor, Interpreter};
use crate::term::{Triple, TriplePattern};

/// Handle of a generator in the engine's arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneratorId(pub(crate) usize);

impl GeneratorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Handle of a consumer frame in the engine's arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FrameId(pub(crate) usize);

/// Generator lifecycle: `Ready -> (Blocked <-> Ready)* -> Complete`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorState {
    /// Has work; on the agenda or running
    Ready,
    /// Waiting on answers from other generators
    Blocked,
    /// All answers found; never runs again
    Complete,
}

pub(crate) struct Generator {
    pub goal: TriplePattern,
    pub state: GeneratorState,
    pub results: Vec<Triple>,
    /// Released on completion
    pub result_set: Option<FnvHashSet<Triple>>,
    /// Dropped on completion; taken out while running
    pub interpreter: Option<Interpreter>,
    /// Frames of this generator's interpreter waiting on other generators
    pub generating: Vec<FrameId>,
    /// Frames reading this generator's results
    pub consuming: Vec<FrameId>,
    /// Currently on the agenda
    pub queued: bool,
}

impl Generator {
    pub fn new(goal: TriplePattern, interpreter: Interpreter) -> Self {
        Generator {
            goal,
            state: GeneratorState::Ready,
            results: Vec::new(),
            result_set: Some(FnvHashSet::default()),
            interpreter: Some(interpreter),
            generating: Vec::new(),
            consuming: Vec::new(),
            queued: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == GeneratorState::Complete
    }

    /// Append an answer unless it was already found
    pub fn add_result(&mut self, answer: Triple) -> bool {
        let Some(seen) = self.result_set.as_mut() else {
            unreachable!("answer {} offered to completed generator {}", answer, self.goal);
        };
        if !seen.insert(answer.clone()) {
            return false;
        }
        self.results.push(answer);
        debug_assert_eq!(self.results.len(), seen.len());
        true
    }

    /// Whether the interpreter has choice points or ready frames left
    pub fn has_pending_work(&self) -> bool {
        self.interpreter.as_ref().map_or(false, Interpreter::has_work)
    }

    pub fn complete(&mut self) {
        self.state = GeneratorState::Complete;
        self.interpreter = None;
        self.result_set = None;
    }
}

/// A rule continuation suspended on another generator's answers
pub(crate) struct ConsumerFrame {
    /// Generator whose answers are consumed
    pub target: GeneratorId,
    /// Generator this frame's answers feed
    pub owner: GeneratorId,
    /// Continuation; its current clause is the consumed goal
    pub cursor: Cursor,
    /// Index of the next unread answer of `target`
    pub next_result: usize,
    /// Queued or on the owner's stack
    pub pending: bool,
    /// Target complete and fully read, or owner gone
    pub finished: bool,
}

impl ConsumerFrame {
    pub fn new(target: GeneratorId, owner: GeneratorId, cursor: Cursor) -> Self {
        ConsumerFrame {
            target,
            owner,
            cursor,
            next_result: 0,
            pending: false,
            finished: false,
        }
    }
}
