//! Tabled backward chaining engine
//!
//! Goal-directed proof search with memoized subgoals:
//! - every goal some backward rule can prove gets one [`Generator`] per
//!   normalized pattern, found through the tabling cache
//! - a generator's first alternative is the direct data match, then each
//!   candidate rule in order
//! - a rule body clause on a tabled goal suspends as a consumer frame on that
//!   goal's generator and resumes as answers arrive, so recursive and
//!   mutually recursive predicates terminate
//! - the agenda runs ready generators round robin; when it drains without
//!   progress the completion check closes the set of generators reachable
//!   from the goal
//!
//! Only `Vec`, `VecDeque` and `IndexMap` drive iteration order, so repeated
//! queries over the same data answer in the same order.

use std::collections::VecDeque;

use fnv::FnvHashSet;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

mod generator;
mod interpreter;

pub use generator::{GeneratorId, GeneratorState};

use generator::{ConsumerFrame, FrameId, Generator};
use interpreter::{Cursor, Interpreter, RunOutcome};

use super::derivation::{Derivation, DerivationLog};
use super::{BuiltinFailure, Context};
use crate::config::ReasoningConfig;
use crate::error::ReasonerResult;
use crate::term::{Triple, TriplePattern};

/// Counters for one backward engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackwardStats {
    pub generators_created: usize,
    pub generators_completed: usize,
    pub frames_created: usize,
    /// Distinct answers over all generators
    pub answers: usize,
    /// Goals answered from an existing generator
    pub cache_hits: usize,
    /// Completion checks that closed a set of generators
    pub completion_cascades: usize,
}

/// Arena of generators and frames with the tabling cache and agenda
pub struct BackwardEngine {
    generators: Vec<Generator>,
    frames: Vec<ConsumerFrame>,
    cache: IndexMap<TriplePattern, GeneratorId>,
    agenda: VecDeque<GeneratorId>,
    trace: bool,
    record: bool,
    derivations: DerivationLog,
    failures: Vec<BuiltinFailure>,
    stats: BackwardStats,
}

impl BackwardEngine {
    pub fn new(config: &ReasoningConfig) -> Self {
        BackwardEngine {
            generators: Vec::new(),
            frames: Vec::new(),
            cache: IndexMap::new(),
            agenda: VecDeque::new(),
            trace: config.trace,
            record: config.derivation_logging,
            derivations: DerivationLog::new(),
            failures: Vec::new(),
            stats: BackwardStats::default(),
        }
    }

    // ========================================================================
    // Tabling cache
    // ========================================================================

    /// The generator for a goal, creating and scheduling it if needed
    pub fn generator_for(&mut self, ctx: &Context<'_>, goal: &TriplePattern) -> GeneratorId {
        let key = goal.normalize();
        if let Some(&id) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            return id;
        }

        let facts: Vec<Triple> = ctx.sources.find(&key).collect();
        let rules = ctx.rules.candidates(&key);
        let id = GeneratorId(self.generators.len());
        debug!(generator = %id, goal = %key, facts = facts.len(), rules = rules.len(), "generator created");

        let interpreter = Interpreter::new(key.clone(), facts, rules);
        self.generators.push(Generator::new(key.clone(), interpreter));
        self.cache.insert(key, id);
        self.stats.generators_created += 1;
        self.enqueue(id);
        id
    }

    /// Answer `index` of a generator, if found yet
    pub fn result(&self, id: GeneratorId, index: usize) -> Option<&Triple> {
        self.generators[id.0].results.get(index)
    }

    /// Answers found so far, in discovery order
    pub fn results(&self, id: GeneratorId) -> &[Triple] {
        &self.generators[id.0].results
    }

    pub fn goal(&self, id: GeneratorId) -> &TriplePattern {
        &self.generators[id.0].goal
    }

    pub fn state(&self, id: GeneratorId) -> GeneratorState {
        self.generators[id.0].state
    }

    pub fn is_complete(&self, id: GeneratorId) -> bool {
        self.generators[id.0].is_complete()
    }

    /// Number of tabled goals
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Drop every generator, frame and cached goal
    pub fn reset(&mut self) {
        self.generators.clear();
        self.frames.clear();
        self.cache.clear();
        self.agenda.clear();
        self.derivations.clear();
    }

    pub fn stats(&self) -> BackwardStats {
        self.stats
    }

    pub fn derivations(&self) -> &DerivationLog {
        &self.derivations
    }

    /// Builtin calls that failed with a soft error
    pub fn failures(&self) -> &[BuiltinFailure] {
        &self.failures
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Run the agenda until `target` has a new answer or is complete
    ///
    /// `limit` caps the answers a generator produces per turn before it goes
    /// to the back of the agenda.
    pub fn pump(&mut self, ctx: &Context<'_>, target: GeneratorId, limit: usize) -> ReasonerResult<()> {
        let start = self.generators[target.0].results.len();
        if self.generators[target.0].state == GeneratorState::Ready {
            self.enqueue(target);
        }

        loop {
            let gen = &self.generators[target.0];
            if gen.is_complete() || gen.results.len() > start {
                return Ok(());
            }
            match self.agenda.pop_front() {
                Some(next) => {
                    self.generators[next.0].queued = false;
                    self.run_generator(ctx, next, limit.max(1))?;
                }
                None => self.check_completion(target),
            }
        }
    }

    fn enqueue(&mut self, id: GeneratorId) {
        let gen = &mut self.generators[id.0];
        if gen.is_complete() || gen.queued {
            return;
        }
        gen.state = GeneratorState::Ready;
        gen.queued = true;
        self.agenda.push_back(id);
    }

    fn run_generator(&mut self, ctx: &Context<'_>, id: GeneratorId, limit: usize) -> ReasonerResult<()> {
        let Some(mut interpreter) = self.generators[id.0].interpreter.take() else {
            return Ok(());
        };
        let before = self.generators[id.0].results.len();
        let outcome = interpreter.run(self, ctx, id, limit);
        self.generators[id.0].interpreter = Some(interpreter);
        let outcome = outcome?;

        match outcome {
            RunOutcome::Yielded => self.enqueue(id),
            RunOutcome::Blocked => self.generators[id.0].state = GeneratorState::Blocked,
            RunOutcome::Exhausted => {}
        }
        self.notify_results(id, before);
        if outcome == RunOutcome::Exhausted {
            self.complete(id);
        }
        Ok(())
    }

    /// Ready every consumer of `id` if it gained answers since `before`
    fn notify_results(&mut self, id: GeneratorId, before: usize) {
        if self.generators[id.0].results.len() <= before {
            return;
        }
        let consumers = self.generators[id.0].consuming.clone();
        for frame in consumers {
            self.wake(frame);
        }
    }

    /// Put a frame on its owner's ready queue and schedule the owner
    fn wake(&mut self, id: FrameId) {
        let frame = &mut self.frames[id.0];
        if frame.finished || frame.pending {
            return;
        }
        let owner = frame.owner;
        let Some(interpreter) = self.generators[owner.0].interpreter.as_mut() else {
            frame.finished = true;
            return;
        };
        frame.pending = true;
        interpreter.push_ready(id);
        self.enqueue(owner);
    }

    fn complete(&mut self, id: GeneratorId) {
        let gen = &mut self.generators[id.0];
        if gen.is_complete() {
            return;
        }
        gen.complete();
        self.stats.generators_completed += 1;
        debug!(generator = %id, answers = gen.results.len(), "generator complete");

        let owned = std::mem::take(&mut self.generators[id.0].generating);
        for frame in owned {
            self.frames[frame.0].finished = true;
        }
        let consumers = self.generators[id.0].consuming.clone();
        for frame in consumers {
            self.wake(frame);
        }
    }

    /// Called with an empty agenda and `target` incomplete
    ///
    /// Walks the frames reachable from `target`. Anything that can still make
    /// progress is scheduled; otherwise every reachable generator has read
    /// all answers it can ever get, and the whole set completes.
    fn check_completion(&mut self, target: GeneratorId) {
        let mut visited: Vec<GeneratorId> = Vec::new();
        let mut seen: FnvHashSet<GeneratorId> = FnvHashSet::default();
        let mut stack = vec![target];

        while let Some(id) = stack.pop() {
            let gen = &self.generators[id.0];
            if gen.is_complete() || !seen.insert(id) {
                continue;
            }
            if gen.has_pending_work() {
                self.enqueue(id);
                return;
            }
            let mut unread = None;
            let mut targets = Vec::new();
            for &frame_id in &gen.generating {
                let frame = &self.frames[frame_id.0];
                if frame.finished {
                    continue;
                }
                let source = &self.generators[frame.target.0];
                if frame.next_result < source.results.len() || source.is_complete() {
                    unread = Some((frame_id, frame.pending));
                    break;
                }
                targets.push(frame.target);
            }
            match unread {
                Some((_, true)) => {
                    self.enqueue(id);
                    return;
                }
                Some((frame_id, false)) => {
                    self.wake(frame_id);
                    return;
                }
                None => {}
            }
            stack.extend(targets);
            visited.push(id);
        }

        self.stats.completion_cascades += 1;
        debug!(goal = %self.generators[target.0].goal, generators = visited.len(), "completing generator set");
        for id in visited {
            self.complete(id);
        }
    }

    // ========================================================================
    // Interpreter callbacks
    // ========================================================================

    /// Register a suspended continuation on `target`
    ///
    /// Returns the frame and whether it can be consumed right away.
    fn add_frame(&mut self, target: GeneratorId, owner: GeneratorId, cursor: Cursor) -> (FrameId, bool) {
        let id = FrameId(self.frames.len());
        let source = &self.generators[target.0];
        let ready = !source.results.is_empty() || source.is_complete();

        let mut frame = ConsumerFrame::new(target, owner, cursor);
        frame.pending = ready;
        self.frames.push(frame);
        self.generators[target.0].consuming.push(id);
        self.generators[owner.0].generating.push(id);
        self.stats.frames_created += 1;
        (id, ready)
    }

    /// Read the next answer of a frame's target
    ///
    /// `None` when the frame has read everything available; `Some(None)`
    /// when the answer did not fit the continuation.
    fn next_answer(&mut self, id: FrameId) -> Option<Option<Cursor>> {
        let frame = &mut self.frames[id.0];
        let source = &self.generators[frame.target.0];
        match source.results.get(frame.next_result) {
            Some(answer) => {
                frame.next_result += 1;
                Some(frame.cursor.advance(answer, self.record))
            }
            None => {
                frame.pending = false;
                if source.is_complete() {
                    frame.finished = true;
                }
                None
            }
        }
    }

    fn has_live_frames(&self, id: GeneratorId) -> bool {
        self.generators[id.0]
            .generating
            .iter()
            .any(|f| !self.frames[f.0].finished)
    }

    /// Record an answer for `id`; false if it was already known
    fn add_result(&mut self, id: GeneratorId, answer: Triple, derivation: Option<Derivation>) -> bool {
        if self.trace {
            trace!(generator = %id, answer = %answer, "candidate answer");
        }
        if !self.generators[id.0].add_result(answer) {
            return false;
        }
        self.stats.answers += 1;
        if let Some(derivation) = derivation {
            self.derivations.record(derivation);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builtins::BuiltinRegistry;
    use crate::reasoning::{RuleView, Sources};
    use crate::rules::{ClauseEntry, Rule, RuleSet, RuleStore};
    use crate::store::Store;
    use crate::term::Term;

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::uri(s), Term::uri(p), Term::uri(o))
    }

    fn pat(s: Term, p: &str, o: Term) -> Triple {
        Triple::new(s, Term::uri(p), o)
    }

    struct Fixture {
        rules: RuleStore,
        raw: Store,
        empty: Store,
        installed: RuleSet,
    }

    impl Fixture {
        fn new(rules: Vec<Rule>, data: Vec<Triple>) -> Self {
            Fixture {
                rules: RuleStore::index(rules, Arc::new(BuiltinRegistry::new())).unwrap(),
                raw: Store::from_triples(data),
                empty: Store::new(),
                installed: RuleSet::new(),
            }
        }

        fn ctx(&self) -> Context<'_> {
            Context {
                sources: Sources::new(&self.raw, &self.empty, &self.empty),
                rules: RuleView::new(Some(self.rules.backward_rules()), &self.installed),
            }
        }

        /// Pump a goal to completion and return its answers
        fn solve(&self, engine: &mut BackwardEngine, goal: &TriplePattern) -> Vec<Triple> {
            let ctx = self.ctx();
            let id = engine.generator_for(&ctx, goal);
            while !engine.is_complete(id) {
                engine.pump(&ctx, id, 4).unwrap();
            }
            engine.results(id).to_vec()
        }
    }

    fn ancestor_rules() -> Vec<Rule> {
        vec![
            Rule::backward(
                pat(Term::var("x"), "urn:anc", Term::var("y")),
                vec![pat(Term::var("x"), "urn:parent", Term::var("y")).into()],
            ),
            Rule::backward(
                pat(Term::var("x"), "urn:anc", Term::var("z")),
                vec![
                    pat(Term::var("x"), "urn:anc", Term::var("y")).into(),
                    pat(Term::var("y"), "urn:parent", Term::var("z")).into(),
                ],
            ),
        ]
    }

    fn objects(triples: &[Triple]) -> Vec<Term> {
        triples.iter().map(|t| t.object.clone()).collect()
    }

    #[test]
    fn test_left_recursive_ancestor() {
        let fx = Fixture::new(
            ancestor_rules(),
            vec![t("urn:a", "urn:parent", "urn:b"), t("urn:b", "urn:parent", "urn:c")],
        );
        let mut engine = BackwardEngine::new(&ReasoningConfig::default());
        let answers = fx.solve(&mut engine, &pat(Term::uri("urn:a"), "urn:anc", Term::var("w")));
        assert_eq!(objects(&answers), vec![Term::uri("urn:b"), Term::uri("urn:c")]);
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let rules = vec![
            Rule::backward(
                pat(Term::var("x"), "urn:p", Term::var("y")),
                vec![pat(Term::var("x"), "urn:q", Term::var("y")).into()],
            ),
            Rule::backward(
                pat(Term::var("x"), "urn:q", Term::var("y")),
                vec![pat(Term::var("x"), "urn:p", Term::var("y")).into()],
            ),
        ];
        let fx = Fixture::new(rules, vec![t("urn:a", "urn:p", "urn:b"), t("urn:c", "urn:q", "urn:d")]);
        let mut engine = BackwardEngine::new(&ReasoningConfig::default());

        let p = fx.solve(&mut engine, &pat(Term::var("s"), "urn:p", Term::var("o")));
        assert_eq!(p, vec![t("urn:a", "urn:p", "urn:b"), t("urn:c", "urn:p", "urn:d")]);
        let q = fx.solve(&mut engine, &pat(Term::var("s"), "urn:q", Term::var("o")));
        assert_eq!(q, vec![t("urn:c", "urn:q", "urn:d"), t("urn:a", "urn:q", "urn:b")]);
        assert!(engine.stats().completion_cascades >= 1);
    }

    #[test]
    fn test_results_match_result_set() {
        let fx = Fixture::new(
            ancestor_rules(),
            vec![
                t("urn:a", "urn:parent", "urn:b"),
                t("urn:b", "urn:parent", "urn:c"),
                t("urn:c", "urn:parent", "urn:a"),
            ],
        );
        let mut engine = BackwardEngine::new(&ReasoningConfig::default());
        let ctx = fx.ctx();
        let id = engine.generator_for(&ctx, &pat(Term::var("x"), "urn:anc", Term::var("y")));

        while !engine.is_complete(id) {
            engine.pump(&ctx, id, 1).unwrap();
            for gen in engine.generators.iter().filter(|g| !g.is_complete()) {
                let set = gen.result_set.as_ref().map(|s| s.len());
                assert_eq!(Some(gen.results.len()), set);
            }
        }
        assert_eq!(engine.results(id).len(), 9);
    }

    #[test]
    fn test_cache_shares_normalized_goals() {
        let fx = Fixture::new(ancestor_rules(), vec![t("urn:a", "urn:parent", "urn:b")]);
        let mut engine = BackwardEngine::new(&ReasoningConfig::default());
        let ctx = fx.ctx();
        let first = engine.generator_for(&ctx, &pat(Term::var("x"), "urn:anc", Term::var("y")));
        let second = engine.generator_for(&ctx, &pat(Term::var("s"), "urn:anc", Term::var("o")));
        assert_eq!(first, second);
        assert_eq!(engine.stats().cache_hits, 1);
    }

    #[test]
    fn test_builtin_in_backward_body() {
        let rules = vec![Rule::backward(
            pat(Term::var("x"), "urn:next", Term::var("n")),
            vec![
                pat(Term::var("x"), "urn:value", Term::var("v")).into(),
                ClauseEntry::call("sum", vec![Term::var("v"), Term::integer(1), Term::var("n")]),
            ],
        )];
        let fx = Fixture::new(
            rules,
            vec![Triple::new(Term::uri("urn:a"), Term::uri("urn:value"), Term::integer(1))],
        );
        let mut engine = BackwardEngine::new(&ReasoningConfig::default());
        let answers = fx.solve(&mut engine, &pat(Term::var("x"), "urn:next", Term::var("n")));
        assert_eq!(
            answers,
            vec![Triple::new(Term::uri("urn:a"), Term::uri("urn:next"), Term::integer(2))]
        );
    }

    #[test]
    fn test_repeated_goal_variable_filters_answers() {
        let rules = vec![Rule::backward(
            pat(Term::var("x"), "urn:rel", Term::var("y")),
            vec![pat(Term::var("x"), "urn:edge", Term::var("y")).into()],
        )];
        let fx = Fixture::new(
            rules,
            vec![t("urn:a", "urn:edge", "urn:a"), t("urn:a", "urn:edge", "urn:b")],
        );
        let mut engine = BackwardEngine::new(&ReasoningConfig::default());
        let answers = fx.solve(&mut engine, &pat(Term::var("z"), "urn:rel", Term::var("z")));
        assert_eq!(answers, vec![t("urn:a", "urn:rel", "urn:a")]);
    }
}
