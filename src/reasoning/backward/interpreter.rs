//! Resumable rule interpreter
//!
//! Each generator owns one interpreter. Its state is plain data: a stack of
//! choice points and a queue of consumer frames with unread answers. A run
//! pops choice points depth first until it has produced a batch of new
//! answers, has nothing left but suspended frames, or is exhausted.
//!
//! A body clause is handled by kind:
//! - builtin call: evaluated in place
//! - pattern no backward rule can prove: matched against the sources and
//!   pushed as a `Data` choice point
//! - pattern some backward rule can prove: a consumer frame on the tabled
//!   generator for that goal; the continuation resumes as answers arrive

use std::collections::VecDeque;
use std::sync::Arc;

use super::generator::{FrameId, GeneratorId};
use super::BackwardEngine;
use crate::reasoning::derivation::Derivation;
use crate::reasoning::{eval_call, Context};
use crate::error::ReasonerResult;
use crate::rules::{CompiledClause, CompiledRule};
use crate::term::{BindingEnv, Triple, TriplePattern};

/// Where a rule instance stands: its bindings and next clause
#[derive(Clone, Debug)]
pub(crate) struct Cursor {
    pub rule: Arc<CompiledRule>,
    pub env: BindingEnv,
    pub clause: usize,
    pub premises: Vec<Triple>,
}

impl Cursor {
    fn new(rule: Arc<CompiledRule>, env: BindingEnv) -> Self {
        Cursor {
            rule,
            env,
            clause: 0,
            premises: Vec::new(),
        }
    }

    /// Continue past the current pattern clause with a matching triple
    pub fn advance(&self, triple: &Triple, record: bool) -> Option<Cursor> {
        let CompiledClause::Pattern(pattern) = &self.rule.body()[self.clause] else {
            unreachable!("cursor of {} advanced on a call clause", self.rule.rule().label());
        };
        let env = self.env.match_triple(pattern, triple)?;
        let mut premises = self.premises.clone();
        if record {
            premises.push(triple.clone());
        }
        Some(Cursor {
            rule: Arc::clone(&self.rule),
            env,
            clause: self.clause + 1,
            premises,
        })
    }
}

pub(crate) enum ChoicePoint {
    /// Direct data matches first, then candidate rules
    Alternatives {
        facts: Vec<Triple>,
        next_fact: usize,
        rules: Vec<Arc<CompiledRule>>,
        next_rule: usize,
    },
    /// Matches of an untabled clause
    Data {
        cursor: Cursor,
        matches: Vec<Triple>,
        next: usize,
    },
    /// Unread answers of a consumer frame
    Consume(FrameId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// Batch limit reached with work left
    Yielded,
    /// Only suspended frames remain
    Blocked,
    /// Nothing left at all
    Exhausted,
}

enum Action {
    Pop,
    Skip,
    Answer(Triple),
    Resume(Cursor),
    Consume(FrameId),
}

type Answer = (Triple, Option<Derivation>);

pub(crate) struct Interpreter {
    goal: TriplePattern,
    stack: Vec<ChoicePoint>,
    ready: VecDeque<FrameId>,
}

impl Interpreter {
    pub fn new(goal: TriplePattern, facts: Vec<Triple>, rules: Vec<Arc<CompiledRule>>) -> Self {
        Interpreter {
            goal,
            stack: vec![ChoicePoint::Alternatives {
                facts,
                next_fact: 0,
                rules,
                next_rule: 0,
            }],
            ready: VecDeque::new(),
        }
    }

    pub fn has_work(&self) -> bool {
        !self.stack.is_empty() || !self.ready.is_empty()
    }

    /// Queue a frame whose target has unread answers (or completed)
    pub fn push_ready(&mut self, frame: FrameId) {
        self.ready.push_back(frame);
    }

    /// Run until `limit` new answers, suspension or exhaustion
    pub fn run(
        &mut self,
        engine: &mut BackwardEngine,
        ctx: &Context<'_>,
        me: GeneratorId,
        limit: usize,
    ) -> ReasonerResult<RunOutcome> {
        let mut produced = 0;
        loop {
            if produced >= limit {
                return Ok(RunOutcome::Yielded);
            }

            let action = match self.stack.last_mut() {
                None => match self.ready.pop_front() {
                    Some(frame) => {
                        self.stack.push(ChoicePoint::Consume(frame));
                        continue;
                    }
                    None if engine.has_live_frames(me) => return Ok(RunOutcome::Blocked),
                    None => return Ok(RunOutcome::Exhausted),
                },
                Some(ChoicePoint::Alternatives {
                    facts,
                    next_fact,
                    rules,
                    next_rule,
                }) => {
                    if let Some(fact) = facts.get(*next_fact) {
                        *next_fact += 1;
                        Action::Answer(fact.clone())
                    } else if let Some(rule) = rules.get(*next_rule) {
                        *next_rule += 1;
                        let Some(head) = rule.head_pattern() else {
                            unreachable!("backward rule {} has no single head", rule.rule().label());
                        };
                        let mut env = BindingEnv::new(rule.num_vars());
                        if env.unify_with_goal(head, &self.goal) {
                            Action::Resume(Cursor::new(Arc::clone(rule), env))
                        } else {
                            Action::Skip
                        }
                    } else {
                        Action::Pop
                    }
                }
                Some(ChoicePoint::Data {
                    cursor,
                    matches,
                    next,
                }) => match matches.get(*next) {
                    Some(triple) => {
                        *next += 1;
                        match cursor.advance(triple, engine.record) {
                            Some(c) => Action::Resume(c),
                            None => Action::Skip,
                        }
                    }
                    None => Action::Pop,
                },
                Some(ChoicePoint::Consume(frame)) => Action::Consume(*frame),
            };

            let answer = match action {
                Action::Pop => {
                    self.stack.pop();
                    None
                }
                Action::Skip => None,
                Action::Answer(fact) => Some((fact, None)),
                Action::Resume(cursor) => self.step(engine, ctx, me, cursor)?,
                Action::Consume(frame) => match engine.next_answer(frame) {
                    Some(Some(cursor)) => self.step(engine, ctx, me, cursor)?,
                    Some(None) => None,
                    None => {
                        self.stack.pop();
                        None
                    }
                },
            };

            if let Some((answer, derivation)) = answer {
                if engine.add_result(me, answer, derivation) {
                    produced += 1;
                }
            }
        }
    }

    /// Evaluate clauses from the cursor until an answer, a choice point or a suspension
    fn step(
        &mut self,
        engine: &mut BackwardEngine,
        ctx: &Context<'_>,
        me: GeneratorId,
        mut cursor: Cursor,
    ) -> ReasonerResult<Option<Answer>> {
        loop {
            let rule = Arc::clone(&cursor.rule);
            match rule.body().get(cursor.clause) {
                None => {
                    let Some(head) = rule.head_pattern() else {
                        unreachable!("backward rule {} has no single head", rule.rule().label());
                    };
                    let answer = cursor.env.instantiate(head);
                    if !answer.is_ground() || !self.goal.matches(&answer) {
                        return Ok(None);
                    }
                    let derivation = engine.record.then(|| {
                        Derivation::new(Arc::clone(rule.rule()), answer.clone(), cursor.premises)
                    });
                    return Ok(Some((answer, derivation)));
                }
                Some(CompiledClause::Call { builtin, args }) => {
                    match eval_call(builtin, args, &cursor.env, &rule, &mut engine.failures)? {
                        Some(env) => {
                            cursor.env = env;
                            cursor.clause += 1;
                        }
                        None => return Ok(None),
                    }
                }
                Some(CompiledClause::Pattern(pattern)) => {
                    let goal = cursor.env.instantiate(pattern);
                    if ctx.rules.is_tabled(&goal) {
                        let target = engine.generator_for(ctx, &goal);
                        let (frame, ready) = engine.add_frame(target, me, cursor);
                        if ready {
                            self.ready.push_back(frame);
                        }
                    } else {
                        let matches = ctx.sources.find(&goal).collect();
                        self.stack.push(ChoicePoint::Data {
                            cursor,
                            matches,
                            next: 0,
                        });
                    }
                    return Ok(None);
                }
            }
        }
    }
}
