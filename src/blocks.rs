//! Phase blocks and the ordering rules between them
//!
//! A phase test body is a flat list of statements in which bare calls such as `Given`,
//! `When` or `Then` (optionally carrying a description argument) open a new phase. Each
//! phase's ordering rules live in one table, [`Phase::rules`]: whether a test may
//! open with it, whether a test may end with it, and which phases may follow it.
//!
//! | Phase   | Can start | Can end | Successors       |
//! |---------|-----------|---------|------------------|
//! | Given   | yes       | no      | When, Expect     |
//! | When    | yes       | no      | Then             |
//! | Then    | no        | yes     | Cleanup, Where   |
//! | Expect  | yes       | yes     | Cleanup, Where   |
//! | Cleanup | no        | yes     | Where            |
//! | Where   | no        | yes     | -                |

use crate::error::PhaseOrderError;
use crate::tree::view::tags;
use crate::tree::{Node, Range};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Synthetic phase before the first introducer.
    Start,
    Given,
    When,
    Then,
    Expect,
    Cleanup,
    Where,
    /// Synthetic phase after the last statement.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRules {
    pub can_start: bool,
    pub can_end: bool,
    pub successors: &'static [Phase],
}

impl Phase {
    pub const INTRODUCED: [Phase; 6] = [
        Phase::Given,
        Phase::When,
        Phase::Then,
        Phase::Expect,
        Phase::Cleanup,
        Phase::Where,
    ];

    pub fn rules(self) -> &'static PhaseRules {
        const fn rules(can_start: bool, can_end: bool, successors: &'static [Phase]) -> PhaseRules {
            PhaseRules {
                can_start,
                can_end,
                successors,
            }
        }
        const START: PhaseRules = rules(false, false, &[Phase::Given, Phase::When, Phase::Expect]);
        const GIVEN: PhaseRules = rules(true, false, &[Phase::When, Phase::Expect]);
        const WHEN: PhaseRules = rules(true, false, &[Phase::Then]);
        const THEN: PhaseRules = rules(false, true, &[Phase::Cleanup, Phase::Where]);
        const EXPECT: PhaseRules = rules(true, true, &[Phase::Cleanup, Phase::Where]);
        const CLEANUP: PhaseRules = rules(false, true, &[Phase::Where]);
        const WHERE: PhaseRules = rules(false, true, &[]);
        const END: PhaseRules = rules(false, false, &[]);

        match self {
            Phase::Start => &START,
            Phase::Given => &GIVEN,
            Phase::When => &WHEN,
            Phase::Then => &THEN,
            Phase::Expect => &EXPECT,
            Phase::Cleanup => &CLEANUP,
            Phase::Where => &WHERE,
            Phase::End => &END,
        }
    }

    pub fn can_start(self) -> bool {
        self.rules().can_start
    }

    pub fn can_end(self) -> bool {
        self.rules().can_end
    }

    pub fn successors(self) -> &'static [Phase] {
        self.rules().successors
    }

    pub fn allows(self, next: Phase) -> bool {
        if next == Phase::End {
            return self.can_end();
        }
        self.successors().contains(&next)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Start => "Start",
            Phase::Given => "Given",
            Phase::When => "When",
            Phase::Then => "Then",
            Phase::Expect => "Expect",
            Phase::Cleanup => "Cleanup",
            Phase::Where => "Where",
            Phase::End => "End",
        }
    }

    pub fn from_name(name: &str) -> Option<Phase> {
        Self::INTRODUCED
            .into_iter()
            .find(|phase| phase.name() == name)
    }

    pub fn ir_tag(self) -> Option<&'static str> {
        match self {
            Phase::Given => Some(tags::GIVEN),
            Phase::When => Some(tags::WHEN),
            Phase::Then => Some(tags::THEN),
            Phase::Expect => Some(tags::EXPECT),
            Phase::Cleanup => Some(tags::CLEANUP),
            Phase::Where => Some(tags::WHERE),
            Phase::Start | Phase::End => None,
        }
    }

    pub fn from_ir_tag(tag: &str) -> Option<Phase> {
        Self::INTRODUCED
            .into_iter()
            .filter(|phase| *phase != Phase::Where)
            .find(|phase| phase.ir_tag() == Some(tag))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The phase a statement introduces, if it is `(send nil :Given ...)` and friends.
pub fn introduced_phase(statement: &Node) -> Option<Phase> {
    let call = statement.as_call()?;
    if call.receiver.is_some() {
        return None;
    }
    Phase::from_name(call.method)
}

pub fn has_phases(statements: &[Node]) -> bool {
    statements.iter().any(|s| introduced_phase(s).is_some())
}

/// One phase and the statements between its introducer and the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub phase: Phase,
    /// The introducer statement; `None` for the synthetic start.
    pub introducer: Option<Node>,
    pub statements: Vec<Node>,
}

impl Block {
    fn new(phase: Phase, introducer: Option<Node>) -> Self {
        Self {
            phase,
            introducer,
            statements: Vec::new(),
        }
    }

    pub fn location(&self) -> Option<&Range> {
        self.introducer.as_ref().and_then(Node::location)
    }

    fn order_error(&self, fallback: Option<&Range>) -> PhaseOrderError {
        PhaseOrderError {
            phase: self.phase,
            location: self.location().or(fallback).cloned(),
            expected: self.phase.successors().to_vec(),
        }
    }
}

/// Splits a test body into phase blocks and validates their order.
///
/// `test_location` is reported when the body does not open with a phase.
pub fn parse_blocks(
    test_location: Option<&Range>,
    statements: Vec<Node>,
) -> Result<Vec<Block>, PhaseOrderError> {
    let mut blocks = Vec::new();
    let mut current = Block::new(Phase::Start, None);

    for statement in statements {
        match introduced_phase(&statement) {
            Some(phase) => {
                if !current.phase.allows(phase) {
                    return Err(current.order_error(test_location));
                }
                let next = Block::new(phase, Some(statement));
                let finished = std::mem::replace(&mut current, next);
                if finished.phase != Phase::Start {
                    blocks.push(finished);
                }
            }
            None if current.phase == Phase::Start => {
                return Err(current.order_error(test_location));
            }
            None => current.statements.push(statement),
        }
    }

    if !current.phase.allows(Phase::End) {
        return Err(current.order_error(test_location));
    }
    blocks.push(current);
    Ok(blocks)
}
