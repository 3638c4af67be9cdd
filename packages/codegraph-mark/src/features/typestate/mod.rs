/*
 * Typestate Checking
 *
 * Decides whether the observed call sequence of one concrete instance is a
 * word of a rule's order grammar.
 *
 * Architecture:
 * - Domain: Automaton, violations, label index, mode
 * - Infrastructure: order compiler (Thompson NFA → subset DFA), alias flow,
 *   summary-based pushdown solver
 * - Application: DfaChecker (intraprocedural), WpdsChecker (interprocedural,
 *   alias-aware)
 * - Ports: TypestateStrategy
 *
 * References:
 * - Strom & Yellin (1993) "Typestate"
 * - Reps, Schwoon, Jha, Melski (2005) "Weighted Pushdown Systems and their
 *   Application to Interprocedural Dataflow Analysis"
 */

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{strategy_for, DfaChecker, WpdsChecker};
pub use domain::{
    Automaton, LabelIndex, StateId, TypestateMode, TypestateViolation, ViolationKind, END_LABEL,
};
pub use infrastructure::{AliasFlow, AutomatonCache, OrderCompiler};
pub use ports::{TypestateOutcome, TypestateQuery, TypestateStrategy};
