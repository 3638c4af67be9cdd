/*
 * Typestate Domain Models
 */

mod automaton;
mod labels;
mod mode;
mod violations;

pub use automaton::{Automaton, StateId, END_LABEL};
pub use labels::LabelIndex;
pub use mode::TypestateMode;
pub use violations::{TypestateViolation, ViolationKind};
