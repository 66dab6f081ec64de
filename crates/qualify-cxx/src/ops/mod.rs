//! C++ rewriting operations.

pub mod qualify;

pub use qualify::{process_translation_unit, run, QualifyOptions, QualifyRun, UnitOutput};
