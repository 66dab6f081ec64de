//! qualify: insert explicit namespace qualifiers into C++ sources.
//!
//! Given a target namespace, every unqualified reference whose declaration
//! lives in that namespace gets `<Namespace>::` inserted in front of it.
//! Translation units come from AST dumps written by a C++ frontend; edits are
//! merged per file and applied all or nothing.

// Core infrastructure - re-exported from qualify-core
pub use qualify_core::apply;
pub use qualify_core::diff;
pub use qualify_core::error;
pub use qualify_core::filter;
pub use qualify_core::output;
pub use qualify_core::patch;
pub use qualify_core::text;
pub use qualify_core::types;

// C++ engine - re-exported from qualify-cxx
pub use qualify_cxx::ast;
pub use qualify_cxx::engine;
pub use qualify_cxx::loader;
pub use qualify_cxx::locator;
pub use qualify_cxx::matcher;
pub use qualify_cxx::ops;
pub use qualify_cxx::skip;

// Front door
pub mod cli;
