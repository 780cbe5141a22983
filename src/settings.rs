//! Construction-time knobs, in the spirit of the teacher's own `Settings`
//! struct (which controls generator output paths, table flavor and
//! verbosity). This library does no code generation, so the surface is
//! smaller, but the shape — one struct threaded into `prepare`, defaulted
//! by `Default` — is kept.

/// Options controlling how [`crate::runtime::Parser::prepare`] builds the
/// automaton and parsing table.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Emit `log::debug!` trace lines (via [`crate::trace`]) while building
    /// the automaton, relations and table. Off by default since this is a
    /// library, not a CLI, and tracing has a real cost on large grammars.
    pub trace: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { trace: false }
    }
}
