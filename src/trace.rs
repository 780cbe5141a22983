//! Indentation-aware trace logging on top of the `log` crate, so consumers
//! opt in with their own subscriber (`env_logger` in tests) instead of the
//! library forcing one.
//!
//! This mirrors the shape of the teacher's own `debug::log`/`debug::logn`
//! helpers (used to nest trace output by recursion depth during table and
//! code generation). `crate::operations::digraph`'s recursive SCC traversal
//! is the one construction routine here with genuine call-depth recursion,
//! so it's the only caller that wraps its recursive step in an
//! [`IndentGuard`]; `crate::runtime`'s shift/reduce/accept logging and
//! `Parser::prepare`'s progress line call `trace!` flat, at whatever
//! indentation (if any) is already active on the thread.

use std::cell::Cell;

thread_local! {
    static INDENT: Cell<usize> = Cell::new(0);
}

/// Increases the indentation used by subsequent [`trace!`] calls on this
/// thread until the returned guard is dropped.
pub(crate) struct IndentGuard;

impl IndentGuard {
    pub(crate) fn enter() -> Self {
        INDENT.with(|i| i.set(i.get() + 1));
        IndentGuard
    }
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        INDENT.with(|i| i.set(i.get().saturating_sub(1)));
    }
}

pub(crate) fn indent() -> usize {
    INDENT.with(|i| i.get())
}

macro_rules! trace {
    ($($args:tt)*) => {
        log::debug!("{0:1$}{2}", "", $crate::trace::indent() * 2, format_args!($($args)*))
    }
}

pub(crate) use trace;
