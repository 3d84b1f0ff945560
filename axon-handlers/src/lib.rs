//! # axon-handlers — the default handler stack
//!
//! One handler per built-in effect family. Each takes exactly its own
//! family and delegates everything else, so the stack composes with
//! user handlers in any order and a scoped handler can shadow any
//! single family.
//!
//! [`default_stack`] assembles the full set; drivers append it outside
//! (after) the user-supplied root chain, so user handlers are consulted
//! first and these are the fallback semantics.

#![deny(missing_docs)]

mod concurrency;
mod io;
mod reader;
mod semaphore;
mod state;
mod time;
mod writer;

pub use concurrency::ConcurrencyHandler;
pub use io::IoHandler;
pub use reader::ReaderHandler;
pub use semaphore::SemaphoreHandler;
pub use state::StateHandler;
pub use time::TimeHandler;
pub use writer::WriterHandler;

use axon_core::Handler;
use std::sync::Arc;

/// The full default stack, outermost first.
///
/// Relative order among these is immaterial — their effect families are
/// disjoint — but the reader sits innermost by convention, since it is
/// the family scoped handlers shadow most often.
pub fn default_stack() -> Vec<Arc<dyn Handler>> {
    vec![
        Arc::new(ConcurrencyHandler),
        Arc::new(SemaphoreHandler),
        Arc::new(TimeHandler),
        Arc::new(IoHandler),
        Arc::new(WriterHandler),
        Arc::new(StateHandler),
        Arc::new(ReaderHandler),
    ]
}
