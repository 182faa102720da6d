//! Request middleware: request lifecycle concerns such as tracing.

pub mod trace;

pub use trace::Trace;
