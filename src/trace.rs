//! Instrumentation hooks for the kernel entry points.
//!
//! `kernel_span!` opens an already-entered info span covering one kernel
//! invocation; `kernel_event!` records a counter-style event after it.
//! Both compile away when the `tracing` feature is off: the span arm
//! collapses to a unit guard and the event arm to nothing, so call sites
//! keep a single unconditional shape.

#[cfg(feature = "tracing")]
macro_rules! kernel_span {
    ($name:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info_span!($name $(, $key = $value)*).entered()
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! kernel_span {
    ($name:literal $(, $key:ident = $value:expr)* $(,)?) => {
        ()
    };
}

#[cfg(feature = "tracing")]
macro_rules! kernel_event {
    ($name:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(name: $name $(, $key = $value)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! kernel_event {
    ($name:literal $(, $key:ident = $value:expr)* $(,)?) => {};
}

pub(crate) use kernel_event;
pub(crate) use kernel_span;
