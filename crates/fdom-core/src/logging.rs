//! Logging shims.
//!
//! With the `tracing` feature the macros forward to `tracing`; without it
//! they compile to nothing. The local names avoid the builtin `warn`
//! attribute.

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug as log_debug, warn as log_warn};

#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! log_debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use {log_debug, log_warn};
