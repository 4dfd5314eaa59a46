//! Progress reporting shared by every routine.
//!
//! Routines take a `verbose` flag that only selects the level of their
//! progress events: `INFO` when set, `DEBUG` otherwise. Inner-loop details
//! (line-search trials, CG steps) are always emitted at `TRACE`.

/// Emits a progress event at `INFO` when `verbose` is set and at `DEBUG`
/// otherwise.
///
/// # Example
///
/// ```
/// use descentopt_core::report;
///
/// let iterations = 3;
/// report!(true, iterations, "solver terminated");
/// report!(false, "start solver");
/// ```
#[macro_export]
macro_rules! report {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            $crate::tracing::info!($($arg)+);
        } else {
            $crate::tracing::debug!($($arg)+);
        }
    };
}
