//! Fault barrier around extension code.
//!
//! [`invoke`] runs a hook body and turns any panic it raises into a
//! [`PhaseError`] attributed to the extension and phase. Nothing unwinds past
//! this function. The barrier keeps no state of its own, so concurrently
//! resolving fields can call it independently.
//!
//! # Panic output
//!
//! Recovering a panic does not silence it. The process panic hook still
//! runs first, so with the default hook every recovered fault also prints a
//! `thread '..' panicked at ..` line to stderr. The fault is already logged
//! through `tracing` at `WARN`, so hosts that want quiet stderr can install
//! their own hook:
//!
//! ```
//! use periscope_engine::hooks::{Phase, invoke};
//!
//! let default_hook = std::panic::take_hook();
//! std::panic::set_hook(Box::new(|_| {}));
//!
//! let err = invoke("noisy", Phase::Init, || -> u32 { panic!("quietly") }).unwrap_err();
//! assert_eq!(err.to_string(), "noisy.Init: quietly");
//!
//! std::panic::set_hook(default_hook);
//! ```

use core::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use periscope_query::BoxError;

use super::Phase;
use crate::error::PhaseError;

/// Runs `hook` under a fault barrier.
///
/// # Errors
///
/// Returns a [`PhaseError`] carrying the panic message if `hook` panics.
///
/// # Example
///
/// ```
/// use periscope_engine::hooks::{Phase, invoke};
///
/// assert_eq!(invoke("ok", Phase::Init, || 7).unwrap(), 7);
///
/// let err = invoke("broken", Phase::GetResult, || -> u32 { panic!("test error") }).unwrap_err();
/// assert_eq!(err.to_string(), "broken.GetResult: test error");
/// ```
pub fn invoke<T>(extension: &str, phase: Phase, hook: impl FnOnce() -> T) -> Result<T, PhaseError> {
    catch_unwind(AssertUnwindSafe(hook)).map_err(|payload| {
        let cause = panic_message(payload.as_ref());
        tracing::warn!(
            extension,
            phase = phase.label(),
            cause = %cause,
            "recovered fault in extension hook"
        );
        PhaseError::new(extension, phase, cause)
    })
}

/// Extracts a readable message from a panic payload.
///
/// Understands `&str` and `String` payloads from `panic!` as well as boxed
/// errors raised with [`std::panic::panic_any`].
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(err) = payload.downcast_ref::<BoxError>() {
        err.to_string()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_return_flows_through() {
        assert_eq!(invoke("ext", Phase::Init, || "value"), Ok("value"));
    }

    #[test]
    fn string_panics_are_attributed() {
        let err = invoke::<()>("ext", Phase::ParseDidStart, || {
            panic!("{} error", "formatted");
        })
        .unwrap_err();
        assert_eq!(err.extension.as_ref(), "ext");
        assert_eq!(err.phase, Phase::ParseDidStart);
        assert_eq!(err.cause, "formatted error");
    }

    #[test]
    fn boxed_error_panics_keep_their_message() {
        let err = invoke::<()>("ext", Phase::ExecutionFinishFunc, || {
            let boxed: BoxError = "test error".into();
            std::panic::panic_any(boxed);
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "ext.ExecutionFinishFunc: test error");
    }

    #[test]
    fn unknown_payloads_get_a_placeholder() {
        let err = invoke::<()>("ext", Phase::GetResult, || {
            std::panic::panic_any(42_u8);
        })
        .unwrap_err();
        assert_eq!(err.cause, "unknown panic payload");
    }
}
