//! Blocking bridge over a host promise.
//!
//! A continuation registered with the host owns the sending half of a
//! `tokio::sync::oneshot` channel; the calling thread parks on the receiving
//! half. This is the only place a call suspends.
//!
//! Parking is refused up front on threads that are inside a tokio runtime,
//! where `blocking_recv` would panic after the host had already been started.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tokio::runtime;
use tokio::sync::oneshot;

use crate::error::FetchError;
use crate::primitive::{FetchPrimitive, Handle, HostValue};
use crate::resource::ResourceList;

/// Register a continuation, let `start` attach it to a host promise, and
/// block until the host settles that promise.
///
/// The callback handle is tracked in `resources`; the caller releases it.
pub(crate) fn settle<F>(
    primitive: &dyn FetchPrimitive,
    resources: &mut ResourceList<'_>,
    start: F,
) -> Result<HostValue, FetchError>
where
    F: FnOnce(Handle),
{
    let (tx, rx) = oneshot::channel();
    let callback = primitive.register_callback(Box::new(move |settlement| {
        // The receiver only disappears if the waiting call already unwound.
        let _ = tx.send(settlement);
    }));
    resources.push(callback);

    start(callback);

    match rx.blocking_recv() {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(FetchError::Rejected(message)),
        Err(_) => Err(FetchError::Abandoned),
    }
}

/// Run `f` with a fresh resource list, release the list whatever happens,
/// and turn a panic inside `f` or inside a release into `FetchError::Panic`.
///
/// Fails with `FetchError::InsideRuntime` before `f` runs if the calling
/// thread cannot block.
pub(crate) fn guarded<T, F>(primitive: &dyn FetchPrimitive, f: F) -> Result<T, FetchError>
where
    F: FnOnce(&mut ResourceList<'_>) -> Result<T, FetchError>,
{
    if runtime::Handle::try_current().is_ok() {
        tracing::debug!("refusing to block inside a tokio runtime");
        return Err(FetchError::InsideRuntime);
    }
    let mut resources = ResourceList::new(primitive);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut resources)));
    let freed = resources.free();
    // A panic in `f` wins over one in a release.
    let outcome = outcome.and_then(|result| freed.map(|()| result));
    outcome.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!(%message, "panic caught at fetch boundary");
        Err(FetchError::Panic(message))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
