//! Call-scoped host allocations.
//!
//! Every handle a call obtains from the host goes into one `ResourceList`,
//! and the list hands each of them back through `FetchPrimitive::release`
//! exactly once: on `free`, or on drop if `free` was never reached.

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crate::primitive::{FetchPrimitive, Handle};

pub(crate) struct ResourceList<'a> {
    primitive: &'a dyn FetchPrimitive,
    handles: Vec<Handle>,
}

impl<'a> ResourceList<'a> {
    pub(crate) fn new(primitive: &'a dyn FetchPrimitive) -> Self {
        Self {
            primitive,
            handles: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, handle: Handle) {
        tracing::trace!(%handle, "tracking host resource");
        self.handles.push(handle);
    }

    /// Release everything tracked so far, in allocation order.
    ///
    /// A panic in one release does not skip the others; the first panic
    /// payload is returned once the list is empty.
    pub(crate) fn free(&mut self) -> thread::Result<()> {
        let primitive = self.primitive;
        let mut first_panic = None;
        for handle in self.handles.drain(..) {
            tracing::trace!(%handle, "releasing host resource");
            let released = panic::catch_unwind(AssertUnwindSafe(|| primitive.release(handle)));
            if let Err(payload) = released {
                tracing::warn!(%handle, "host release panicked");
                first_panic.get_or_insert(payload);
            }
        }
        first_panic.map_or(Ok(()), Err)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for ResourceList<'_> {
    fn drop(&mut self) {
        // Already logged; a drop must not panic.
        let _ = self.free();
    }
}
