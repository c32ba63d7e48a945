//! Retrying allocation wrapper for native buffers
//!
//! Every allocation whose ownership crosses the foreign boundary goes
//! through this module, so the native library's `free` stays paired with
//! the same allocator. A failed allocation is retried once; a second
//! failure is unrecoverable and aborts the process, since continuing
//! with a null native handle would corrupt native state.

use std::mem;
use std::process;
use std::ptr::{self, NonNull};

use libc::{c_void, free, malloc, realloc};

use crate::ffi;

/// Abort after a repeated native allocation failure.
pub(crate) fn fatal(what: &str) -> ! {
    log::error!("native allocation for {what} failed twice, aborting");
    process::abort();
}

/// Allocate `size` bytes (`size` > 0), retrying once before giving up.
fn try_alloc(size: usize, what: &str) -> NonNull<c_void> {
    debug_assert!(size > 0);
    if let Some(p) = NonNull::new(unsafe { malloc(size) }) {
        return p;
    }
    log::warn!("native allocation of {size} bytes for {what} failed, retrying");
    match NonNull::new(unsafe { malloc(size) }) {
        Some(p) => p,
        None => fatal(what),
    }
}

/// Resize `old` (which may be null) to hold `len` elements of `T`, under
/// the same retry-then-abort policy. The previous contents are preserved.
pub(crate) unsafe fn grow_array<T>(old: *mut T, len: usize, what: &str) -> NonNull<T> {
    let size = len * mem::size_of::<T>();
    if let Some(p) = NonNull::new(realloc(old.cast(), size)) {
        return p.cast();
    }
    log::warn!("native reallocation of {size} bytes for {what} failed, retrying");
    match NonNull::new(realloc(old.cast(), size)) {
        Some(p) => p.cast(),
        None => fatal(what),
    }
}

/// Allocate a node buffer with room for `n` entries plus the sentinel.
pub(crate) fn new_nodes(n: usize) -> NonNull<ffi::feature_node> {
    let size = (n + 1) * mem::size_of::<ffi::feature_node>();
    let nodes = try_alloc(size, "feature nodes").cast::<ffi::feature_node>();
    // Terminator
    unsafe {
        let end = nodes.as_ptr().add(n);
        (*end).index = ffi::SENTINEL_INDEX;
        (*end).value = 0.0;
    }
    nodes
}

/// Allocate an empty aggregate problem struct. The label and instance
/// arrays start out null and grow on the first `add`.
pub(crate) fn new_problem() -> NonNull<ffi::problem> {
    let problem = try_alloc(mem::size_of::<ffi::problem>(), "problem struct").cast::<ffi::problem>();
    unsafe {
        problem.as_ptr().write(ffi::problem {
            l: 0,
            n: 0,
            y: ptr::null_mut(),
            x: ptr::null_mut(),
            bias: -1.0,
        });
    }
    problem
}

/// Allocate a zeroed parameter struct.
pub(crate) fn new_parameter() -> NonNull<ffi::parameter> {
    let param = try_alloc(mem::size_of::<ffi::parameter>(), "parameter struct")
        .cast::<ffi::parameter>();
    unsafe {
        ptr::write_bytes(param.as_ptr(), 0, 1);
    }
    param
}

/// Allocate a zeroed model struct.
pub(crate) fn new_model() -> NonNull<ffi::model> {
    let model = try_alloc(mem::size_of::<ffi::model>(), "model struct").cast::<ffi::model>();
    unsafe {
        ptr::write_bytes(model.as_ptr(), 0, 1);
    }
    model
}

/// An owned, zero-initialized native array, released on drop unless
/// ownership is transferred with [`CArray::into_raw`].
///
/// Length zero skips the allocator entirely: a zero-size `malloc` may
/// legally return null, which must not trip the abort path.
pub(crate) struct CArray<T> {
    ptr: NonNull<T>,
    len: usize,
}

impl<T: Copy> CArray<T> {
    pub(crate) fn new_zeroed(len: usize, what: &str) -> Self {
        if len == 0 {
            return Self {
                ptr: NonNull::dangling(),
                len,
            };
        }
        let ptr = try_alloc(len * mem::size_of::<T>(), what).cast::<T>();
        unsafe {
            ptr::write_bytes(ptr.as_ptr(), 0, len);
        }
        Self { ptr, len }
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub(crate) fn set(&mut self, index: usize, value: T) {
        assert!(index < self.len);
        unsafe {
            *self.ptr.as_ptr().add(index) = value;
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<T> {
        if self.len == 0 {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }.to_vec()
    }

    /// Release ownership; the caller (or the native library) becomes
    /// responsible for freeing the buffer. Empty arrays yield null.
    pub(crate) fn into_raw(self) -> *mut T {
        let ptr = if self.len == 0 {
            ptr::null_mut()
        } else {
            self.ptr.as_ptr()
        };
        mem::forget(self);
        ptr
    }
}

impl<T> Drop for CArray<T> {
    fn drop(&mut self) {
        if self.len > 0 {
            unsafe {
                free(self.ptr.as_ptr().cast());
            }
        }
    }
}
