//! Training problems: owned collections of native training instances
//!
//! A [`Problem`] owns one sentinel-terminated native sparse-vector
//! buffer per added instance plus the aggregate struct referencing all
//! of them. Models trained from a problem share its guts, so the native
//! buffers stay valid for as long as the longest-lived holder, be that
//! the problem value itself or any model trained from it.

use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::core::{
    sorted_feature_vector, verify_feature_indices, FeatureValue, FeatureVector, Result,
    TrainingInstance,
};
use crate::ffi;
use crate::ffi::alloc;

/// A set of training instances and corresponding labels.
pub struct Problem {
    pub(crate) guts: Rc<ProblemGuts>,
}

/// Shared owner of the native buffers: the aggregate struct and the
/// per-instance node buffers. Kept alive by the problem and by every
/// model trained from it.
#[derive(Debug)]
pub(crate) struct ProblemGuts {
    native: NonNull<ffi::problem>,
    nodes: RefCell<Vec<NonNull<ffi::feature_node>>>,
}

impl ProblemGuts {
    pub(crate) fn as_ptr(&self) -> *const ffi::problem {
        self.native.as_ptr()
    }

    /// Append one instance: take ownership of its node buffer and grow
    /// the aggregate label and instance arrays.
    fn push(&self, nodes: NativeNodes, label: f64) {
        let problem = unsafe { &mut *self.native.as_ptr() };
        let len = problem.l as usize + 1;

        // The number of features equals the highest feature index.
        unsafe {
            let mut node = nodes.as_ptr();
            while (*node).index != ffi::SENTINEL_INDEX {
                if (*node).index > problem.n {
                    problem.n = (*node).index;
                }
                node = node.add(1);
            }
        }

        unsafe {
            problem.y = alloc::grow_array(problem.y, len, "label array").as_ptr();
            *problem.y.add(len - 1) = label;
            problem.x = alloc::grow_array(problem.x, len, "instance array").as_ptr();
            let raw = nodes.into_raw();
            *problem.x.add(len - 1) = raw.as_ptr();
            self.nodes.borrow_mut().push(raw);
        }
        problem.l = len as std::os::raw::c_int;
    }
}

impl Drop for ProblemGuts {
    fn drop(&mut self) {
        unsafe {
            for nodes in self.nodes.borrow_mut().drain(..) {
                libc::free(nodes.as_ptr().cast());
            }
            let problem = self.native.as_ptr();
            libc::free((*problem).x.cast());
            libc::free((*problem).y.cast());
            libc::free(problem.cast());
        }
    }
}

impl Problem {
    /// Construct a new, empty problem. The bias starts out at -1 (no
    /// bias term).
    pub fn new() -> Self {
        Self {
            guts: Rc::new(ProblemGuts {
                native: alloc::new_problem(),
                nodes: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Add a training instance.
    ///
    /// The feature indices are validated and the features copied into a
    /// sorted, sentinel-terminated native buffer. On a validation
    /// failure nothing is allocated and the problem is unchanged.
    pub fn add(&mut self, instance: &TrainingInstance) -> Result<()> {
        let nodes = nodes_from_features(&instance.features)?;
        self.guts.push(nodes, instance.label);
        Ok(())
    }

    /// The number of training instances.
    pub fn len(&self) -> usize {
        unsafe { (*self.guts.as_ptr()).l as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bias term.
    pub fn bias(&self) -> f64 {
        unsafe { (*self.guts.as_ptr()).bias }
    }

    /// Set the bias term. A non-negative bias amounts to appending an
    /// extra feature with that constant value to every instance at
    /// train and predict time; the stored feature vectors are not
    /// changed.
    pub fn set_bias(&mut self, bias: f64) {
        unsafe {
            (*self.guts.native.as_ptr()).bias = bias;
        }
    }

    /// Iterate over the stored instances in insertion order, reading
    /// them back from the native buffers. Iteration stops as soon as
    /// the visitor returns `false`. Safe to call again after adding
    /// more instances; each call reflects the contents at that time.
    pub fn iterate<F>(&self, mut visitor: F)
    where
        F: FnMut(&TrainingInstance) -> bool,
    {
        let problem = unsafe { &*self.guts.as_ptr() };
        for idx in 0..problem.l as usize {
            let instance = unsafe {
                let label = *problem.y.add(idx);
                let mut node = *problem.x.add(idx) as *const ffi::feature_node;
                let mut features = FeatureVector::new();
                while (*node).index != ffi::SENTINEL_INDEX {
                    features.push(FeatureValue::new((*node).index, (*node).value));
                    node = node.add(1);
                }
                TrainingInstance::new(label, features)
            };
            if !visitor(&instance) {
                break;
            }
        }
    }
}

impl Default for Problem {
    fn default() -> Self {
        Self::new()
    }
}

/// An owned, sentinel-terminated native node buffer; freed on drop
/// unless ownership moves into a problem via `into_raw`.
pub(crate) struct NativeNodes {
    ptr: NonNull<ffi::feature_node>,
}

impl NativeNodes {
    pub(crate) fn as_ptr(&self) -> *const ffi::feature_node {
        self.ptr.as_ptr()
    }

    fn into_raw(self) -> NonNull<ffi::feature_node> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }
}

impl Drop for NativeNodes {
    fn drop(&mut self) {
        unsafe {
            libc::free(self.ptr.as_ptr().cast());
        }
    }
}

/// Validate `features`, then copy a sorted version into a freshly
/// allocated sentinel-terminated native buffer.
pub(crate) fn nodes_from_features(features: &FeatureVector) -> Result<NativeNodes> {
    verify_feature_indices(features)?;
    let sorted = sorted_feature_vector(features);

    let ptr = alloc::new_nodes(sorted.len());
    for (idx, fv) in sorted.iter().enumerate() {
        unsafe {
            let node = ptr.as_ptr().add(idx);
            (*node).index = fv.index;
            (*node).value = fv.value;
        }
    }
    Ok(NativeNodes { ptr })
}
