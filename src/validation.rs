//! Cross-validation

use std::os::raw::c_int;

use crate::core::Result;
use crate::ffi;
use crate::ffi::alloc::CArray;
use crate::params::{self, Parameters};
use crate::problem::Problem;

/// Separate the problem into `n_folds` folds and evaluate each fold
/// with a model trained on the remaining ones. Fold partitioning and
/// the per-fold training runs happen entirely inside the native
/// library; the returned predictions are indexed like the problem's
/// instances.
///
/// The parameters are validated exactly as in training; a rejection
/// surfaces the native diagnostic as a parameter error.
pub fn cross_validation(problem: &Problem, params: &Parameters, n_folds: u32) -> Result<Vec<f64>> {
    ffi::route_native_output();

    let native_params = params::to_native(params);
    params::check_parameters(problem.guts.as_ptr(), &native_params)?;

    let mut target = CArray::<f64>::new_zeroed(problem.len(), "cross-validation targets");
    unsafe {
        ffi::cross_validation(
            problem.guts.as_ptr(),
            native_params.as_ptr(),
            n_folds as c_int,
            target.as_mut_ptr(),
        );
    }

    Ok(target.to_vec())
}
