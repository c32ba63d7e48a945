//! Raw bindings to the native liblinear library
//!
//! Hand-declared mirror of `linear.h` (liblinear >= 2.0): the structs
//! crossing the foreign boundary, the solver codes and the entry points
//! consumed by the safe layer. Everything here is unsafe to use directly;
//! the rest of the crate wraps these in owning types. Note that the
//! native save/load routines are not bound: model persistence is
//! implemented in [`crate::persistence`] instead.

#![allow(non_camel_case_types, non_snake_case)]

use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int};
use std::sync::Once;

pub(crate) mod alloc;

/// End-of-vector marker the native layer expects after the last entry
/// of every sparse vector.
pub const SENTINEL_INDEX: c_int = -1;

// Solver codes of the native `solver_type` enum. The gaps at 8..=10 are
// unassigned in the native library.
pub const L2R_LR: c_int = 0;
pub const L2R_L2LOSS_SVC_DUAL: c_int = 1;
pub const L2R_L2LOSS_SVC: c_int = 2;
pub const L2R_L1LOSS_SVC_DUAL: c_int = 3;
pub const MCSVM_CS: c_int = 4;
pub const L1R_L2LOSS_SVC: c_int = 5;
pub const L1R_LR: c_int = 6;
pub const L2R_LR_DUAL: c_int = 7;
pub const L2R_L2LOSS_SVR: c_int = 11;
pub const L2R_L2LOSS_SVR_DUAL: c_int = 12;
pub const L2R_L1LOSS_SVR_DUAL: c_int = 13;

/// One entry of a sentinel-terminated sparse vector.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct feature_node {
    pub index: c_int,
    pub value: c_double,
}

/// The aggregate training-set struct: `l` instances over `n` features,
/// with parallel label (`y`) and instance (`x`) arrays.
#[repr(C)]
pub struct problem {
    pub l: c_int,
    pub n: c_int,
    pub y: *mut c_double,
    pub x: *mut *mut feature_node,
    pub bias: c_double,
}

/// Solver configuration passed to training and cross-validation.
///
/// `nr_thread` exists only in the OpenMP-enabled fork of the native
/// library; the field is compiled in under the `multicore` feature.
#[repr(C)]
pub struct parameter {
    pub solver_type: c_int,
    pub eps: c_double,
    pub C: c_double,
    pub nr_weight: c_int,
    pub weight_label: *mut c_int,
    pub weight: *mut c_double,
    pub p: c_double,
    pub init_sol: *mut c_double,
    #[cfg(feature = "multicore")]
    pub nr_thread: c_int,
}

/// A trained model as laid out by the native library.
#[repr(C)]
pub struct model {
    pub param: parameter,
    pub nr_class: c_int,
    pub nr_feature: c_int,
    pub w: *mut c_double,
    pub label: *mut c_int,
    pub bias: c_double,
}

extern "C" {
    pub fn train(prob: *const problem, param: *const parameter) -> *mut model;
    pub fn cross_validation(
        prob: *const problem,
        param: *const parameter,
        nr_fold: c_int,
        target: *mut c_double,
    );
    pub fn predict(model_: *const model, x: *const feature_node) -> c_double;
    pub fn predict_values(
        model_: *const model,
        x: *const feature_node,
        dec_values: *mut c_double,
    ) -> c_double;
    pub fn predict_probability(
        model_: *const model,
        x: *const feature_node,
        prob_estimates: *mut c_double,
    ) -> c_double;
    pub fn get_nr_class(model_: *const model) -> c_int;
    pub fn get_labels(model_: *const model, label: *mut c_int);
    pub fn check_parameter(prob: *const problem, param: *const parameter) -> *const c_char;
    pub fn destroy_param(param: *mut parameter);
    pub fn free_and_destroy_model(model_ptr_ptr: *mut *mut model);
    pub fn set_print_string_function(print_func: Option<unsafe extern "C" fn(*const c_char)>);
}

/// Forward the native library's training output to the `log` facade.
///
/// Installed once per process; training and cross-validation call this
/// before entering the native library.
pub(crate) fn route_native_output() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| unsafe {
        set_print_string_function(Some(print_to_log));
    });
}

unsafe extern "C" fn print_to_log(message: *const c_char) {
    if message.is_null() {
        return;
    }
    let message = CStr::from_ptr(message).to_string_lossy();
    let message = message.trim_end();
    if !message.is_empty() {
        log::debug!(target: "liblinear", "{message}");
    }
}
