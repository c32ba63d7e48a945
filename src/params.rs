//! Solver selection and training parameters
//!
//! A [`Parameters`] value is a plain description of a training run. It
//! is translated to a transient native struct only for the duration of
//! a single training or cross-validation call; the [`NativeParameter`]
//! guard releases the struct and its weight arrays on every exit path.

use std::ffi::CStr;
use std::os::raw::{c_double, c_int};
use std::ptr::NonNull;

use crate::core::{LinearError, Result};
use crate::ffi;
use crate::ffi::alloc::{self, CArray};

// Names of the native solvers, indexed by solver code. Used by the
// model text format; the gaps at codes 8..=10 are unassigned.
const SOLVER_NAMES: [&str; 14] = [
    "L2R_LR",
    "L2R_L2LOSS_SVC_DUAL",
    "L2R_L2LOSS_SVC",
    "L2R_L1LOSS_SVC_DUAL",
    "MCSVM_CS",
    "L1R_L2LOSS_SVC",
    "L1R_LR",
    "L2R_LR_DUAL",
    "",
    "",
    "",
    "L2R_L2LOSS_SVR",
    "L2R_L2LOSS_SVR_DUAL",
    "L2R_L1LOSS_SVR_DUAL",
];

pub(crate) fn solver_name(code: c_int) -> Option<&'static str> {
    match SOLVER_NAMES.get(code as usize) {
        Some(&"") | None => None,
        Some(&name) => Some(name),
    }
}

pub(crate) fn solver_code(name: &str) -> Option<c_int> {
    SOLVER_NAMES
        .iter()
        .position(|&n| !n.is_empty() && n == name)
        .map(|idx| idx as c_int)
}

/// One of the native optimization objectives, together with its
/// convergence tolerance (epsilon).
///
/// Each solver has an explicit-epsilon constructor and a `_default`
/// form with the recommended tolerance for that objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverType {
    pub(crate) code: c_int,
    pub(crate) epsilon: f64,
}

impl SolverType {
    /// L2-regularized logistic regression (primal).
    pub fn l2r_logistic_regression(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_LR,
            epsilon,
        }
    }

    /// L2-regularized logistic regression (primal), epsilon = 0.01.
    pub fn l2r_logistic_regression_default() -> Self {
        Self::l2r_logistic_regression(0.01)
    }

    /// L2-regularized L2-loss support vector classification (dual).
    pub fn l2r_l2loss_svc_dual(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_L2LOSS_SVC_DUAL,
            epsilon,
        }
    }

    /// L2-regularized L2-loss support vector classification (dual),
    /// epsilon = 0.1.
    pub fn l2r_l2loss_svc_dual_default() -> Self {
        Self::l2r_l2loss_svc_dual(0.1)
    }

    /// L2-regularized L2-loss support vector classification (primal).
    pub fn l2r_l2loss_svc_primal(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_L2LOSS_SVC,
            epsilon,
        }
    }

    /// L2-regularized L2-loss support vector classification (primal),
    /// epsilon = 0.01.
    pub fn l2r_l2loss_svc_primal_default() -> Self {
        Self::l2r_l2loss_svc_primal(0.01)
    }

    /// L2-regularized L1-loss support vector classification (dual).
    pub fn l2r_l1loss_svc_dual(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_L1LOSS_SVC_DUAL,
            epsilon,
        }
    }

    /// L2-regularized L1-loss support vector classification (dual),
    /// epsilon = 0.1.
    pub fn l2r_l1loss_svc_dual_default() -> Self {
        Self::l2r_l1loss_svc_dual(0.1)
    }

    /// Multi-class support vector classification by Crammer and Singer.
    pub fn mcsvm_cs(epsilon: f64) -> Self {
        Self {
            code: ffi::MCSVM_CS,
            epsilon,
        }
    }

    /// Multi-class support vector classification by Crammer and Singer,
    /// epsilon = 0.1.
    pub fn mcsvm_cs_default() -> Self {
        Self::mcsvm_cs(0.1)
    }

    /// L1-regularized L2-loss support vector classification.
    pub fn l1r_l2loss_svc(epsilon: f64) -> Self {
        Self {
            code: ffi::L1R_L2LOSS_SVC,
            epsilon,
        }
    }

    /// L1-regularized L2-loss support vector classification,
    /// epsilon = 0.01.
    pub fn l1r_l2loss_svc_default() -> Self {
        Self::l1r_l2loss_svc(0.01)
    }

    /// L1-regularized logistic regression.
    pub fn l1r_logistic_regression(epsilon: f64) -> Self {
        Self {
            code: ffi::L1R_LR,
            epsilon,
        }
    }

    /// L1-regularized logistic regression, epsilon = 0.01.
    pub fn l1r_logistic_regression_default() -> Self {
        Self::l1r_logistic_regression(0.01)
    }

    /// L2-regularized logistic regression (dual).
    pub fn l2r_logistic_regression_dual(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_LR_DUAL,
            epsilon,
        }
    }

    /// L2-regularized logistic regression (dual), epsilon = 0.1.
    pub fn l2r_logistic_regression_dual_default() -> Self {
        Self::l2r_logistic_regression_dual(0.1)
    }

    /// L2-regularized L2-loss support vector regression (primal).
    pub fn l2r_l2loss_svr(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_L2LOSS_SVR,
            epsilon,
        }
    }

    /// L2-regularized L2-loss support vector regression (primal),
    /// epsilon = 0.001.
    pub fn l2r_l2loss_svr_default() -> Self {
        Self::l2r_l2loss_svr(0.001)
    }

    /// L2-regularized L2-loss support vector regression (dual).
    pub fn l2r_l2loss_svr_dual(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_L2LOSS_SVR_DUAL,
            epsilon,
        }
    }

    /// L2-regularized L2-loss support vector regression (dual),
    /// epsilon = 0.1.
    pub fn l2r_l2loss_svr_dual_default() -> Self {
        Self::l2r_l2loss_svr_dual(0.1)
    }

    /// L2-regularized L1-loss support vector regression (dual).
    pub fn l2r_l1loss_svr_dual(epsilon: f64) -> Self {
        Self {
            code: ffi::L2R_L1LOSS_SVR_DUAL,
            epsilon,
        }
    }

    /// L2-regularized L1-loss support vector regression (dual),
    /// epsilon = 0.1.
    pub fn l2r_l1loss_svr_dual_default() -> Self {
        Self::l2r_l1loss_svr_dual(0.1)
    }
}

/// Scales the constraint violation cost of one class label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassWeight {
    pub label: i32,
    pub value: f64,
}

/// Parameters for training a linear model.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// The type of solver.
    pub solver_type: SolverType,
    /// The cost of constraints violation.
    pub cost: f64,
    /// The relative penalty for each class.
    pub rel_costs: Vec<ClassWeight>,
    /// The number of threads to use if the native library is built with
    /// OpenMP support (`multicore` feature). 0 uses all cores; without
    /// the feature the hint is ignored.
    pub n_threads: i32,
}

impl Default for Parameters {
    /// Reasonable defaults: L2-regularized L2-loss support vector
    /// classification (dual) with a constraint violation cost of 1.
    fn default() -> Self {
        Self {
            solver_type: SolverType::l2r_l2loss_svc_dual_default(),
            cost: 1.0,
            rel_costs: Vec::new(),
            n_threads: 0,
        }
    }
}

/// A transient native parameter struct, scoped to one training or
/// cross-validation call. Dropping it runs the native `destroy_param`
/// (which releases the weight arrays) and frees the struct itself.
pub(crate) struct NativeParameter {
    ptr: NonNull<ffi::parameter>,
}

impl NativeParameter {
    pub(crate) fn as_ptr(&self) -> *const ffi::parameter {
        self.ptr.as_ptr()
    }
}

impl Drop for NativeParameter {
    fn drop(&mut self) {
        unsafe {
            ffi::destroy_param(self.ptr.as_ptr());
            libc::free(self.ptr.as_ptr().cast());
        }
    }
}

/// Build the transient native struct for `params`.
pub(crate) fn to_native(params: &Parameters) -> NativeParameter {
    let ptr = alloc::new_parameter();
    let param = unsafe { &mut *ptr.as_ptr() };

    param.solver_type = params.solver_type.code;
    param.eps = params.solver_type.epsilon;
    param.C = params.cost;

    // Copy relative costs into the parallel native arrays.
    if !params.rel_costs.is_empty() {
        let n = params.rel_costs.len();
        let mut labels = CArray::<c_int>::new_zeroed(n, "class weight labels");
        let mut weights = CArray::<c_double>::new_zeroed(n, "class weights");
        for (idx, weight) in params.rel_costs.iter().enumerate() {
            labels.set(idx, weight.label);
            weights.set(idx, weight.value);
        }
        param.nr_weight = n as c_int;
        param.weight_label = labels.into_raw();
        param.weight = weights.into_raw();
    }

    #[cfg(feature = "multicore")]
    {
        param.nr_thread = resolve_thread_hint(params.n_threads);
    }

    NativeParameter { ptr }
}

#[cfg(feature = "multicore")]
fn resolve_thread_hint(hint: i32) -> c_int {
    if hint <= 0 {
        std::thread::available_parallelism()
            .map(|n| n.get() as c_int)
            .unwrap_or(1)
    } else {
        hint
    }
}

/// Ask the native library whether `param` is valid for the given
/// problem; the native diagnostic becomes a [`LinearError::Parameter`].
pub(crate) fn check_parameters(
    problem: *const ffi::problem,
    param: &NativeParameter,
) -> Result<()> {
    let message = unsafe { ffi::check_parameter(problem, param.as_ptr()) };
    if message.is_null() {
        Ok(())
    } else {
        let message = unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned();
        Err(LinearError::Parameter(message))
    }
}
