//! Trained models: prediction and weight extraction
//!
//! A [`Model`] exclusively owns its native handle and holds a shared
//! reference to the guts of the problem it was trained from, so the
//! problem's native buffers outlive the model. Models loaded from a
//! file carry no problem reference.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::os::raw::c_int;
use std::path::Path;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::core::{FeatureVector, LinearError, Result};
use crate::ffi;
use crate::ffi::alloc::{self, CArray};
use crate::params::{self, Parameters};
use crate::persistence;
use crate::problem::{nodes_from_features, Problem, ProblemGuts};

/// A trained classifier or regressor.
#[derive(Debug)]
pub struct Model {
    native: NonNull<ffi::model>,
    // Keep the problem's native buffers alive; the native training call
    // may retain references into them.
    problem: Option<Rc<ProblemGuts>>,
    // Querying the native label list is costly relative to a copy, so
    // it is computed once and cached.
    label_cache: RefCell<Option<Vec<i32>>>,
}

impl Model {
    /// Train a model using the given parameters and problem.
    ///
    /// The parameters are first validated by the native library; a
    /// rejection surfaces the native diagnostic as
    /// [`LinearError::Parameter`].
    pub fn train(params: &Parameters, problem: &Problem) -> Result<Model> {
        ffi::route_native_output();

        let native_params = params::to_native(params);
        params::check_parameters(problem.guts.as_ptr(), &native_params)?;

        let handle = unsafe { ffi::train(problem.guts.as_ptr(), native_params.as_ptr()) };
        let native = match NonNull::new(handle) {
            Some(native) => native,
            None => alloc::fatal("trained model handle"),
        };

        Ok(Model {
            native,
            problem: Some(Rc::clone(&problem.guts)),
            label_cache: RefCell::new(None),
        })
    }

    /// Load a previously saved model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Model> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a model from a stream of model text.
    pub fn read<R: BufRead>(reader: R) -> Result<Model> {
        persistence::read_model(reader)
    }

    /// Save the model to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        persistence::write_model(self, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the model as model text to a writer.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        persistence::write_model(self, writer)
    }

    /// Predict the label of an instance.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let nodes = nodes_from_features(features)?;
        Ok(unsafe { ffi::predict(self.native.as_ptr(), nodes.as_ptr()) })
    }

    /// Predict the label of an instance, returning the label together
    /// with a map from class label to probability.
    ///
    /// Probability estimates are only produced by the logistic
    /// regression solvers; for any other solver the native library
    /// reports a zero probability for every class instead of an error,
    /// and that behavior is passed through unchanged.
    pub fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<(f64, HashMap<i32, f64>)> {
        let (label, probabilities) = self.predict_probability_slice(features)?;
        let map = self.labels().into_iter().zip(probabilities).collect();
        Ok((label, map))
    }

    /// Like [`Model::predict_probability`], but the probabilities come
    /// back as a slice ordered like [`Model::labels`], without the
    /// overhead of building a map.
    pub fn predict_probability_slice(&self, features: &FeatureVector) -> Result<(f64, Vec<f64>)> {
        let nodes = nodes_from_features(features)?;
        let mut estimates = CArray::<f64>::new_zeroed(self.labels().len(), "probability buffer");
        let label = unsafe {
            ffi::predict_probability(self.native.as_ptr(), nodes.as_ptr(), estimates.as_mut_ptr())
        };
        Ok((label, estimates.to_vec()))
    }

    /// Predict the label of an instance, returning the label together
    /// with a map from class label to decision value.
    pub fn predict_decision_values(
        &self,
        features: &FeatureVector,
    ) -> Result<(f64, HashMap<i32, f64>)> {
        let (label, values) = self.predict_decision_values_slice(features)?;
        let map = self.labels().into_iter().zip(values).collect();
        Ok((label, map))
    }

    /// Like [`Model::predict_decision_values`], but the decision values
    /// come back as a slice ordered like [`Model::labels`].
    pub fn predict_decision_values_slice(
        &self,
        features: &FeatureVector,
    ) -> Result<(f64, Vec<f64>)> {
        let nodes = nodes_from_features(features)?;
        let mut values = CArray::<f64>::new_zeroed(self.labels().len(), "decision value buffer");
        let label = unsafe {
            ffi::predict_values(self.native.as_ptr(), nodes.as_ptr(), values.as_mut_ptr())
        };
        Ok((label, values.to_vec()))
    }

    /// The class labels, in native storage order.
    pub fn labels(&self) -> Vec<i32> {
        if let Some(labels) = self.label_cache.borrow().as_ref() {
            return labels.clone();
        }

        let n_classes = unsafe { ffi::get_nr_class(self.native.as_ptr()) };
        let mut native_labels = CArray::<c_int>::new_zeroed(n_classes as usize, "label array");
        unsafe {
            ffi::get_labels(self.native.as_ptr(), native_labels.as_mut_ptr());
        }

        let labels = native_labels.to_vec();
        *self.label_cache.borrow_mut() = Some(labels.clone());
        labels
    }

    /// The number of classes.
    pub fn n_classes(&self) -> usize {
        unsafe { ffi::get_nr_class(self.native.as_ptr()) as usize }
    }

    /// The number of features, not counting the bias term.
    pub fn n_features(&self) -> usize {
        unsafe { self.native.as_ref() }.nr_feature as usize
    }

    /// Extract the weight vector of a two-class model.
    ///
    /// Fails with [`LinearError::UnsupportedOperation`] for any other
    /// class count; multi-class weight extraction is not implemented.
    pub fn weights(&self) -> Result<Vec<f64>> {
        let model = self.require_two_classes("weight extraction")?;
        let n = model.nr_feature as usize;
        let mut weights = Vec::with_capacity(n);
        for idx in 0..n {
            weights.push(unsafe { *model.w.add(idx) });
        }
        Ok(weights)
    }

    /// Extract the bias of a two-class model: the weight of the
    /// implicit bias feature, or 0 when no bias term was trained.
    pub fn bias(&self) -> Result<f64> {
        let model = self.require_two_classes("bias extraction")?;
        if model.bias < 0.0 {
            return Ok(0.0);
        }
        // nr_feature does not count the bias row.
        Ok(unsafe { *model.w.add(model.nr_feature as usize) })
    }

    fn require_two_classes(&self, what: &str) -> Result<&ffi::model> {
        let model = unsafe { self.native.as_ref() };
        if model.nr_class != 2 {
            return Err(LinearError::UnsupportedOperation(format!(
                "{what} requires exactly two classes, model has {}",
                model.nr_class
            )));
        }
        Ok(model)
    }

    pub(crate) fn native(&self) -> &ffi::model {
        unsafe { self.native.as_ref() }
    }

    /// Wrap a native handle assembled by the codec; such models have no
    /// associated problem.
    pub(crate) fn from_native(native: NonNull<ffi::model>) -> Model {
        Model {
            native,
            problem: None,
            label_cache: RefCell::new(None),
        }
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        let mut handle = self.native.as_ptr();
        unsafe {
            ffi::free_and_destroy_model(&mut handle);
        }
        // The problem guts release themselves once the last holder is
        // gone.
        drop(self.problem.take());
    }
}
