//! The model text format
//!
//! Reads and writes trained models in the plain-text format of the
//! native library, independently of its own dump routines, so persisted
//! models can be exchanged with any conforming implementation.
//!
//! The format is a sequence of whitespace-delimited tokens (separators
//! are spaces and newlines, runs collapsed): a header of `key value...`
//! lines in any order, terminated by the key `w`, followed by the
//! weight matrix in row-major order. Recognized header keys are
//! `solver_type`, `nr_class`, `nr_feature`, `bias` and `label` (the
//! latter only after `nr_class`). The matrix has one row per feature,
//! plus one for the bias when it is non-negative, and one column per
//! class, except that two-class models of every solver but the
//! Crammer-Singer one store a single column.

use std::io::{BufRead, Write};
use std::os::raw::{c_double, c_int};

use crate::core::{LinearError, Result};
use crate::ffi;
use crate::ffi::alloc::{self, CArray};
use crate::model::Model;
use crate::params::{solver_code, solver_name};

/// Read a model from a stream of model text.
pub fn read_model<R: BufRead>(reader: R) -> Result<Model> {
    let mut tokens = Tokenizer::new(reader);
    let header = read_header(&mut tokens)?;

    let rows = header.n_features as usize + usize::from(header.bias >= 0.0);
    let mut columns = header.n_classes as usize;
    if columns == 2 && header.solver != ffi::MCSVM_CS {
        columns = 1;
    }
    let count = rows
        .checked_mul(columns)
        .ok_or_else(|| LinearError::ModelFile("weight matrix too large".to_string()))?;

    // Row-major, the class column varying fastest.
    let mut weights = CArray::<c_double>::new_zeroed(count, "weight matrix");
    for idx in 0..count {
        weights.set(idx, tokens.expect_f64("a weight")?);
    }

    let native = alloc::new_model();
    let model = unsafe { &mut *native.as_ptr() };
    model.param.solver_type = header.solver;
    model.nr_class = header.n_classes;
    model.nr_feature = header.n_features;
    model.bias = header.bias;
    if let Some(labels) = &header.labels {
        let mut native_labels = CArray::<c_int>::new_zeroed(labels.len(), "label array");
        for (idx, &label) in labels.iter().enumerate() {
            native_labels.set(idx, label);
        }
        model.label = native_labels.into_raw();
    }
    model.w = weights.into_raw();

    Ok(Model::from_native(native))
}

/// Write a model as model text.
///
/// Field order: `solver_type`, `nr_class`, `label` (when the model has
/// a label list), `nr_feature`, `bias`, `w` and the weight matrix, each
/// real rendered with 16 significant digits.
pub fn write_model<W: Write>(model: &Model, mut writer: W) -> Result<()> {
    let native = model.native();
    let solver = solver_name(native.param.solver_type).ok_or_else(|| {
        LinearError::ModelFile(format!(
            "unknown solver code: {}",
            native.param.solver_type
        ))
    })?;

    let mut rows = native.nr_feature;
    if native.bias >= 0.0 {
        rows += 1;
    }
    let mut columns = native.nr_class;
    if columns == 2 && native.param.solver_type != ffi::MCSVM_CS {
        columns = 1;
    }

    writeln!(writer, "solver_type {solver}")?;
    writeln!(writer, "nr_class {}", native.nr_class)?;

    if !native.label.is_null() {
        write!(writer, "label")?;
        for label in model.labels() {
            write!(writer, " {label}")?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "nr_feature {}", native.nr_feature)?;
    writeln!(writer, "bias {}", format_g16(native.bias))?;

    writeln!(writer, "w")?;
    for row in 0..rows as usize {
        for column in 0..columns as usize {
            let weight = unsafe { *native.w.add(row * columns as usize + column) };
            write!(writer, "{} ", format_g16(weight))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Header fields collected so far. `finish` checks required-field
/// completeness once the `w` terminator is reached.
#[derive(Default)]
struct HeaderState {
    solver: Option<c_int>,
    n_classes: Option<i32>,
    n_features: Option<i32>,
    bias: Option<f64>,
    labels: Option<Vec<i32>>,
}

struct Header {
    solver: c_int,
    n_classes: i32,
    n_features: i32,
    bias: f64,
    labels: Option<Vec<i32>>,
}

impl HeaderState {
    fn finish(self) -> Result<Header> {
        let missing =
            |key: &str| LinearError::ModelFile(format!("missing required header field: {key}"));
        let header = Header {
            solver: self.solver.ok_or_else(|| missing("solver_type"))?,
            n_classes: self.n_classes.ok_or_else(|| missing("nr_class"))?,
            n_features: self.n_features.ok_or_else(|| missing("nr_feature"))?,
            bias: self.bias.ok_or_else(|| missing("bias"))?,
            labels: self.labels,
        };
        if header.n_classes < 1 {
            return Err(LinearError::ModelFile(format!(
                "nr_class must be at least one: {}",
                header.n_classes
            )));
        }
        if header.n_features < 0 {
            return Err(LinearError::ModelFile(format!(
                "nr_feature must not be negative: {}",
                header.n_features
            )));
        }
        Ok(header)
    }
}

fn read_header<R: BufRead>(tokens: &mut Tokenizer<R>) -> Result<Header> {
    let mut state = HeaderState::default();

    loop {
        let key = tokens.expect_token("a header key")?;
        match key.as_str() {
            "solver_type" => {
                let name = tokens.expect_token("a solver name")?;
                let code = solver_code(&name).ok_or_else(|| {
                    LinearError::ModelFile(format!("unknown solver type: {name}"))
                })?;
                state.solver = Some(code);
            }
            "nr_class" => state.n_classes = Some(tokens.expect_int("nr_class")?),
            "nr_feature" => state.n_features = Some(tokens.expect_int("nr_feature")?),
            "bias" => state.bias = Some(tokens.expect_f64("bias")?),
            "label" => {
                let n_classes = state.n_classes.ok_or_else(|| {
                    LinearError::ModelFile("label list before nr_class".to_string())
                })?;
                let mut labels = Vec::with_capacity(n_classes.max(0) as usize);
                for _ in 0..n_classes {
                    labels.push(tokens.expect_int("a class label")?);
                }
                state.labels = Some(labels);
            }
            "w" => break,
            _ => {
                return Err(LinearError::ModelFile(format!(
                    "unknown key in model file: {key}"
                )))
            }
        }
    }

    state.finish()
}

/// Splits a stream into tokens separated by runs of spaces and
/// newlines. No broader whitespace handling.
struct Tokenizer<R> {
    reader: R,
}

impl<R: BufRead> Tokenizer<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }

    /// The next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<String>> {
        let mut token = Vec::new();
        loop {
            let buffer = self.reader.fill_buf()?;
            if buffer.is_empty() {
                break;
            }
            let mut used = 0;
            let mut terminated = false;
            for &byte in buffer {
                used += 1;
                if byte == b' ' || byte == b'\n' {
                    if token.is_empty() {
                        continue;
                    }
                    terminated = true;
                    break;
                }
                token.push(byte);
            }
            self.reader.consume(used);
            if terminated {
                break;
            }
        }

        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&token).into_owned()))
        }
    }

    fn expect_token(&mut self, what: &str) -> Result<String> {
        self.next_token()?.ok_or_else(|| {
            LinearError::ModelFile(format!("unexpected end of input, expected {what}"))
        })
    }

    fn expect_int(&mut self, what: &str) -> Result<i32> {
        let token = self.expect_token(what)?;
        token.parse().map_err(|_| {
            LinearError::ModelFile(format!("expected an integer for {what}, found '{token}'"))
        })
    }

    fn expect_f64(&mut self, what: &str) -> Result<f64> {
        let token = self.expect_token(what)?;
        token.parse().map_err(|_| {
            LinearError::ModelFile(format!("expected a number for {what}, found '{token}'"))
        })
    }
}

/// Render `value` with 16 significant decimal digits, in the shortest
/// of fixed and scientific notation with trailing zeros removed, like
/// C's `"%.16g"`.
fn format_g16(value: f64) -> String {
    const SIGNIFICANT: usize = 16;

    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    // The decimal exponent, after rounding to 16 significant digits.
    let scientific = format!("{value:.precision$e}", precision = SIGNIFICANT - 1);
    let exponent: i32 = scientific[scientific.find('e').unwrap() + 1..]
        .parse()
        .unwrap();

    let rendered = if exponent >= -4 && exponent < SIGNIFICANT as i32 {
        let decimals = (SIGNIFICANT as i32 - 1 - exponent).max(0) as usize;
        format!("{value:.decimals$}")
    } else {
        scientific
    };
    trim_trailing_zeros(rendered)
}

fn trim_trailing_zeros(mut rendered: String) -> String {
    if let Some(e_pos) = rendered.find('e') {
        let exponent = rendered.split_off(e_pos);
        let mantissa = trim_trailing_zeros(rendered);
        return format!("{mantissa}{exponent}");
    }
    if rendered.contains('.') {
        rendered.truncate(rendered.trim_end_matches('0').trim_end_matches('.').len());
    }
    rendered
}
