//! Sampling-parameter sweep expansion.
//!
//! A [`ParamSpec`] describes one sampling parameter as either a fixed value
//! or a closed `(min, max, increment)` range. [`ParamSpec::expand`] turns a
//! spec into its concrete value sequence, and [`build_sweep`] combines the
//! expanded axes with a set of base options into the ordered sequence of
//! option sets the runner executes.

use std::fmt;

use crate::errors::SweepConfigError;

// ---------------------------------------------------------------------------
// Option values and option sets
// ---------------------------------------------------------------------------

/// One concrete sampling-option value.
///
/// Integer and float parameters are kept distinct so that integer ranges
/// step exactly and artifact suffixes render without a spurious `.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Null,
}

impl OptionValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            OptionValue::Int(i) => serde_json::Value::from(*i),
            OptionValue::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            OptionValue::Null => serde_json::Value::Null,
        }
    }
}

/// Render a float with at least one fractional digit (`1.0`, not `1`) so
/// artifact bodies and file suffixes match the reference tool's output.
fn fmt_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(v) => write!(f, "{}", fmt_float(*v)),
            OptionValue::Null => write!(f, "None"),
        }
    }
}

/// One fully-resolved set of sampling options for a single inference call.
///
/// Entries keep insertion order; that order is the render order in result
/// artifacts. `set` on an existing key replaces the value in place, so an
/// overridden parameter keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: Vec<(String, OptionValue)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: OptionValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    /// Copy of this set with one parameter overridden.
    pub fn with(&self, name: &str, value: OptionValue) -> Self {
        let mut copy = self.clone();
        copy.set(name, value);
        copy
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, OptionValue)> {
        self.entries.iter()
    }

    /// JSON object for the backend request body. Key order is not part of
    /// the wire contract; the backend consumes the map opaquely.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.entries {
            map.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for OptionSet {
    /// Mapping literal in insertion order: `{'seed': 42, 'temperature': 0.7}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{k}': {v}")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Parameter specs and range expansion
// ---------------------------------------------------------------------------

/// Fixed-or-range values of one parameter. The fixed/range invariant is the
/// enum itself; the range variants only exist with `min <= max` and a
/// positive increment (checked by the [`ParamSpec`] constructors).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValues {
    Fixed(OptionValue),
    FloatRange { min: f64, max: f64, increment: f64 },
    IntRange { min: i64, max: i64, increment: i64 },
}

/// One sweepable sampling parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Option key sent to the backend, e.g. `temperature`.
    pub name: String,
    /// Short form used in artifact file suffixes, e.g. `temp`.
    pub label: String,
    pub values: ParamValues,
}

impl ParamSpec {
    /// Build a float parameter spec from the CLI flag family
    /// `(fixed, min, max, increment)`. Both `min` and `max` present switches
    /// the parameter into range mode; the fixed value is used otherwise.
    pub fn float(
        name: &str,
        label: &str,
        fixed: f64,
        min: Option<f64>,
        max: Option<f64>,
        increment: f64,
    ) -> Result<Self, SweepConfigError> {
        let values = match (min, max) {
            (Some(min), Some(max)) => {
                if min > max {
                    return Err(SweepConfigError::InvalidRange {
                        name: name.to_string(),
                        min: fmt_float(min),
                        max: fmt_float(max),
                    });
                }
                if increment <= 0.0 {
                    return Err(SweepConfigError::NonPositiveIncrement {
                        name: name.to_string(),
                        increment: fmt_float(increment),
                    });
                }
                ParamValues::FloatRange {
                    min,
                    max,
                    increment,
                }
            }
            (None, None) => ParamValues::Fixed(OptionValue::Float(fixed)),
            _ => {
                return Err(SweepConfigError::PartialRange {
                    name: name.to_string(),
                })
            }
        };
        Ok(Self {
            name: name.to_string(),
            label: label.to_string(),
            values,
        })
    }

    /// Integer counterpart of [`ParamSpec::float`].
    pub fn int(
        name: &str,
        label: &str,
        fixed: i64,
        min: Option<i64>,
        max: Option<i64>,
        increment: i64,
    ) -> Result<Self, SweepConfigError> {
        let values = match (min, max) {
            (Some(min), Some(max)) => {
                if min > max {
                    return Err(SweepConfigError::InvalidRange {
                        name: name.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                if increment <= 0 {
                    return Err(SweepConfigError::NonPositiveIncrement {
                        name: name.to_string(),
                        increment: increment.to_string(),
                    });
                }
                ParamValues::IntRange {
                    min,
                    max,
                    increment,
                }
            }
            (None, None) => ParamValues::Fixed(OptionValue::Int(fixed)),
            _ => {
                return Err(SweepConfigError::PartialRange {
                    name: name.to_string(),
                })
            }
        };
        Ok(Self {
            name: name.to_string(),
            label: label.to_string(),
            values,
        })
    }

    pub fn is_ranged(&self) -> bool {
        !matches!(self.values, ParamValues::Fixed(_))
    }

    /// Expand the spec into its ordered value sequence. Pure: same spec,
    /// same sequence.
    ///
    /// Float ranges are computed index-based (`min + i * increment`) and
    /// rounded to 2 decimal places, so repeated-addition drift cannot
    /// accumulate. The value count is `floor((max - min) / increment) + 1`.
    pub fn expand(&self) -> Vec<OptionValue> {
        match &self.values {
            ParamValues::Fixed(v) => vec![v.clone()],
            ParamValues::FloatRange {
                min,
                max,
                increment,
            } => {
                let steps = ((max - min) / increment).floor() as i64;
                (0..=steps)
                    .map(|i| OptionValue::Float(round2(min + i as f64 * increment)))
                    .collect()
            }
            ParamValues::IntRange {
                min,
                max,
                increment,
            } => {
                let mut values = Vec::new();
                let mut v = *min;
                while v <= *max {
                    values.push(OptionValue::Int(v));
                    v += increment;
                }
                values
            }
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Sweep building
// ---------------------------------------------------------------------------

/// How multiple swept parameters combine into option sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStrategy {
    /// One axis at a time: every emitted set differs from the base options
    /// in at most one key. A temperature sweep and a top-k sweep run as two
    /// separate batches against the same prompt.
    Independent,
    /// Full cross-product, first axis outermost.
    Cartesian,
}

/// One swept parameter with its values already expanded.
#[derive(Debug, Clone)]
pub struct SweptAxis {
    pub name: String,
    pub label: String,
    pub values: Vec<OptionValue>,
}

impl SweptAxis {
    pub fn from_spec(spec: &ParamSpec) -> Self {
        Self {
            name: spec.name.clone(),
            label: spec.label.clone(),
            values: spec.expand(),
        }
    }
}

/// One entry in the sweep sequence: the resolved options plus, under the
/// independent strategy, the axis that was varied (used for value-bearing
/// artifact suffixes). Cartesian points carry no axis; the ordinal index
/// disambiguates them.
#[derive(Debug, Clone)]
pub struct SweepPoint {
    pub options: OptionSet,
    pub axis: Option<(String, OptionValue)>,
}

/// Combine expanded axes with the base options into the ordered sweep
/// sequence. Deterministic: identical inputs produce the identical sequence,
/// which downstream index-based artifact naming relies on.
///
/// With no axes, both strategies degenerate to the single base option set.
pub fn build_sweep(
    base: &OptionSet,
    axes: &[SweptAxis],
    strategy: SweepStrategy,
) -> Vec<SweepPoint> {
    if axes.is_empty() {
        return vec![SweepPoint {
            options: base.clone(),
            axis: None,
        }];
    }

    match strategy {
        SweepStrategy::Independent => {
            let mut points = Vec::new();
            for axis in axes {
                for value in &axis.values {
                    points.push(SweepPoint {
                        options: base.with(&axis.name, value.clone()),
                        axis: Some((axis.label.clone(), value.clone())),
                    });
                }
            }
            points
        }
        SweepStrategy::Cartesian => {
            let mut sets = vec![base.clone()];
            for axis in axes {
                let mut next = Vec::with_capacity(sets.len() * axis.values.len());
                for set in &sets {
                    for value in &axis.values {
                        next.push(set.with(&axis.name, value.clone()));
                    }
                }
                sets = next;
            }
            sets.into_iter()
                .map(|options| SweepPoint {
                    options,
                    axis: None,
                })
                .collect()
        }
    }
}
