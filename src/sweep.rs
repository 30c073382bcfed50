//! Sweep parameters and merged per-variant series.

use crate::result::VariantResult;
use std::fmt;

/// One parameter value of a sweep point.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Non-negative integer value, e.g. a buffer length.
    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|v| usize::try_from(v).ok())
    }

}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! param_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                ParamValue::Int(v as i64)
            }
        })*
    };
}

param_from_int!(i32, i64, u32, usize);

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Parameters handed to a case constructor for one sweep position.
#[derive(Clone, Debug, PartialEq)]
pub enum SweepPoint {
    /// A single positional value
    Value(ParamValue),
    /// Several positional values, in order
    Sequence(Vec<ParamValue>),
    /// Named parameters, in declaration order
    Named(Vec<(String, ParamValue)>),
}

impl SweepPoint {
    pub fn sequence<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        SweepPoint::Sequence(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        SweepPoint::Named(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Positional parameter `index`. A single value sits at index 0;
    /// named points have no positional parameters.
    pub fn positional(&self, index: usize) -> Option<&ParamValue> {
        match self {
            SweepPoint::Value(v) => (index == 0).then_some(v),
            SweepPoint::Sequence(values) => values.get(index),
            SweepPoint::Named(_) => None,
        }
    }

    pub fn named_param(&self, key: &str) -> Option<&ParamValue> {
        match self {
            SweepPoint::Named(params) => params.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Positional parameter 0, or the named parameter `key`.
    pub fn first_or(&self, key: &str) -> Option<&ParamValue> {
        self.positional(0).or_else(|| self.named_param(key))
    }
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepPoint::Value(v) => write!(f, "{}", v),
            SweepPoint::Sequence(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
            SweepPoint::Named(params) => {
                let parts: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

macro_rules! point_from_value {
    ($($t:ty),*) => {
        $(impl From<$t> for SweepPoint {
            fn from(v: $t) -> Self {
                SweepPoint::Value(v.into())
            }
        })*
    };
}

point_from_value!(i32, i64, u32, usize, f64, &str, String, ParamValue);

impl From<Vec<ParamValue>> for SweepPoint {
    fn from(values: Vec<ParamValue>) -> Self {
        SweepPoint::Sequence(values)
    }
}

// ============================================================================
// Results
// ============================================================================

/// Results of one case run, in variant registration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    results: Vec<VariantResult>,
}

impl ResultSet {
    pub(crate) fn new(results: Vec<VariantResult>) -> Self {
        Self { results }
    }

    pub fn get(&self, label: &str) -> Option<&VariantResult> {
        self.results.iter().find(|r| r.label() == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.label()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariantResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = VariantResult;
    type IntoIter = std::vec::IntoIter<VariantResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a VariantResult;
    type IntoIter = std::slice::Iter<'a, VariantResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Per-variant results across a sweep, index-aligned with the sweep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedSeries {
    series: Vec<(String, Vec<VariantResult>)>,
    points: usize,
}

impl MergedSeries {
    /// Merge per-point result sets, in sweep order. All points must come
    /// from the same case so every label is present at every point.
    pub fn merge<I>(points: I) -> Self
    where
        I: IntoIterator<Item = ResultSet>,
    {
        let mut series: Vec<(String, Vec<VariantResult>)> = Vec::new();
        let mut count = 0;

        for point in points {
            for result in point {
                match series.iter_mut().find(|(label, _)| label == result.label()) {
                    Some((_, results)) => results.push(result),
                    None => series.push((result.label().to_string(), vec![result])),
                }
            }
            count += 1;
        }

        debug_assert!(series.iter().all(|(_, r)| r.len() == count));
        Self {
            series,
            points: count,
        }
    }

    /// Results of one variant, one per sweep point.
    pub fn get(&self, label: &str) -> Option<&[VariantResult]> {
        self.series
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, r)| r.as_slice())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.series.iter().map(|(l, _)| l.as_str()).collect()
    }

    /// Number of sweep points merged.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Iterate `(label, results)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[VariantResult])> {
        self.series.iter().map(|(l, r)| (l.as_str(), r.as_slice()))
    }

    /// Means of every variant at sweep point `index`, divided by the mean
    /// of `baseline` at the same point.
    pub fn normalized(&self, baseline: &str, index: usize) -> Option<Vec<(&str, f64)>> {
        let base = self.get(baseline)?.get(index)?;
        Some(
            self.iter()
                .filter_map(|(label, results)| {
                    results.get(index).map(|r| (label, r.relative_to(base)))
                })
                .collect(),
        )
    }

    /// The result set of sweep point `index`.
    pub fn at(&self, index: usize) -> Option<ResultSet> {
        if index >= self.points {
            return None;
        }
        Some(ResultSet::new(
            self.series.iter().filter_map(|(_, r)| r.get(index).cloned()).collect(),
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
