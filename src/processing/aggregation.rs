//! Reductions applied over the interior of a sampling box

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// User supplied reduction over the values of one box.
pub type AggregationFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Reduction used by `BoxSampler::extract` to collapse a box into one value
/// per channel.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Max,
    Min,
    Median,
    Sum,
    #[serde(skip)]
    Custom(AggregationFn),
}

impl fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Mean => write!(f, "Mean"),
            Aggregation::Max => write!(f, "Max"),
            Aggregation::Min => write!(f, "Min"),
            Aggregation::Median => write!(f, "Median"),
            Aggregation::Sum => write!(f, "Sum"),
            Aggregation::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Aggregation {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Aggregation::Custom(Arc::new(f))
    }

    /// Reduce one lane of box values. Lanes are never empty.
    pub fn apply<A>(&self, values: ArrayView1<'_, A>) -> f64
    where
        A: Copy + Into<f64>,
    {
        let values = values.iter().map(|&v| Into::<f64>::into(v));
        match self {
            Aggregation::Mean => {
                let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                sum / n as f64
            }
            Aggregation::Max => values.fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Min => values.fold(f64::INFINITY, f64::min),
            Aggregation::Sum => values.sum(),
            Aggregation::Median => {
                let mut sorted: Vec<f64> = values.collect();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Aggregation::Custom(f) => {
                let collected: Vec<f64> = values.collect();
                f(&collected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_builtin_reductions() {
        let values = array![4u8, 1, 9, 2];
        let v = values.view();

        assert_eq!(Aggregation::Mean.apply(v), 4.0);
        assert_eq!(Aggregation::Max.apply(v), 9.0);
        assert_eq!(Aggregation::Min.apply(v), 1.0);
        assert_eq!(Aggregation::Sum.apply(v), 16.0);
        assert_eq!(Aggregation::Median.apply(v), 3.0);
    }

    #[test]
    fn test_median_of_odd_lane() {
        let values = array![5.0f32, -1.0, 3.0];
        assert_eq!(Aggregation::Median.apply(values.view()), 3.0);
    }

    #[test]
    fn test_custom_reduction() {
        let range = Aggregation::custom(|v: &[f64]| {
            let max = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let min = v.iter().cloned().fold(f64::INFINITY, f64::min);
            max - min
        });
        assert_eq!(range.apply(array![3u16, 10, 7].view()), 7.0);
        assert_eq!(format!("{:?}", range), "Custom(..)");
    }

    #[test]
    fn test_names_in_json() {
        let agg: Aggregation = serde_json::from_str("\"median\"").unwrap();
        assert!(matches!(agg, Aggregation::Median));
        assert_eq!(serde_json::to_string(&Aggregation::Max).unwrap(), "\"max\"");
    }
}
