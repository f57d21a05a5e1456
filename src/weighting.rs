/// Weight preprocessing of a query batch before training.
///
/// - `enforce_weight_cutoff`: drop descriptions far below the best-weighted one
/// - `linear_normalization`: rescale weights so they average to 1, rounded to integers

use crate::data::{Description, DescriptionBatch};

/// Keep descriptions weighing at least `percent`% of the batch maximum.
///
/// Callers apply this only for `0 < percent <= 100`.
pub fn enforce_weight_cutoff(batch: &DescriptionBatch, percent: u32) -> DescriptionBatch {
    let threshold = batch.max_weight() * f64::from(percent) / 100.0;
    let kept: Vec<Description> = batch
        .descriptions
        .iter()
        .filter(|d| d.weight >= threshold)
        .cloned()
        .collect();
    tracing::debug!(
        batch = %batch.name,
        percent,
        threshold,
        before = batch.len(),
        after = kept.len(),
        "Applied weight cutoff"
    );
    DescriptionBatch::with_descriptions(batch.name.clone(), kept)
}

/// Scale weights by `count / sum`, round, and drop descriptions left with no weight.
///
/// A batch whose total weight is not finite and positive comes back unchanged, so a
/// non-finite weight still reaches training and fails the query there.
pub fn linear_normalization(mut batch: DescriptionBatch) -> DescriptionBatch {
    let total = batch.total_weight();
    if !total.is_finite() || total <= 0.0 {
        tracing::debug!(batch = %batch.name, total, "Skipping normalization of unscalable batch");
        return batch;
    }
    let factor = batch.len() as f64 / total;
    let before = batch.len();
    batch.descriptions.retain_mut(|d| {
        d.weight = (d.weight * factor).round();
        d.weight > 0.0
    });
    tracing::debug!(
        batch = %batch.name,
        factor,
        before,
        after = batch.len(),
        "Normalized weights"
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(weights: &[f64]) -> DescriptionBatch {
        DescriptionBatch::with_descriptions(
            "q",
            weights
                .iter()
                .enumerate()
                .map(|(i, w)| Description::new(format!("description {}", i), *w))
                .collect(),
        )
    }

    #[test]
    fn test_cutoff_keeps_survivors_above_bound() {
        let input = batch(&[250.0, 120.0, 30.0, 200.0]);
        let output = enforce_weight_cutoff(&input, 50);
        assert!(output.len() <= input.len());
        assert_eq!(output.len(), 2);
        for d in &output.descriptions {
            assert!(d.weight >= 125.0);
        }
    }

    #[test]
    fn test_cutoff_hundred_percent_keeps_only_maximum() {
        let output = enforce_weight_cutoff(&batch(&[5.0, 5.0, 4.0]), 100);
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_normalization_preserves_total_within_rounding() {
        let input = batch(&[250.0, 120.0, 30.0, 200.0]);
        let count = input.len() as f64;
        let output = linear_normalization(input);
        for d in &output.descriptions {
            assert!(d.weight > 0.0);
            assert_eq!(d.weight, d.weight.round());
        }
        assert!((output.total_weight() - count).abs() <= count / 2.0);
    }

    #[test]
    fn test_normalization_drops_negligible_weights() {
        let output = linear_normalization(batch(&[1000.0, 1000.0, 1.0]));
        assert_eq!(output.len(), 2);
        assert_eq!(output.descriptions[0].weight, 1.0);
    }

    #[test]
    fn test_normalization_of_infinite_total_is_identity() {
        let input = batch(&[50.0, f64::INFINITY, 30.0]);
        let output = linear_normalization(input.clone());
        assert_eq!(output, input);
    }

    #[test]
    fn test_normalization_of_zero_total_is_identity() {
        let input = batch(&[0.0, 0.0]);
        let output = linear_normalization(input.clone());
        assert_eq!(output, input);
    }
}
