/// Weighted n-gram language model
///
/// Counts every contiguous token window of width 1..=order, keyed by the tokens
/// joined with single spaces. Probabilities use Witten–Bell interpolation down to an
/// add-one unigram distribution that reserves one slot for unseen tokens, so every
/// phrase gets a non-zero probability.

pub mod scoring;

use std::collections::HashMap;

pub struct LanguageModel {
    order: usize,
    /// counts[k - 1] holds all k-grams
    counts: Vec<HashMap<String, u64>>,
    /// Number of distinct tokens seen after each context
    extensions: HashMap<String, u64>,
    /// Trained window totals per width; pruning does not lower them
    totals: Vec<u64>,
}

impl LanguageModel {
    pub fn new(order: usize) -> Self {
        let order = order.max(1);
        LanguageModel {
            order,
            counts: vec![HashMap::new(); order],
            extensions: HashMap::new(),
            totals: vec![0; order],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts[0].is_empty()
    }

    /// Add every window of a whitespace-tokenized text, `weight` times.
    pub fn train(&mut self, text: &str, weight: u64) {
        if weight == 0 {
            return;
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        for width in 1..=self.order.min(tokens.len()) {
            for window in tokens.windows(width) {
                let key = window.join(" ");
                let table = &mut self.counts[width - 1];
                match table.get_mut(&key) {
                    Some(count) => *count = count.saturating_add(weight),
                    None => {
                        if width > 1 {
                            let context = window[..width - 1].join(" ");
                            *self.extensions.entry(context).or_insert(0) += 1;
                        }
                        table.insert(key, weight);
                    }
                }
                self.totals[width - 1] = self.totals[width - 1].saturating_add(weight);
            }
        }
    }

    /// Drop entries counted fewer than `min_occurrence` times.
    pub fn prune(&mut self, min_occurrence: u64) {
        let before: usize = self.counts.iter().map(HashMap::len).sum();
        for table in &mut self.counts {
            table.retain(|_, count| *count >= min_occurrence);
        }
        self.rebuild_extensions();
        let after: usize = self.counts.iter().map(HashMap::len).sum();
        tracing::debug!(order = self.order, before, after, min_occurrence, "Pruned n-gram tables");
    }

    fn rebuild_extensions(&mut self) {
        let mut extensions = HashMap::new();
        for table in self.counts.iter().skip(1) {
            for key in table.keys() {
                if let Some((context, _)) = key.rsplit_once(' ') {
                    *extensions.entry(context.to_string()).or_insert(0) += 1;
                }
            }
        }
        self.extensions = extensions;
    }

    /// Weighted count of a space-joined phrase, 0 when unseen or longer than the order.
    pub fn count(&self, phrase: &str) -> u64 {
        let width = phrase.split(' ').count();
        if width == 0 || width > self.order {
            return 0;
        }
        self.counts[width - 1].get(phrase).copied().unwrap_or(0)
    }

    /// Total number of trained windows of width `n`.
    pub fn total(&self, n: usize) -> u64 {
        if n == 0 || n > self.order {
            return 0;
        }
        self.totals[n - 1]
    }

    /// All n-grams of width `n` with their counts.
    pub fn ngrams(&self, n: usize) -> impl Iterator<Item = (&str, u64)> + '_ {
        let table = if n >= 1 && n <= self.order {
            Some(&self.counts[n - 1])
        } else {
            None
        };
        table
            .into_iter()
            .flat_map(|t| t.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.counts[0].len()
    }

    /// Chain-rule probability of a token sequence.
    pub fn probability(&self, tokens: &[&str]) -> f64 {
        let mut p = 1.0;
        for i in 0..tokens.len() {
            let start = (i + 1).saturating_sub(self.order);
            p *= self.conditional(&tokens[start..i], tokens[i]);
        }
        p
    }

    /// P(word | history), interpolated with the shorter history.
    fn conditional(&self, history: &[&str], word: &str) -> f64 {
        if history.is_empty() {
            let seen = self.counts[0].get(word).copied().unwrap_or(0) as f64;
            let denominator = self.totals[0] as f64 + self.vocabulary_size() as f64 + 1.0;
            return (seen + 1.0) / denominator;
        }

        let lower = self.conditional(&history[1..], word);
        let context = history.join(" ");
        let context_count = self.count(&context);
        let distinct = self.extensions.get(&context).copied().unwrap_or(0);
        if context_count == 0 || distinct == 0 {
            return lower;
        }

        let joint = self.count(&format!("{} {}", context, word)) as f64;
        let mass = (self.order as f64) * distinct as f64;
        (joint + mass * lower) / (context_count as f64 + mass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_counts_all_widths() {
        let mut lm = LanguageModel::new(3);
        lm.train("kinase domain protein", 2);
        assert_eq!(lm.count("kinase"), 2);
        assert_eq!(lm.count("kinase domain"), 2);
        assert_eq!(lm.count("kinase domain protein"), 2);
        assert_eq!(lm.count("domain kinase"), 0);
        assert_eq!(lm.total(1), 6);
        assert_eq!(lm.total(3), 2);
    }

    #[test]
    fn test_short_lines_only_fill_lower_orders() {
        let mut lm = LanguageModel::new(3);
        lm.train("kinase", 1);
        assert_eq!(lm.total(1), 1);
        assert_eq!(lm.total(2), 0);
        assert_eq!(lm.ngrams(3).count(), 0);
    }

    #[test]
    fn test_zero_weight_trains_nothing() {
        let mut lm = LanguageModel::new(2);
        lm.train("kinase domain", 0);
        assert!(lm.is_empty());
    }

    #[test]
    fn test_prune_removes_rare_entries() {
        let mut lm = LanguageModel::new(2);
        lm.train("kinase domain", 3);
        lm.train("kinase subunit", 1);
        lm.prune(2);
        assert_eq!(lm.count("kinase domain"), 3);
        assert_eq!(lm.count("kinase subunit"), 0);
        assert_eq!(lm.count("subunit"), 0);
        assert_eq!(lm.extensions.get("kinase"), Some(&1));
    }

    #[test]
    fn test_unseen_tokens_have_positive_probability() {
        let mut lm = LanguageModel::new(2);
        lm.train("kinase domain", 5);
        let p = lm.probability(&["zinc", "finger"]);
        assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn test_seen_phrase_more_probable_than_swapped() {
        let mut lm = LanguageModel::new(2);
        lm.train("kinase domain", 10);
        lm.train("domain protein", 10);
        assert!(lm.probability(&["kinase", "domain"]) > lm.probability(&["domain", "kinase"]));
    }

    #[test]
    fn test_unigram_distribution_sums_below_one() {
        let mut lm = LanguageModel::new(1);
        lm.train("a b c a", 1);
        let total: f64 = ["a", "b", "c"].iter().map(|t| lm.probability(&[t])).sum();
        assert!(total < 1.0);
        assert!(total > 0.5);
    }
}
