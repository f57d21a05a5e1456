/// Descriptions and named batches of descriptions.
///
/// A `Description` is one textual annotation of a query (typically a similarity
/// search hit) with the weight it contributes to the model. Negative weights mark
/// descriptions that must not be trained on.

#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub description: String,
    pub weight: f64,
    pub query: Option<String>,
}

impl Description {
    pub fn new(description: impl Into<String>, weight: f64) -> Self {
        Description {
            description: description.into(),
            weight,
            query: None,
        }
    }

    pub fn with_query(
        description: impl Into<String>,
        weight: f64,
        query: impl Into<String>,
    ) -> Self {
        Description {
            description: description.into(),
            weight,
            query: Some(query.into()),
        }
    }

    /// Truncated integer weight used as training multiplicity, None for discarded descriptions.
    pub fn training_weight(&self) -> Option<u64> {
        if self.weight >= 0.0 {
            Some(self.weight.trunc() as u64)
        } else {
            None
        }
    }
}

/// A named batch of descriptions: one query, or one background corpus file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionBatch {
    pub name: String,
    pub descriptions: Vec<Description>,
}

impl DescriptionBatch {
    pub fn new(name: impl Into<String>) -> Self {
        DescriptionBatch {
            name: name.into(),
            descriptions: Vec::new(),
        }
    }

    pub fn with_descriptions(name: impl Into<String>, descriptions: Vec<Description>) -> Self {
        DescriptionBatch {
            name: name.into(),
            descriptions,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    pub fn max_weight(&self) -> f64 {
        self.descriptions.iter().map(|d| d.weight).fold(0.0, f64::max)
    }

    pub fn total_weight(&self) -> f64 {
        self.descriptions.iter().map(|d| d.weight).sum()
    }
}
