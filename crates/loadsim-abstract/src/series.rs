/// An ordered collection of latency samples from one run, in milliseconds.
///
/// The sample order is the order of generation. Once constructed the series
/// is read-only; reductions work on copies.
#[derive(Debug, Clone, Default)]
pub struct LatencySeries {
    samples: Vec<f64>,
}

impl LatencySeries {
    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.samples.iter()
    }
}
