/// A vector centered on its mean, with the norm of the centered values.
///
/// Pearson correlation of two vectors is the cosine of their centered forms, so each
/// row is centered once and every pair reduces to a dot product.
#[derive(Debug, Clone)]
pub struct Centered {
    values: Vec<f64>,
    norm: f64,
}

impl Centered {
    pub fn new(v: &[f64]) -> Self {
        if v.is_empty() {
            return Self {
                values: Vec::new(),
                norm: 0.0,
            };
        }
        let mean = v.iter().sum::<f64>() / v.len() as f64;
        let values: Vec<f64> = v.iter().map(|x| x - mean).collect();
        let norm = values.iter().map(|x| x * x).sum::<f64>().sqrt();
        Self { values, norm }
    }

    /// Zero variance. Correlation with such a vector is undefined.
    pub fn is_degenerate(&self) -> bool {
        self.norm == 0.0 || !self.norm.is_finite()
    }

    /// Unrounded correlation, 0.0 when either side is degenerate.
    pub fn correlation(&self, other: &Centered) -> f64 {
        if self.is_degenerate() || other.is_degenerate() || self.values.len() != other.values.len() {
            return 0.0;
        }
        let dot: f64 = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum();
        dot / (self.norm * other.norm)
    }
}

/// Pearson correlation of `a` and `b`, rounded to 3 decimals.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    round_score(Centered::new(a).correlation(&Centered::new(b)))
}

/// Round to 3 decimals (half to even), clamp to [-1, 1], and fold -0.0 into 0.0.
pub fn round_score(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    let rounded = ((x * 1000.0).round_ties_even() / 1000.0).clamp(-1.0, 1.0);
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
