use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum cosine distance at which a match is accepted. A match requires
/// the nearest distance to be strictly below this value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: f64 = 0.4;

    pub fn new(value: f64) -> Result<Self, String> {
        if !(0.0..=2.0).contains(&value) {
            return Err(format!(
                "Threshold must be between 0.0 and 2.0, got {value}"
            ));
        }
        Ok(Threshold(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn accepts(&self, distance: f64) -> bool {
        distance < self.0
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(Self::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_validation() {
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(2.0).is_ok());
        assert!(Threshold::new(-0.01).is_err());
        assert!(Threshold::new(2.01).is_err());
        assert!(Threshold::new(f64::NAN).is_err());
    }

    #[test]
    fn test_accepts_is_strict() {
        let t = Threshold::default();
        assert!(t.accepts(0.39));
        assert!(!t.accepts(0.4));
        assert!(!t.accepts(0.5));
    }
}
