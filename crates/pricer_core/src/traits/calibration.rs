//! Box constraints for model calibration.
//!
//! Least-squares calibrations in this workspace work on a flat parameter
//! vector; each entry carries one [`ParameterBounds`]. The bounded
//! Levenberg-Marquardt solver projects trial points onto these boxes and
//! residual functions may clamp defensively through [`ParameterBounds::clamp_all`].

/// Bounds for a single parameter.
///
/// # Examples
/// ```
/// use pricer_core::traits::calibration::ParameterBounds;
///
/// let rho = ParameterBounds::correlation();
/// assert_eq!(rho.clamp(1.5), rho.max);
/// assert!(rho.contains(0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterBounds {
    /// Minimum allowed value.
    pub min: f64,
    /// Maximum allowed value.
    pub max: f64,
}

impl ParameterBounds {
    /// Create new bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds for a strictly positive parameter.
    pub fn positive() -> Self {
        Self {
            min: 1e-10,
            max: f64::INFINITY,
        }
    }

    /// Bounds for a non-negative parameter.
    pub fn non_negative() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }

    /// Bounds for a correlation, kept strictly inside (-1, 1).
    pub fn correlation() -> Self {
        Self {
            min: -0.9999,
            max: 0.9999,
        }
    }

    /// No bounds.
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// True when `min <= max` and neither end is NaN.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Check if a value is within bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Clamp a parameter vector element-wise.
    ///
    /// Extra parameters without a matching bound are passed through.
    pub fn clamp_all(bounds: &[ParameterBounds], params: &[f64]) -> Vec<f64> {
        params
            .iter()
            .enumerate()
            .map(|(i, &p)| bounds.get(i).map_or(p, |b| b.clamp(p)))
            .collect()
    }
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_respects_both_ends() {
        let b = ParameterBounds::new(0.0, 2.0);
        assert_eq!(b.clamp(-1.0), 0.0);
        assert_eq!(b.clamp(3.0), 2.0);
        assert_eq!(b.clamp(1.5), 1.5);
    }

    #[test]
    fn test_positive_excludes_zero() {
        let b = ParameterBounds::positive();
        assert!(!b.contains(0.0));
        assert!(b.contains(1e6));
    }

    #[test]
    fn test_clamp_all_passes_through_unbounded_tail() {
        let bounds = [ParameterBounds::correlation(), ParameterBounds::positive()];
        let clamped = ParameterBounds::clamp_all(&bounds, &[-2.0, -1.0, 7.0]);
        assert_eq!(clamped, vec![-0.9999, 1e-10, 7.0]);
    }

    #[test]
    fn test_validity() {
        assert!(ParameterBounds::unbounded().is_valid());
        assert!(!ParameterBounds::new(1.0, 0.0).is_valid());
        assert!(!ParameterBounds::new(f64::NAN, 0.0).is_valid());
    }
}
