//! Payment frequency enumeration.

use std::fmt;
use std::str::FromStr;

/// Payment frequency of a swap leg.
///
/// Only month-based rolls are supported since schedules are generated from
/// integer month offsets.
///
/// # Examples
///
/// ```
/// use pricer_models::schedules::Frequency;
///
/// let freq = Frequency::Quarterly;
/// assert_eq!(freq.periods_per_year(), 4);
/// assert_eq!(freq.months_between_payments(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Annual payments (once per year).
    Annual,
    /// Semi-annual payments (twice per year).
    SemiAnnual,
    /// Quarterly payments (four times per year).
    Quarterly,
    /// Monthly payments (twelve times per year).
    Monthly,
}

impl Frequency {
    /// Returns the number of payment periods per year.
    #[inline]
    pub fn periods_per_year(&self) -> u32 {
        12 / self.months_between_payments()
    }

    /// Returns the number of months between payment dates.
    ///
    /// ```
    /// use pricer_models::schedules::Frequency;
    ///
    /// assert_eq!(Frequency::Annual.months_between_payments(), 12);
    /// assert_eq!(Frequency::SemiAnnual.months_between_payments(), 6);
    /// ```
    #[inline]
    pub fn months_between_payments(&self) -> u32 {
        match self {
            Frequency::Annual => 12,
            Frequency::SemiAnnual => 6,
            Frequency::Quarterly => 3,
            Frequency::Monthly => 1,
        }
    }

    /// Returns the standard name for this frequency.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Annual => "Annual",
            Frequency::SemiAnnual => "Semi-Annual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Frequency {
    type Err = String;

    /// Parses frequency from string (case-insensitive).
    ///
    /// - Annual: "annual", "1y", "12m", "yearly"
    /// - SemiAnnual: "semi-annual", "semiannual", "6m"
    /// - Quarterly: "quarterly", "3m"
    /// - Monthly: "monthly", "1m"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "annual" | "1y" | "yearly" | "12m" => Ok(Frequency::Annual),
            "semiannual" | "6m" => Ok(Frequency::SemiAnnual),
            "quarterly" | "3m" => Ok(Frequency::Quarterly),
            "monthly" | "1m" => Ok(Frequency::Monthly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Frequency;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Frequency {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.name())
        }
    }

    impl<'de> Deserialize<'de> for Frequency {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periods_per_year() {
        assert_eq!(Frequency::Annual.periods_per_year(), 1);
        assert_eq!(Frequency::SemiAnnual.periods_per_year(), 2);
        assert_eq!(Frequency::Quarterly.periods_per_year(), 4);
        assert_eq!(Frequency::Monthly.periods_per_year(), 12);
    }

    #[test]
    fn test_from_str_accepts_tenor_codes() {
        assert_eq!("6M".parse::<Frequency>().unwrap(), Frequency::SemiAnnual);
        assert_eq!("semi-annual".parse::<Frequency>().unwrap(), Frequency::SemiAnnual);
        assert_eq!("1y".parse::<Frequency>().unwrap(), Frequency::Annual);
        assert!("weekly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for freq in [
            Frequency::Annual,
            Frequency::SemiAnnual,
            Frequency::Quarterly,
            Frequency::Monthly,
        ] {
            assert_eq!(freq.to_string().parse::<Frequency>().unwrap(), freq);
        }
    }
}
