use serde::{Deserialize, Serialize};

/// Weight class of a venue as listed in the area's venue table (1..=7).
///
/// Weights 1–3 are conferences, 4–7 journals; 6 is reserved for magazines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(pub u8);

impl Weight {
    pub const MAGAZINE: Weight = Weight(6);

    /// Contribution of one (paper, department) pair to the department score.
    pub fn base_score(self) -> f64 {
        match self.0 {
            1 | 4 => 1.0,
            2 => 0.66,
            3 | 6 | 7 => 0.33,
            5 => 0.4,
            _ => 0.0,
        }
    }

    pub fn tier(self) -> Tier {
        match self.0 {
            1 | 4 => Tier::Top,
            2 => Tier::NearTop,
            _ => Tier::Null,
        }
    }

    pub fn venue_type(self) -> VenueType {
        if self.0 <= 3 {
            VenueType::Conference
        } else {
            VenueType::Journal
        }
    }

    /// Minimum page count for a paper in a venue of this weight.
    pub fn min_pages(self, area_default: i32) -> i32 {
        match self.0 {
            6 => 6,
            // several journal publishers omit page numbers entirely
            4 | 5 | 7 => 0,
            _ => area_default,
        }
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Top,
    NearTop,
    Null,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Top => "top",
            Tier::NearTop => "near-top",
            Tier::Null => "null",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueType {
    Conference,
    Journal,
}

impl VenueType {
    /// Single-letter code used in exported tables.
    pub fn code(self) -> &'static str {
        match self {
            VenueType::Conference => "C",
            VenueType::Journal => "J",
        }
    }
}

impl std::fmt::Display for VenueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VenueType::Conference => "conference",
            VenueType::Journal => "journal",
        };
        write!(f, "{s}")
    }
}

/// One row of the venue registry: canonical display name plus weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueInfo {
    pub name: String,
    pub weight: Weight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_weights() {
        for w in [1, 4] {
            assert_eq!(Weight(w).base_score(), 1.0);
            assert_eq!(Weight(w).tier(), Tier::Top);
        }
    }

    #[test]
    fn test_lower_weights() {
        assert_eq!(Weight(2).base_score(), 0.66);
        assert_eq!(Weight(2).tier(), Tier::NearTop);
        for w in [3, 6, 7] {
            assert_eq!(Weight(w).base_score(), 0.33);
            assert_eq!(Weight(w).tier(), Tier::Null);
        }
        assert_eq!(Weight(5).base_score(), 0.4);
        assert_eq!(Weight(5).tier(), Tier::Null);
    }

    #[test]
    fn test_unknown_weight_scores_zero() {
        assert_eq!(Weight(0).base_score(), 0.0);
        assert_eq!(Weight(9).base_score(), 0.0);
        assert_eq!(Weight(9).tier(), Tier::Null);
    }

    #[test]
    fn test_venue_type_boundary() {
        assert_eq!(Weight(3).venue_type(), VenueType::Conference);
        assert_eq!(Weight(4).venue_type(), VenueType::Journal);
        assert_eq!(VenueType::Conference.code(), "C");
        assert_eq!(VenueType::Journal.to_string(), "journal");
    }

    #[test]
    fn test_min_pages() {
        assert_eq!(Weight::MAGAZINE.min_pages(10), 6);
        assert_eq!(Weight(4).min_pages(10), 0);
        assert_eq!(Weight(7).min_pages(10), 0);
        assert_eq!(Weight(1).min_pages(10), 10);
        assert_eq!(Weight(3).min_pages(0), 0);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::NearTop.to_string(), "near-top");
        assert_eq!(Tier::Null.as_str(), "null");
    }
}
