// 🏷️ Meal Category - Closed set of meal slots
//
// Replaces free-form category strings: a row can only ever carry one of the
// five slots the logging form offers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MealCategory {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack1,
    Snack2,
}

impl MealCategory {
    /// All categories in form order
    pub const ALL: [MealCategory; 5] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Dinner,
        MealCategory::Snack1,
        MealCategory::Snack2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealCategory::Breakfast => "Breakfast",
            MealCategory::Lunch => "Lunch",
            MealCategory::Dinner => "Dinner",
            MealCategory::Snack1 => "Snack1",
            MealCategory::Snack2 => "Snack2",
        }
    }

    /// Food search terms used when seeding the catalog for this slot
    pub fn search_terms(&self) -> &'static [&'static str] {
        match self {
            MealCategory::Breakfast => &["oatmeal", "eggs", "toast", "cereal", "pancakes"],
            MealCategory::Lunch => &["sandwich", "salad", "soup", "pasta", "rice"],
            MealCategory::Dinner => &["chicken", "beef", "fish", "vegetables", "potato"],
            MealCategory::Snack1 => &["apple", "banana", "nuts", "yogurt", "crackers"],
            // Own terms so the two snack slots don't fetch the same foods
            MealCategory::Snack2 => &["granola", "cheese", "popcorn", "hummus", "smoothie"],
        }
    }

    /// Next category in form order (wraps)
    pub fn next(&self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealCategory::Breakfast),
            "lunch" => Ok(MealCategory::Lunch),
            "dinner" => Ok(MealCategory::Dinner),
            // Older catalogs were seeded with a single "Snack" slot
            "snack1" | "snack" => Ok(MealCategory::Snack1),
            "snack2" => Ok(MealCategory::Snack2),
            _ => Err(ValidationError::UnknownCategory(s.to_string())),
        }
    }
}

impl Serialize for MealCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MealCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for category in MealCategory::ALL {
            assert_eq!(category.as_str().parse::<MealCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("dinner".parse::<MealCategory>().unwrap(), MealCategory::Dinner);
        assert_eq!(" SNACK2 ".parse::<MealCategory>().unwrap(), MealCategory::Snack2);
    }

    #[test]
    fn test_legacy_snack_maps_to_first_slot() {
        assert_eq!("Snack".parse::<MealCategory>().unwrap(), MealCategory::Snack1);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = "Brunch".parse::<MealCategory>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownCategory("Brunch".to_string()));
    }

    #[test]
    fn test_next_and_previous_wrap() {
        assert_eq!(MealCategory::Snack2.next(), MealCategory::Breakfast);
        assert_eq!(MealCategory::Breakfast.previous(), MealCategory::Snack2);
        assert_eq!(MealCategory::Lunch.next(), MealCategory::Dinner);
    }

    #[test]
    fn test_snack_slots_search_different_terms() {
        assert_ne!(MealCategory::Snack1.search_terms(), MealCategory::Snack2.search_terms());
    }

    #[test]
    fn test_every_category_has_search_terms() {
        for category in MealCategory::ALL {
            let terms = category.search_terms();
            assert!(terms.len() >= 3 && terms.len() <= 5);
        }
    }
}
