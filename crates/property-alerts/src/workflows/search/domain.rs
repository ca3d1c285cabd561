use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    House,
    Flat,
    Bungalow,
    TerracedHouse,
    SemiDetachedHouse,
}

impl PropertyType {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::House,
            Self::Flat,
            Self::Bungalow,
            Self::TerracedHouse,
            Self::SemiDetachedHouse,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::House => "House",
            Self::Flat => "Flat",
            Self::Bungalow => "Bungalow",
            Self::TerracedHouse => "Terraced House",
            Self::SemiDetachedHouse => "Semi-Detached House",
        }
    }

    /// Accepts the spellings people actually type into the sheet.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ");
        match normalized.as_str() {
            "house" | "detached" | "detached house" => Some(Self::House),
            "flat" | "apartment" | "maisonette" => Some(Self::Flat),
            "bungalow" => Some(Self::Bungalow),
            "terraced" | "terraced house" | "terrace" => Some(Self::TerracedHouse),
            "semi" | "semi detached" | "semi detached house" => Some(Self::SemiDetachedHouse),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyTypeFilter {
    Any,
    Only(PropertyType),
}

impl PropertyTypeFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Only(kind) => kind.label(),
        }
    }

    pub fn accepts(self, kind: PropertyType) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => wanted == kind,
        }
    }
}

/// One row of search constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub location: String,
    pub min_price: u32,
    pub max_price: u32,
    pub min_bedrooms: u8,
    pub max_bedrooms: u8,
    pub property_type: PropertyTypeFilter,
    pub radius_miles: f64,
}

impl SearchCriteria {
    /// Substituted when the spreadsheet cannot be read.
    pub fn fallback() -> Self {
        Self {
            location: "London".to_string(),
            min_price: 200_000,
            max_price: 500_000,
            min_bedrooms: 2,
            max_bedrooms: 4,
            property_type: PropertyTypeFilter::Only(PropertyType::House),
            radius_miles: 5.0,
        }
    }

    pub fn has_ordered_bounds(&self) -> bool {
        self.min_price <= self.max_price && self.min_bedrooms <= self.max_bedrooms
    }

    pub fn price_band(&self) -> String {
        format!(
            "£{} - £{}",
            format_thousands(self.min_price),
            format_thousands(self.max_price)
        )
    }

    pub fn bedroom_band(&self) -> String {
        if self.min_bedrooms == self.max_bedrooms {
            format!("{} bed", self.min_bedrooms)
        } else {
            format!("{}-{} bed", self.min_bedrooms, self.max_bedrooms)
        }
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | within {} miles",
            self.location,
            self.price_band(),
            self.bedroom_band(),
            self.property_type.label(),
            self.radius_miles
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: String,
    pub address: String,
    pub postcode: String,
    pub location: String,
    pub price: u32,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub property_type: PropertyType,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    pub area_sqft: Option<u32>,
}

impl PropertyListing {
    pub fn formatted_price(&self) -> String {
        format!("£{}", format_thousands(self.price))
    }
}

pub(crate) fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separator_groups_from_the_right() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(250_000), "250,000");
        assert_eq!(format_thousands(1_250_000), "1,250,000");
    }

    #[test]
    fn property_type_parses_common_spellings() {
        assert_eq!(PropertyType::parse("Flat"), Some(PropertyType::Flat));
        assert_eq!(PropertyType::parse(" apartment "), Some(PropertyType::Flat));
        assert_eq!(
            PropertyType::parse("semi-detached house"),
            Some(PropertyType::SemiDetachedHouse)
        );
        assert_eq!(PropertyType::parse("castle"), None);
    }

    #[test]
    fn fallback_criteria_is_london_houses() {
        let criteria = SearchCriteria::fallback();
        assert_eq!(criteria.location, "London");
        assert_eq!(
            criteria.property_type,
            PropertyTypeFilter::Only(PropertyType::House)
        );
        assert!(criteria.has_ordered_bounds());
        assert_eq!(criteria.price_band(), "£200,000 - £500,000");
        assert_eq!(criteria.bedroom_band(), "2-4 bed");
    }

    #[test]
    fn radius_is_displayed_without_trailing_zeros() {
        let mut criteria = SearchCriteria::fallback();
        assert!(criteria.to_string().ends_with("within 5 miles"));
        criteria.radius_miles = 0.5;
        assert!(criteria.to_string().ends_with("within 0.5 miles"));
    }
}
