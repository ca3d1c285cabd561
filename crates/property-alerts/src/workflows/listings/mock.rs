use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use super::{ListingError, ListingProvider};
use crate::workflows::search::{
    PropertyListing, PropertyType, PropertyTypeFilter, SearchCriteria,
};

const MIN_LISTINGS: usize = 3;
const MAX_LISTINGS: usize = 8;
const LISTING_SITE: &str = "https://example-property-site.co.uk";

const STREETS: [&str; 12] = [
    "High Street",
    "Church Road",
    "Victoria Road",
    "Park Avenue",
    "Mill Lane",
    "Oak Close",
    "The Green",
    "Station Road",
    "London Road",
    "Main Street",
    "Elm Drive",
    "Chestnut Way",
];

const POSTCODE_LETTERS: &[u8] = b"ABDEFGHJLNPQRSTUWXYZ";

/// Offline stand-in for the listings API. Output depends only on the criteria,
/// and the random stream is seeded from the location so repeated runs for the
/// same place produce the same listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockListingProvider;

impl MockListingProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ListingProvider for MockListingProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<PropertyListing>, ListingError> {
        let location = criteria.location.trim();
        if location.is_empty() {
            return Err(ListingError::InvalidCriteria(
                "location must not be empty".to_string(),
            ));
        }
        if criteria.min_price > criteria.max_price {
            return Err(ListingError::InvalidCriteria(format!(
                "min price {} exceeds max price {}",
                criteria.min_price, criteria.max_price
            )));
        }
        if criteria.min_bedrooms > criteria.max_bedrooms {
            return Err(ListingError::InvalidCriteria(format!(
                "min bedrooms {} exceeds max bedrooms {}",
                criteria.min_bedrooms, criteria.max_bedrooms
            )));
        }

        let mut rng = StdRng::seed_from_u64(location_seed(location));
        let town = title_case(location);
        let districts = postcode_districts(location);
        let count = rng.gen_range(MIN_LISTINGS..=MAX_LISTINGS);

        let mut listings: Vec<PropertyListing> = (0..count)
            .map(|_| generate_listing(&mut rng, criteria, &town, districts))
            .collect();
        listings.sort_by_key(|listing| listing.price);
        Ok(listings)
    }
}

fn generate_listing(
    rng: &mut StdRng,
    criteria: &SearchCriteria,
    town: &str,
    districts: &[&str],
) -> PropertyListing {
    let property_type = match criteria.property_type {
        PropertyTypeFilter::Only(kind) => kind,
        PropertyTypeFilter::Any => *pick(rng, &PropertyType::ordered()),
    };
    let bedrooms = rng.gen_range(criteria.min_bedrooms..=criteria.max_bedrooms);
    let price = rng.gen_range(criteria.min_price..=criteria.max_price);
    let bathrooms = bedrooms.max(1).min(rng.gen_range(1..=3));
    let area_sqft = if bedrooms > 1 {
        rng.gen_range(600..=2000)
    } else {
        rng.gen_range(400..=800)
    };

    let street_number = rng.gen_range(1..=200);
    let street = pick(rng, &STREETS);
    let postcode = format!(
        "{} {}{}{}",
        pick(rng, districts),
        rng.gen_range(1..=9),
        char::from(*pick(rng, POSTCODE_LETTERS)),
        char::from(*pick(rng, POSTCODE_LETTERS)),
    );

    let kind = property_type.label().to_ascii_lowercase();
    let description = match rng.gen_range(0..4) {
        0 => format!("Beautiful {kind} in {town}"),
        1 => format!("Stunning {bedrooms}-bedroom {kind}"),
        2 => format!("Modern {kind} with excellent transport links"),
        _ => format!("Spacious {bedrooms}-bedroom {kind} in sought-after area"),
    };

    let id: u32 = rng.gen_range(100_000..=999_999);

    PropertyListing {
        id: id.to_string(),
        address: format!("{street_number} {street}, {town}"),
        postcode,
        location: town.to_string(),
        price,
        bedrooms,
        bathrooms,
        property_type,
        description,
        url: format!("{LISTING_SITE}/property/{id}"),
        image_url: Some(format!("{LISTING_SITE}/images/{id}/main.jpg")),
        area_sqft: Some(area_sqft),
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Stable across processes and platforms, unlike `DefaultHasher`.
fn location_seed(location: &str) -> u64 {
    let digest = Sha256::digest(location.trim().to_lowercase().as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(seed)
}

fn postcode_districts(location: &str) -> &'static [&'static str] {
    match location.trim().to_lowercase().as_str() {
        "london" => &["SW1", "SW2", "NW1", "NW3", "E1", "E2", "W1", "W2"],
        "manchester" => &["M1", "M2", "M3", "M4", "M14", "M20"],
        "birmingham" => &["B1", "B2", "B3", "B15", "B16", "B17"],
        "leeds" => &["LS1", "LS2", "LS6", "LS7", "LS8"],
        "bristol" => &["BS1", "BS2", "BS3", "BS6", "BS7"],
        _ => &["SW1", "M1", "B1"],
    }
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
