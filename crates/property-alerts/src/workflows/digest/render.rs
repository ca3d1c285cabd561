use std::borrow::Cow;

use chrono::NaiveDateTime;

use crate::workflows::search::{PropertyListing, SearchCriteria};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.header { background-color: #4CAF50; color: white; padding: 20px; text-align: center; }
.criteria { padding: 10px 20px; background-color: #f9f9f9; border-bottom: 1px solid #ddd; }
.content { padding: 20px; }
.property { border: 1px solid #ddd; margin: 15px 0; padding: 15px; border-radius: 5px; }
.property img { max-width: 100%; border-radius: 3px; }
.property-title { font-size: 18px; font-weight: bold; color: #2c3e50; margin-bottom: 10px; }
.property-details { margin: 5px 0; }
.price { font-size: 20px; color: #27ae60; font-weight: bold; }
.no-results { padding: 20px; text-align: center; color: #666; }
.footer { background-color: #f4f4f4; padding: 15px; text-align: center; font-size: 12px; color: #666; }
a { color: #3498db; text-decoration: none; }";

pub fn digest_subject(criteria: &SearchCriteria, listing_count: usize) -> String {
    let noun = if listing_count == 1 {
        "property"
    } else {
        "properties"
    };
    format!(
        "Property alert: {listing_count} {noun} found in {}",
        criteria.location
    )
}

/// Renders the complete HTML email. Pure, and total over empty result sets.
pub fn render_digest(
    criteria: &SearchCriteria,
    listings: &[PropertyListing],
    generated_at: NaiveDateTime,
) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n",
        escape_html(&digest_subject(criteria, listings.len()))
    ));

    html.push_str("<div class=\"header\">\n<h1>UK Property Search Results</h1>\n");
    html.push_str(&format!(
        "<p>Properties found in: <strong>{}</strong></p>\n",
        escape_html(&criteria.location)
    ));
    html.push_str(&format!(
        "<p>Found {} property listing(s)</p>\n</div>\n",
        listings.len()
    ));

    html.push_str(&render_criteria(criteria));

    html.push_str("<div class=\"content\">\n");
    if listings.is_empty() {
        html.push_str(&format!(
            "<div class=\"no-results\"><p>No properties matched your search in {} this time.</p></div>\n",
            escape_html(&criteria.location)
        ));
    } else {
        for (index, listing) in listings.iter().enumerate() {
            html.push_str(&render_listing(index + 1, listing));
        }
    }
    html.push_str("</div>\n");

    html.push_str(&format!(
        "<div class=\"footer\">\n<p>Property search completed on {}</p>\n<p>This is an automated email from your property search bot.</p>\n</div>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str("</body>\n</html>\n");
    html
}

fn render_criteria(criteria: &SearchCriteria) -> String {
    format!(
        "<div class=\"criteria\">\n<p><strong>Your search:</strong> {} | Price {} | {} | Type: {} | Within {} miles</p>\n</div>\n",
        escape_html(&criteria.location),
        escape_html(&criteria.price_band()),
        escape_html(&criteria.bedroom_band()),
        criteria.property_type.label(),
        criteria.radius_miles
    )
}

fn render_listing(position: usize, listing: &PropertyListing) -> String {
    let mut block = String::from("<div class=\"property\">\n");
    block.push_str(&format!(
        "<div class=\"property-title\">{position}. {}</div>\n",
        escape_html(&listing.address)
    ));

    if let Some(image) = &listing.image_url {
        block.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            escape_html(image),
            escape_html(&listing.address)
        ));
    }

    block.push_str(&format!(
        "<div class=\"property-details\"><span class=\"price\">{}</span></div>\n",
        escape_html(&listing.formatted_price())
    ));
    block.push_str(&format!(
        "<div class=\"property-details\"><strong>Type:</strong> {} | <strong>Bedrooms:</strong> {} | <strong>Bathrooms:</strong> {}</div>\n",
        listing.property_type.label(),
        listing.bedrooms,
        listing.bathrooms
    ));

    if let Some(area) = listing.area_sqft {
        block.push_str(&format!(
            "<div class=\"property-details\"><strong>Area:</strong> {area} sq ft</div>\n"
        ));
    }

    block.push_str(&format!(
        "<div class=\"property-details\">{}</div>\n",
        escape_html(&listing.description)
    ));
    block.push_str(&format!(
        "<div class=\"property-details\"><strong>Postcode:</strong> {}</div>\n",
        escape_html(&listing.postcode)
    ));
    block.push_str(&format!(
        "<div class=\"property-details\"><a href=\"{}\">View property details &rarr;</a></div>\n",
        escape_html(&listing.url)
    ));
    block.push_str("</div>\n");
    block
}

fn escape_html(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.chars().fold(String::with_capacity(raw.len() + 8), |mut out, c| {
        match html_entity(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
        out
    }))
}

const fn html_entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}
