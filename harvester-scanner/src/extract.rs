use crate::pagination::TILE_SELECTOR;
use crate::result::Listing;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Tiles at the top of every directory page that belong to the page
/// template rather than the result list. Calibrated to the live site.
pub const LEADING_TILE_SKIP: usize = 28;

pub const LISTING_ID_ATTR: &str = "data-listing-id";
pub const LISTING_NAME_ATTR: &str = "data-listing-name";
pub const LISTING_URL_ATTR: &str = "data-listing-url";

/// Publisher website link on a listing detail page.
pub const WEBSITE_SELECTOR: &str = r#"[data-event="listing-publisher-website"][href]"#;

/// Encoded sequences decoded in listing names, matched left to right.
const ENTITIES: [(&str, &str); 6] = [
    ("&#x2F;", "/"),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

/// Pull new listings out of a rendered directory page.
///
/// The first `skip` tiles are dropped. Tiles without an id, or whose id is
/// in `seen`, or that lack a name or a resolvable detail URL, are not
/// listings and are skipped without complaint. Ids repeated within the page
/// are kept once. Attribute values are taken as written in the markup, and
/// names are decoded once by [`unescape_entities`].
pub fn extract_listings(
    html: &str,
    base_url: &Url,
    skip: usize,
    seen: &HashSet<String>,
) -> Vec<Listing> {
    let document = parse_preserving_entities(html);
    let tile_selector = Selector::parse(TILE_SELECTOR).unwrap();

    let mut extracted = HashSet::new();
    let mut listings = Vec::new();

    for tile in document.select(&tile_selector).skip(skip) {
        let Some(id) = tile_attr(&tile, LISTING_ID_ATTR) else {
            continue;
        };
        if seen.contains(id) || extracted.contains(id) {
            continue;
        }

        let name = tile_attr(&tile, LISTING_NAME_ATTR).map(unescape_entities);
        let detail_url = tile_attr(&tile, LISTING_URL_ATTR).and_then(|raw| resolve(base_url, raw));

        match (name, detail_url) {
            (Some(name), Some(detail_url)) => {
                extracted.insert(id.to_string());
                listings.push(Listing::new(id.to_string(), name, detail_url));
            }
            _ => debug!("Tile {} has no usable name or detail URL", id),
        }
    }

    listings
}

/// Number of tiles in the page, template tiles included.
pub fn count_tiles(html: &str) -> usize {
    let document = Html::parse_document(html);
    let tile_selector = Selector::parse(TILE_SELECTOR).unwrap();
    document.select(&tile_selector).count()
}

/// Publisher website linked from a detail page, if any.
pub fn extract_website(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(WEBSITE_SELECTOR).unwrap();

    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .find(|href| !href.is_empty())
        .map(|href| href.to_string())
}

/// Decode the six entity sequences that survive in listing names.
///
/// Single pass: decoded output is never re-scanned, so `&amp;lt;` becomes `&lt;`.
pub fn unescape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES.iter().find(|(encoded, _)| tail.starts_with(encoded)) {
            Some((encoded, decoded)) => {
                out.push_str(decoded);
                rest = &tail[encoded.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parse `html` so attribute values come back with their entities untouched.
/// Every `&` is escaped before parsing and the parser's own decoding undoes it.
fn parse_preserving_entities(html: &str) -> Html {
    Html::parse_document(&html.replace('&', "&amp;"))
}

/// Attribute on the tile itself, else on its first descendant carrying it.
fn tile_attr<'a>(tile: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    let value = match tile.value().attr(name) {
        Some(value) => Some(value),
        None => {
            let selector = Selector::parse(&format!("[{}]", name)).ok()?;
            tile.select(&selector)
                .next()
                .and_then(|element| element.value().attr(name))
        }
    };
    value.filter(|v| !v.is_empty())
}

fn resolve(base_url: &Url, raw: &str) -> Option<String> {
    base_url.join(raw).ok().map(|url| url.to_string())
}
