use serde::{Deserialize, Serialize};

/// One directory entry as seen in the rendered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub detail_url: String,
    pub website_url: Option<String>,
}

impl Listing {
    pub fn new(id: String, name: String, detail_url: String) -> Self {
        Self {
            id,
            name,
            detail_url,
            website_url: None,
        }
    }

    pub fn with_website(mut self, website_url: String) -> Self {
        self.website_url = Some(website_url);
        self
    }

    pub fn is_enriched(&self) -> bool {
        self.website_url.as_deref().is_some_and(|w| !w.is_empty())
    }
}
