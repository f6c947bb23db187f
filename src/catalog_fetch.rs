use js_sys::Uint8Array;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use odd1out_core::{parse_catalog, CatalogError, CatalogSource, GameRules, Puzzle};

/// Puzzle document served next to the page.
#[derive(Clone, Debug)]
pub(crate) struct FetchCatalog {
    url: String,
    rules: GameRules,
}

impl FetchCatalog {
    pub(crate) fn new(url: impl Into<String>, rules: GameRules) -> Self {
        Self {
            url: url.into(),
            rules,
        }
    }

    async fn fetch_bytes(&self) -> Result<Vec<u8>, CatalogError> {
        let window =
            web_sys::window().ok_or_else(|| CatalogError::Fetch("no window".to_string()))?;
        let value = JsFuture::from(window.fetch_with_str(&self.url))
            .await
            .map_err(|_| CatalogError::Fetch(format!("request to {} failed", self.url)))?;
        let response: Response = value
            .dyn_into()
            .map_err(|_| CatalogError::Fetch("unexpected fetch result".to_string()))?;
        if !response.ok() {
            return Err(CatalogError::Fetch(format!(
                "{} answered {}",
                self.url,
                response.status()
            )));
        }
        let buffer = response
            .array_buffer()
            .map_err(|_| CatalogError::Fetch("body unavailable".to_string()))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|_| CatalogError::Fetch("failed to read body".to_string()))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

impl CatalogSource for FetchCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<Puzzle>, CatalogError> {
        let bytes = self.fetch_bytes().await?;
        parse_catalog(&bytes, &self.rules)
    }
}
