use super::scan::scan_occurrences;
use super::traits::{AcceptPolicy, PreviewDetector};
use crate::error::DetectorError;
use crate::message::{Occurrence, Preview};
use anyhow::Result;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Upper bound on previews produced per message. Downstream selection
    /// keeps only the first preview, so 1 avoids wasted fetches.
    pub max_links: usize,
    pub timeout_secs: u64,
    pub max_image_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_links: 1,
            timeout_secs: 10,
            max_image_bytes: 5 * 1_024 * 1_024,
            user_agent: "unfurl/0.1".to_string(),
        }
    }
}

/// Open Graph preview detector over plain HTTP.
///
/// Scans text for URL occurrences, runs each through the acceptance policy,
/// and fetches page metadata for the accepted ones. Per-candidate failures
/// are logged and skipped; they never fail the whole detection.
pub struct HttpPreviewDetector {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpPreviewDetector {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, config })
    }

    async fn fetch_preview(&self, occurrence: &Occurrence<'_>) -> Result<Preview> {
        let url = occurrence.url.to_string();
        let response = self
            .client
            .get(occurrence.url.as_str())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| DetectorError::Fetch {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let is_html = content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html"));
        if !is_html {
            return Err(DetectorError::UnsupportedContent {
                url,
                content_type: content_type.unwrap_or_else(|| "unknown".to_string()),
            }
            .into());
        }

        // Redirects may have moved us; relative og:image resolves against
        // the final URL.
        let final_url = response.url().clone();
        let body = response.text().await?;
        let page = extract_page_metadata(&body);

        let image = match &page.image_url {
            Some(image_url) => self.fetch_image(&final_url, image_url).await,
            None => None,
        };

        Ok(Preview {
            source_url: url,
            title: page.title,
            description: page.description,
            image,
        })
    }

    /// Image download is best-effort enrichment; any failure leaves the
    /// preview without bytes instead of failing it.
    async fn fetch_image(&self, page_url: &Url, image_url: &str) -> Option<Vec<u8>> {
        let resolved = match page_url.join(image_url) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::debug!(image_url = %image_url, error = %e, "unresolvable og:image");
                return None;
            }
        };

        match self.download_image(&resolved).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!(url = %resolved, error = %e, "preview image skipped");
                None
            }
        }
    }

    async fn download_image(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;

        if let Some(length) = response.content_length()
            && length > self.config.max_image_bytes
        {
            return Err(DetectorError::ImageTooLarge {
                url: url.to_string(),
                size: length,
                limit: self.config.max_image_bytes,
            }
            .into());
        }

        let bytes = response.bytes().await?;
        if bytes.len() as u64 > self.config.max_image_bytes {
            return Err(DetectorError::ImageTooLarge {
                url: url.to_string(),
                size: bytes.len() as u64,
                limit: self.config.max_image_bytes,
            }
            .into());
        }

        let sniffed = infer::get(&bytes).map(|info| info.mime_type());
        if !sniffed.is_some_and(|mime| mime.starts_with("image/")) {
            return Err(DetectorError::UnsupportedContent {
                url: url.to_string(),
                content_type: sniffed.unwrap_or("unknown").to_string(),
            }
            .into());
        }

        Ok(bytes.to_vec())
    }
}

impl PreviewDetector for HttpPreviewDetector {
    fn detect<'a>(
        &'a self,
        text: &'a str,
        accept: AcceptPolicy<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Preview>>> + Send + 'a>> {
        Box::pin(async move {
            let mut previews = Vec::new();

            for occurrence in scan_occurrences(text) {
                if previews.len() >= self.config.max_links {
                    break;
                }
                if !accept(&occurrence) {
                    tracing::trace!(url = %occurrence.url, "occurrence rejected by policy");
                    continue;
                }
                match self.fetch_preview(&occurrence).await {
                    Ok(preview) => previews.push(preview),
                    Err(e) => {
                        tracing::debug!(url = %occurrence.url, error = %e, "preview fetch failed");
                    }
                }
            }

            Ok(previews)
        })
    }
}

struct PageMetadata {
    title: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
}

fn extract_page_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = meta_content(&document, r#"meta[property="og:title"]"#)
        .or_else(|| element_text(&document, "title"));
    let description = meta_content(&document, r#"meta[property="og:description"]"#)
        .or_else(|| meta_content(&document, r#"meta[name="description"]"#));
    let image_url = meta_content(&document, r#"meta[property="og:image"]"#);

    PageMetadata {
        title,
        description,
        image_url,
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .find_map(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let element = document.select(&sel).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}
