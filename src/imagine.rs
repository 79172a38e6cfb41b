//! Links to a public text-to-image proxy.
//!
//! The proxy renders whatever prompt appears in the last path segment, so generating
//! an image is just building a URL.  Nothing is fetched here.

use url::Url;

use crate::error::{Error, Result};

/// Default image proxy.
pub const DEFAULT_IMAGE_URL: &str = "https://image.pollinations.ai/prompt/";

/// Builds image-proxy URLs for prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLinker {
    base: Url,
    width: u32,
    height: u32,
}

impl ImageLinker {
    /// A linker for `base`, which must be able to carry path segments.
    pub fn new(base: &str) -> Result<Self> {
        let mut base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(Error::url(format!("{base} cannot be a base URL"), None));
        }
        // Push segments after the last one, not in place of it.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            width: 1024,
            height: 1024,
        })
    }

    /// Sets the requested image size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// The URL that renders `prompt`.
    pub fn link(&self, prompt: &str) -> Result<Url> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::validation(
                "image prompt must not be empty",
                Some("prompt".to_string()),
            ));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url("image URL cannot carry a path", None))?
            .pop_if_empty()
            .push(prompt);
        url.query_pairs_mut()
            .clear()
            .append_pair("width", &self.width.to_string())
            .append_pair("height", &self.height.to_string())
            .append_pair("nologo", "true");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linker() -> ImageLinker {
        ImageLinker::new(DEFAULT_IMAGE_URL).unwrap()
    }

    #[test]
    fn prompt_becomes_one_encoded_segment() {
        let linker = linker();
        let url = linker.link("  a cat / on a mat?  ").unwrap();
        assert_eq!(
            url.as_str(),
            "https://image.pollinations.ai/prompt/a%20cat%20%2F%20on%20a%20mat%3F?width=1024&height=1024&nologo=true"
        );
    }

    #[test]
    fn base_without_trailing_slash() {
        let linker = ImageLinker::new("https://example.com/gen")
            .unwrap()
            .with_size(512, 256);
        let url = linker.link("sunset").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/gen/sunset?width=512&height=256&nologo=true"
        );
    }

    #[test]
    fn empty_prompt_rejected() {
        assert!(linker().link("   ").unwrap_err().is_validation());
    }

    #[test]
    fn non_base_url_rejected() {
        assert!(ImageLinker::new("mailto:someone@example.com").is_err());
    }
}
