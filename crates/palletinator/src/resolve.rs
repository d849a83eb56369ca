//! Design catalog seam and per-run image resolution.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::report::ReportSidesBuilder;
use crate::spec::DesignFetchError;

/// Catalog number of a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DesignId(pub u64);

impl fmt::Display for DesignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External design catalog.
///
/// `lookup` is a case-insensitive prefix match on design titles. When several
/// titles match, which one wins is up to the catalog. Calls may block; the
/// caller adds no timeout or retry.
pub trait DesignResolver {
    /// Find the design whose title starts with `key_prefix`.
    fn lookup(&self, key_prefix: &str) -> Option<DesignId>;

    /// Fetch the design's image, scaled to fit `size_max`.
    fn fetch_image(
        &self,
        design_id: DesignId,
        size_max: (u32, u32),
    ) -> Result<Vec<u8>, DesignFetchError>;
}

impl<R: DesignResolver + ?Sized> DesignResolver for &R {
    fn lookup(&self, key_prefix: &str) -> Option<DesignId> {
        (**self).lookup(key_prefix)
    }

    fn fetch_image(
        &self,
        design_id: DesignId,
        size_max: (u32, u32),
    ) -> Result<Vec<u8>, DesignFetchError> {
        (**self).fetch_image(design_id, size_max)
    }
}

/// Placeholder text for a slot whose design could not be rendered.
pub fn format_design_fallback(key: &str, design_id: Option<DesignId>) -> String {
    match design_id {
        Some(id) => format!("key_='{key}' design_number={id}"),
        None => format!("key_='{key}' design_number=None"),
    }
}

/// Encode fetched image bytes into the text payload of the IMAGE row.
pub fn encode_design_image(v_image: &[u8]) -> String {
    STANDARD.encode(v_image)
}

/// Image resolution state of one aggregation run.
///
/// Remembers only the design resolved for the previous slot, so adjacent
/// slots sharing a design fetch once. Never shared between runs.
pub(crate) struct DesignImageCache<'a, R: DesignResolver + ?Sized> {
    resolver: &'a R,
    size_max: (u32, u32),
    last_design_id: Option<DesignId>,
    last_image: Option<String>,
}

impl<'a, R: DesignResolver + ?Sized> DesignImageCache<'a, R> {
    pub(crate) fn new(resolver: &'a R, size_max: (u32, u32)) -> Self {
        Self {
            resolver,
            size_max,
            last_design_id: None,
            last_image: None,
        }
    }

    /// Resolve the image value of the next slot in traversal order.
    pub(crate) fn resolve(&mut self, key: &str, report: &mut ReportSidesBuilder) -> String {
        report.add_lookup();
        let design_id = self.resolver.lookup(key);

        if let Some(id) = design_id
            && self.last_design_id == Some(id)
            && let Some(image) = &self.last_image
        {
            debug!(design_id = %id, key, "reusing image of previous slot");
            report.add_reused();
            return image.clone();
        }

        self.last_design_id = design_id;
        let image = match design_id {
            None => {
                let c_fallback = format_design_fallback(key, None);
                warn!(key, "no design matches lookup key");
                report.add_miss(c_fallback.clone());
                c_fallback
            }
            Some(id) => match self.resolver.fetch_image(id, self.size_max) {
                Ok(v_image) => {
                    report.add_fetched();
                    encode_design_image(&v_image)
                }
                Err(err) => {
                    let c_fallback = format_design_fallback(key, Some(id));
                    warn!(design_id = %id, key, error = %err, "design image fetch failed");
                    report.add_fetch_failure(c_fallback.clone());
                    c_fallback
                }
            },
        };
        self.last_image = Some(image.clone());
        image
    }
}
