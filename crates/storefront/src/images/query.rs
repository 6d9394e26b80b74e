//! Image request parameters.

use core::fmt;

use super::IMAGE_ROUTE;

/// Largest width or height a request may ask for. Bigger requests get the
/// placeholder without fetching the source.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

/// How to fit the source into the requested box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fit {
    /// Fill the box, cropping the overflow around the center.
    #[default]
    Cover,
    /// Fit inside the box and pad the rest with transparency.
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio.
    Fill,
    /// Fit inside the box, keeping aspect ratio, no padding.
    Inside,
    /// Cover the box, keeping aspect ratio, no cropping.
    Outside,
}

impl Fit {
    /// Parse a `fit` query value. Unknown values fall back to [`Fit::Cover`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "contain" => Self::Contain,
            "fill" => Self::Fill,
            "inside" => Self::Inside,
            "outside" => Self::Outside,
            _ => Self::Cover,
        }
    }

    /// Canonical query value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw query string as received.
///
/// Every field is a string so that empty values (`width=`) do not reject the
/// whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageQueryParams {
    pub src: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub fit: Option<String>,
}

impl ImageQueryParams {
    /// Parse a raw query string. Never fails: a repeated key keeps its first
    /// value and unknown keys are ignored.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        for (name, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match name.as_ref() {
                "src" => &mut params.src,
                "width" => &mut params.width,
                "height" => &mut params.height,
                "fit" => &mut params.fit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Validated image request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageQuery {
    /// Source image; `None` when missing or empty.
    pub src: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Fit,
}

impl ImageQuery {
    /// Build a query for `src` with no resize.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    /// Set the target size.
    #[must_use]
    pub const fn size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Whether either requested dimension is above [`MAX_IMAGE_DIMENSION`].
    #[must_use]
    pub fn exceeds_size_limit(&self) -> bool {
        [self.width, self.height]
            .into_iter()
            .flatten()
            .any(|d| d > MAX_IMAGE_DIMENSION)
    }

    /// Set the fit mode.
    #[must_use]
    pub const fn fit(mut self, fit: Fit) -> Self {
        self.fit = fit;
        self
    }
}

impl From<ImageQueryParams> for ImageQuery {
    fn from(params: ImageQueryParams) -> Self {
        Self {
            src: params.src.filter(|src| !src.is_empty()),
            width: parse_dimension(params.width.as_deref()),
            height: parse_dimension(params.height.as_deref()),
            fit: params.fit.as_deref().map(Fit::parse).unwrap_or_default(),
        }
    }
}

/// Positive integer or nothing. Zero means "not requested".
fn parse_dimension(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
}

/// Build the image cache URL for a source image.
///
/// ```rust
/// use storefront_cache::images::{Fit, image_url};
///
/// assert_eq!(
///     image_url("/a b.png", Some(480), None, Fit::Cover),
///     "/api/image?src=%2Fa%20b.png&width=480&height="
/// );
/// ```
#[must_use]
pub fn image_url(src: &str, width: Option<u32>, height: Option<u32>, fit: Fit) -> String {
    let dim = |d: Option<u32>| d.map(|d| d.to_string()).unwrap_or_default();
    let mut url = format!(
        "{IMAGE_ROUTE}?src={}&width={}&height={}",
        urlencoding::encode(src),
        dim(width),
        dim(height)
    );
    if fit != Fit::Cover {
        url.push_str("&fit=");
        url.push_str(fit.as_str());
    }
    url
}
