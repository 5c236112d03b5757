use serde::Deserialize;
use std::fmt;

/// Largest edge accepted from `w`/`h`. Anything above is ignored, like a
/// non-numeric value.
pub const MAX_DIMENSION: u32 = 10_000;

/// First path segment of `/images/{type}/{image}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageCategory {
    /// Full cover scans.
    Movie,
    Thumbnails,
    /// Actor portraits.
    Actor,
    /// Face crops derived from actor portraits.
    Faces,
    Other(String),
}

impl ImageCategory {
    pub fn parse(segment: &str) -> Self {
        match segment {
            "movie" => Self::Movie,
            "thumbnails" => Self::Thumbnails,
            "actor" => Self::Actor,
            "faces" => Self::Faces,
            other => Self::Other(other.to_string()),
        }
    }

    /// Directory name under the image root.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Movie => "movie",
            Self::Thumbnails => "thumbnails",
            Self::Actor => "actor",
            Self::Faces => "faces",
            Self::Other(other) => other,
        }
    }

    /// Image served with a 404 when the requested one cannot be produced.
    pub fn placeholder_file(&self) -> Option<&'static str> {
        match self {
            Self::Movie => Some("cover_placeholder.jpg"),
            Self::Thumbnails => Some("thumbnail_placeholder.jpg"),
            Self::Actor => Some("actor_placeholder.jpg"),
            Self::Faces | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw query string of the image endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageQuery {
    pub w: Option<String>,
    pub h: Option<String>,
    pub back: Option<String>,
    pub front: Option<String>,
    pub spine: Option<String>,
}

impl ImageQuery {
    pub fn directives(&self) -> ImageDirectives {
        ImageDirectives {
            width: self.w.as_deref().and_then(parse_dimension),
            height: self.h.as_deref().and_then(parse_dimension),
            back: is_set(self.back.as_deref()),
            front: is_set(self.front.as_deref()),
            spine: is_set(self.spine.as_deref()),
        }
    }
}

fn is_set(flag: Option<&str>) -> bool {
    flag.is_some_and(|value| !value.is_empty())
}

/// Parsed image directives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageDirectives {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub back: bool,
    pub front: bool,
    pub spine: bool,
}

impl ImageDirectives {
    pub fn resize(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Region flags take precedence over the spine flag, which takes
    /// precedence over explicit dimensions. `back` wins over `front`.
    pub fn mode(&self) -> DeriveMode {
        if self.back || self.front {
            let anchor = if self.back {
                RegionAnchor::TopLeft
            } else {
                RegionAnchor::TopRight
            };
            DeriveMode::Region(anchor)
        } else if self.spine {
            DeriveMode::Spine
        } else {
            DeriveMode::Resize {
                width: self.width,
                height: self.height,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionAnchor {
    /// Back cover: left half of a cover scan.
    TopLeft,
    /// Front cover: right half of a cover scan.
    TopRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeriveMode {
    Region(RegionAnchor),
    Spine,
    Resize {
        width: Option<u32>,
        height: Option<u32>,
    },
}

/// Parse a dimension the way the web client sends it: optional leading
/// whitespace and `+`, then the leading run of digits. Zero, non-numeric and
/// oversized values yield `None`.
///
/// A zero edge counts as absent: `?w=0` serves the source image with 200. It
/// does not fail the resize and fall back to the placeholder with 404.
pub fn parse_dimension(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    trimmed[..end]
        .parse::<u32>()
        .ok()
        .filter(|value| (1..=MAX_DIMENSION).contains(value))
}
