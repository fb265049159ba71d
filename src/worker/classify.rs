//! Request classification
//!
//! Assigns every intercepted request to exactly one [`RequestClass`].
//! Rules are checked in precedence order and the first match wins:
//!
//! 1. static asset extension on the URL path
//! 2. font provider origin
//! 3. navigation mode
//! 4. anything else

use crate::config::schema::RoutingConfig;
use crate::error::{SwError, SwResult};
use crate::http::{origin_of, Request, RequestMode};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Which font provider origin a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontOrigin {
    /// Stylesheet/metadata origin; responses change occasionally
    Stylesheet,
    /// Font file origin; responses are immutable
    Binary,
}

/// Classification of an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    StaticAsset,
    FontProvider(FontOrigin),
    Navigation,
    Other,
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticAsset => write!(f, "static-asset"),
            Self::FontProvider(FontOrigin::Stylesheet) => write!(f, "font-provider (stylesheet)"),
            Self::FontProvider(FontOrigin::Binary) => write!(f, "font-provider (binary)"),
            Self::Navigation => write!(f, "navigation"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Pure, total request classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: HashSet<String>,
    stylesheet_origin: String,
    binary_origin: String,
}

impl Classifier {
    pub fn new(routing: &RoutingConfig) -> SwResult<Self> {
        Ok(Self {
            extensions: routing
                .static_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            stylesheet_origin: normalize_origin(&routing.font_stylesheet_origin)?,
            binary_origin: normalize_origin(&routing.font_binary_origin)?,
        })
    }

    /// Classify a request
    pub fn classify(&self, request: &Request) -> RequestClass {
        if self.is_static_asset(&request.url) {
            return RequestClass::StaticAsset;
        }

        let origin = origin_of(&request.url);
        if origin == self.stylesheet_origin {
            return RequestClass::FontProvider(FontOrigin::Stylesheet);
        }
        if origin == self.binary_origin {
            return RequestClass::FontProvider(FontOrigin::Binary);
        }

        if request.mode == RequestMode::Navigate {
            return RequestClass::Navigation;
        }

        RequestClass::Other
    }

    fn is_static_asset(&self, url: &Url) -> bool {
        let path = url.path();
        match path.rsplit_once('.') {
            Some((_, ext)) if !ext.contains('/') => {
                self.extensions.contains(&ext.to_ascii_lowercase())
            }
            _ => false,
        }
    }
}

fn normalize_origin(raw: &str) -> SwResult<String> {
    Url::parse(raw)
        .map(|url| origin_of(&url))
        .map_err(|e| SwError::UrlInvalid {
            url: raw.to_string(),
            reason: e.to_string(),
        })
}
