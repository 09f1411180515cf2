use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::ColorDescriptor;
use crate::error::Error;

/// An indexed image and its colour descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: usize,
    pub path: PathBuf,
    pub color: ColorDescriptor,
}

/// A neighbour returned by an index, ranked by `distance` (smaller is more similar).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub path: PathBuf,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Sequential scan over colour descriptors.
    List,
    /// Quadtree range query on (mean hue, mean saturation), refined by histogram.
    Quadtree,
    /// Hash buckets on dominant colour, refined by histogram.
    Hash,
    /// HNSW over ResNet50 descriptors.
    Deep,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::List, Method::Quadtree, Method::Hash, Method::Deep];

    pub fn label(&self) -> &str {
        match self {
            Method::List => "Sequential list",
            Method::Quadtree => "Quadtree",
            Method::Hash => "Hash",
            Method::Deep => "Deep",
        }
    }

    /// The number shown for this method in the interactive menu.
    pub fn menu_number(&self) -> usize {
        match self {
            Method::List => 1,
            Method::Quadtree => 2,
            Method::Hash => 3,
            Method::Deep => 4,
        }
    }

    pub fn requires_model(&self) -> bool {
        matches!(self, Method::Deep)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Accepts either the method name or its menu number.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "list" => Ok(Method::List),
            "2" | "quadtree" => Ok(Method::Quadtree),
            "3" | "hash" => Ok(Method::Hash),
            "4" | "deep" => Ok(Method::Deep),
            other => Err(Error::InvalidMethod(other.to_string())),
        }
    }
}
