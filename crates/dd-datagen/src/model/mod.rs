mod validate;

use std::str::FromStr;

use orion_error::StructError;
use serde::Deserialize;

use crate::error::{GenError, GenReason, GenResult};
use crate::sampler::Weighted;

/// Category table compiled into the binary.
const BUILTIN_TOML: &str = include_str!("../../fixtures/categories.toml");

// ---------------------------------------------------------------------------
// Tree nodes
// ---------------------------------------------------------------------------

/// Root of the weighted category hierarchy:
///
/// ```text
/// apps[] ─┬─ event_types[] (leaf, carries latency)
///         └─ oses[] ─── versions[] (leaf)
/// ```
///
/// Read-only once built; share it across tasks behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryModel {
    pub apps: Vec<AppNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppNode {
    pub name: String,
    pub weight: f64,
    pub event_types: Vec<EventTypeNode>,
    pub oses: Vec<OsNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventTypeNode {
    pub name: String,
    pub weight: f64,
    pub latency: LatencySpec,
}

/// Parameters of the per-event-type latency distribution, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatencySpec {
    pub mean: f64,
    pub stddev: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OsNode {
    pub name: String,
    pub weight: f64,
    pub versions: Vec<VersionNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionNode {
    pub name: String,
    pub weight: f64,
}

macro_rules! impl_weighted {
    ($($node:ty),* $(,)?) => {
        $(impl Weighted for $node {
            fn weight(&self) -> f64 {
                self.weight
            }
        })*
    };
}

impl_weighted!(AppNode, EventTypeNode, OsNode, VersionNode);

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl CategoryModel {
    /// The built-in app/event/OS table, parsed and validated.
    pub fn builtin() -> GenResult<Self> {
        BUILTIN_TOML.parse()
    }

    /// Check the invariants sampling relies on: every list non-empty, weights
    /// finite and non-negative with a positive sum, latency parameters
    /// non-negative, names non-empty.
    pub fn validate(&self) -> GenResult<()> {
        validate::validate_model(self).map_err(|detail| {
            StructError::from(GenReason::InvalidModel).with_detail(detail)
        })
    }

    pub fn app(&self, name: &str) -> Option<&AppNode> {
        self.apps.iter().find(|a| a.name == name)
    }

    /// Sum of event types across all apps.
    pub fn event_type_count(&self) -> usize {
        self.apps.iter().map(|a| a.event_types.len()).sum()
    }
}

impl FromStr for CategoryModel {
    type Err = GenError;

    /// Parse a TOML category table and validate it.
    fn from_str(toml_str: &str) -> GenResult<Self> {
        let model: CategoryModel = toml::from_str(toml_str).map_err(|e| {
            StructError::from(GenReason::InvalidModel)
                .with_detail(format!("parse category table: {e}"))
        })?;
        model.validate()?;
        Ok(model)
    }
}

impl AppNode {
    pub fn os(&self, name: &str) -> Option<&OsNode> {
        self.oses.iter().find(|o| o.name == name)
    }

    pub fn event_type(&self, name: &str) -> Option<&EventTypeNode> {
        self.event_types.iter().find(|e| e.name == name)
    }
}
