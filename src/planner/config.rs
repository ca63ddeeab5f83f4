//! Planner configuration.
//!
//! Every tunable that was a package-level constant in early versions lives
//! here, so multiple planners (including the background replanner) can run
//! with independent settings.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

use super::defaults;

/// How the unseen-area term enters the edge cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    /// cost = distance_k·dist + unseen_k·unseen(b).
    ///
    /// The destination's unseen fraction alone, unweighted by edge length.
    #[default]
    EndpointUnseen,
    /// cost = distance_k·dist + unseen_k·½(unseen(a)+unseen(b))·dist.
    ///
    /// Trapezoidal integration of the unseen fraction along the edge.
    TrapezoidUnseen,
}

/// Planner settings shared by the RRT* and FMT* strategies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Weight of the geometric distance term.
    #[serde(default = "defaults::distance_k")]
    pub distance_k: f64,

    /// Weight of the unseen-area term (0 = plan by distance alone).
    #[serde(default)]
    pub unseen_k: f64,

    /// Which unseen-area cost formulation to use.
    #[serde(default)]
    pub cost_model: CostModel,

    /// Half-side of the degenerate rectangle indexing each node.
    #[serde(default = "defaults::tolerance")]
    pub tolerance: f64,

    /// Rewire neighborhood radius as a multiple of max_segment.
    #[serde(default = "defaults::rewire_factor")]
    pub rewire_factor: f64,

    /// Radius scale applied in the batch planner's post-build rewire mode.
    #[serde(default = "defaults::post_build_rewire_scale")]
    pub post_build_rewire_scale: f64,

    /// Node budget as a fraction of the map pixel count.
    #[serde(default = "defaults::node_density")]
    pub node_density: f64,

    /// Pixels above this value block segments and points.
    #[serde(default = "defaults::min_obstacle_color")]
    pub min_obstacle_color: u8,

    /// Samples are only placed on pixels below this value.
    #[serde(default = "defaults::sample_free_below")]
    pub sample_free_below: u8,

    /// Halton base for the x coordinate (coprime with the y base).
    #[serde(default = "defaults::halton_base_x")]
    pub halton_base_x: u32,

    /// Halton base for the y coordinate.
    #[serde(default = "defaults::halton_base_y")]
    pub halton_base_y: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            distance_k: defaults::distance_k(),
            unseen_k: 0.0,
            cost_model: CostModel::default(),
            tolerance: defaults::tolerance(),
            rewire_factor: defaults::rewire_factor(),
            post_build_rewire_scale: defaults::post_build_rewire_scale(),
            node_density: defaults::node_density(),
            min_obstacle_color: defaults::min_obstacle_color(),
            sample_free_below: defaults::sample_free_below(),
            halton_base_x: defaults::halton_base_x(),
            halton_base_y: defaults::halton_base_y(),
        }
    }
}

impl PlannerConfig {
    /// Parse a configuration from a YAML string. Missing fields take their
    /// defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| PlanError::Config(e.to_string()))
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}
