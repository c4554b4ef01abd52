//! Static district → block → gram-panchayat hierarchy
//!
//! Built once from the scoring service's location listing and treated as a
//! read-only cache afterwards. Lookups are by exact, case-sensitive name.

use serde::{Deserialize, Serialize};

use crate::error::{LeafError, Result};

/// Flattened view of one place in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    pub name: String,
    pub district: String,
    pub block_name: Option<String>,
    pub gp_name: Option<String>,
    pub has_gp_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpNode {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub name: String,
    #[serde(default)]
    pub gps: Vec<GpNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictNode {
    pub name: String,
    #[serde(default)]
    pub has_gp_data: bool,
    #[serde(default)]
    pub blocks: Vec<BlockNode>,
}

/// Flat block row of `GET /locations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRow {
    pub block_name: String,
    pub district: String,
}

/// Response of `GET /locations`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationListing {
    #[serde(default)]
    pub blocks: Vec<BlockRow>,
    #[serde(default)]
    pub districts: Vec<DistrictNode>,
}

/// One entry of `GET /levels`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub districts: Vec<String>,
}

/// Response of `GET /levels`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelsInfo {
    #[serde(default)]
    pub levels: Vec<LevelInfo>,
    #[serde(default)]
    pub gp_districts: Vec<String>,
}

impl LevelsInfo {
    /// Districts with gram-panchayat data according to an available `gp` level
    pub fn gp_districts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .levels
            .iter()
            .filter(|level| level.id == "gp" && level.available)
            .flat_map(|level| level.districts.iter().map(String::as_str))
            .chain(self.gp_districts.iter().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Row of `GET /gp/locations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpLocation {
    #[serde(alias = "gp_name")]
    pub name: String,
    #[serde(default, alias = "gp_code")]
    pub code: Option<String>,
    pub block: String,
    pub district: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationHierarchy {
    districts: Vec<DistrictNode>,
}

impl LocationHierarchy {
    /// Build the hierarchy from the scoring service listings
    pub fn build(listing: &LocationListing, levels: &LevelsInfo, gps: &[GpLocation]) -> Self {
        let mut districts: Vec<DistrictNode> = Vec::new();

        for district in &listing.districts {
            let node = district_entry(&mut districts, &district.name);
            node.has_gp_data |= district.has_gp_data;
            for block in &district.blocks {
                let block_node = block_entry(node, &block.name);
                for gp in &block.gps {
                    push_gp(block_node, gp.clone());
                }
            }
        }

        for row in &listing.blocks {
            let node = district_entry(&mut districts, &row.district);
            block_entry(node, &row.block_name);
        }

        for name in levels.gp_districts() {
            if let Some(node) = districts.iter_mut().find(|d| d.name == name) {
                node.has_gp_data = true;
            }
        }

        for gp in gps {
            let node = district_entry(&mut districts, &gp.district);
            node.has_gp_data = true;
            let block_node = block_entry(node, &gp.block);
            push_gp(block_node, GpNode { name: gp.name.clone(), code: gp.code.clone() });
        }

        // GP-capable districts first, then alphabetical
        districts.sort_by(|a, b| (!a.has_gp_data, &a.name).cmp(&(!b.has_gp_data, &b.name)));

        Self { districts }
    }

    pub fn districts(&self) -> &[DistrictNode] {
        &self.districts
    }

    pub fn district(&self, name: &str) -> Result<&DistrictNode> {
        self.districts
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| LeafError::DistrictNotFound { name: name.to_string() })
    }

    pub fn block(&self, district: &str, block: &str) -> Result<&BlockNode> {
        self.district(district)?.blocks.iter().find(|b| b.name == block).ok_or_else(|| {
            LeafError::BlockNotFound { district: district.to_string(), block: block.to_string() }
        })
    }

    pub fn gp(&self, district: &str, block: &str, gp: &str) -> Result<&GpNode> {
        self.block(district, block)?
            .gps
            .iter()
            .find(|g| g.name == gp)
            .ok_or_else(|| LeafError::GpNotFound { block: block.to_string(), gp: gp.to_string() })
    }

    /// Find the district that owns a block; the first match wins
    pub fn district_of_block(&self, block: &str) -> Option<&str> {
        self.districts
            .iter()
            .find(|d| d.blocks.iter().any(|b| b.name == block))
            .map(|d| d.name.as_str())
    }

    pub fn supports_gp(&self, district: &str) -> bool {
        self.district(district).map(|d| d.has_gp_data).unwrap_or(false)
    }

    /// Block names for the picker; every block when `district` is empty
    pub fn block_names(&self, district: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .districts
            .iter()
            .filter(|d| district.is_empty() || d.name == district)
            .flat_map(|d| d.blocks.iter().map(|b| b.name.clone()))
            .collect();
        names.sort();
        names
    }

    pub fn gp_names(&self, district: &str, block: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .block(district, block)
            .map(|b| b.gps.iter().map(|g| g.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Every node of the hierarchy, districts first within each subtree
    pub fn nodes(&self) -> Vec<LocationNode> {
        let mut nodes = Vec::new();
        for district in &self.districts {
            nodes.push(LocationNode {
                name: district.name.clone(),
                district: district.name.clone(),
                block_name: None,
                gp_name: None,
                has_gp_data: district.has_gp_data,
            });
            for block in &district.blocks {
                nodes.push(LocationNode {
                    name: block.name.clone(),
                    district: district.name.clone(),
                    block_name: Some(block.name.clone()),
                    gp_name: None,
                    has_gp_data: district.has_gp_data,
                });
                for gp in &block.gps {
                    nodes.push(LocationNode {
                        name: gp.name.clone(),
                        district: district.name.clone(),
                        block_name: Some(block.name.clone()),
                        gp_name: Some(gp.name.clone()),
                        has_gp_data: district.has_gp_data,
                    });
                }
            }
        }
        nodes
    }
}

fn district_entry<'a>(districts: &'a mut Vec<DistrictNode>, name: &str) -> &'a mut DistrictNode {
    let idx = match districts.iter().position(|d| d.name == name) {
        Some(idx) => idx,
        None => {
            districts.push(DistrictNode {
                name: name.to_string(),
                has_gp_data: false,
                blocks: Vec::new(),
            });
            districts.len() - 1
        }
    };
    &mut districts[idx]
}

fn block_entry<'a>(district: &'a mut DistrictNode, name: &str) -> &'a mut BlockNode {
    let idx = match district.blocks.iter().position(|b| b.name == name) {
        Some(idx) => idx,
        None => {
            district.blocks.push(BlockNode { name: name.to_string(), gps: Vec::new() });
            district.blocks.len() - 1
        }
    };
    &mut district.blocks[idx]
}

fn push_gp(block: &mut BlockNode, gp: GpNode) {
    if !block.gps.iter().any(|g| g.name == gp.name) {
        block.gps.push(gp);
    }
}
