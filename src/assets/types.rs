//! Asset domain types.

use serde::{Deserialize, Serialize};

/// Discriminator for the kinds of entities the console manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Agent,
    Material,
    Chat,
}

impl AssetType {
    /// Whether this kind can carry a project override over a built-in definition.
    pub fn is_asset(&self) -> bool {
        matches!(self, AssetType::Agent | AssetType::Material)
    }

    /// Backend collection segment (`api/<collection>/<id>`).
    pub fn collection(&self) -> &'static str {
        match self {
            AssetType::Agent => "agents",
            AssetType::Material => "materials",
            AssetType::Chat => "chats",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Agent => "agent",
            AssetType::Material => "material",
            AssetType::Chat => "chat",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetType {
    type Err = String;

    /// Accepts singular or plural forms (`material`, `materials`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent" | "agents" => Ok(AssetType::Agent),
            "material" | "materials" => Ok(AssetType::Material),
            "chat" | "chats" => Ok(AssetType::Chat),
            other => Err(format!("unknown asset type: {}", other)),
        }
    }
}

/// Where an asset definition lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetLocation {
    /// Built-in definition shipped with the backend
    #[default]
    Aiconsole,
    /// Defined in (or overridden by) the open project
    Project,
}

/// A single managed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub defined_in: AssetLocation,
    /// True when this is a project customization layered over a built-in asset
    #[serde(rename = "override", default)]
    pub override_: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
impl Asset {
    pub fn new(id: impl Into<String>, asset_type: AssetType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            asset_type,
            usage: String::new(),
            defined_in: AssetLocation::default(),
            override_: false,
            enabled: true,
        }
    }

    pub fn with_override(mut self, override_: bool) -> Self {
        self.override_ = override_;
        if override_ {
            self.defined_in = AssetLocation::Project;
        }
        self
    }
}
