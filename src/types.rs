use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// Find an asset by exact name, ignoring case.
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        let wanted = name.to_lowercase();
        self.assets.iter().find(|a| a.name.to_lowercase() == wanted)
    }
}
