use serde::{Deserialize, Serialize};

/// Wizard configuration loaded from paddock.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WizardConfig {
    /// Object storage and upload limits
    #[serde(default)]
    pub storage: StorageConfig,

    /// Record service table names
    #[serde(default)]
    pub tables: TablesConfig,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Bucket that receives every staged asset
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Largest accepted upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Accepted MIME types; an entry ending in `/` matches the whole family
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,

    /// Age after which unmigrated provisional assets may be reaped
    #[serde(default = "default_orphan_ttl_hours")]
    pub orphan_ttl_hours: u64,
}

/// Table names used by the record service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TablesConfig {
    #[serde(default = "default_horses_table")]
    pub horses: String,

    #[serde(default = "default_owners_table")]
    pub horse_owners: String,

    #[serde(default = "default_media_table")]
    pub media_assets: String,

    #[serde(default = "default_movements_table")]
    pub horse_movements: String,

    #[serde(default = "default_housing_table")]
    pub housing_units: String,
}

impl StorageConfig {
    pub fn accepts_mime(&self, mime_type: &str) -> bool {
        let mime = mime_type.trim().to_ascii_lowercase();
        self.allowed_mime_types.iter().any(|allowed| {
            let allowed = allowed.trim().to_ascii_lowercase();
            if allowed.ends_with('/') {
                mime.starts_with(&allowed) && mime.len() > allowed.len()
            } else {
                mime == allowed
            }
        })
    }

    pub fn orphan_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.orphan_ttl_hours.min(i64::MAX as u64) as i64)
    }
}

impl TablesConfig {
    pub fn names(&self) -> [&str; 5] {
        [
            self.horses.as_str(),
            self.horse_owners.as_str(),
            self.media_assets.as_str(),
            self.horse_movements.as_str(),
            self.housing_units.as_str(),
        ]
    }
}

// Default functions
fn default_bucket() -> String {
    "horse-media".to_string()
}

fn default_max_upload_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    vec![
        "image/".to_string(),
        "video/".to_string(),
        "application/pdf".to_string(),
    ]
}

fn default_orphan_ttl_hours() -> u64 {
    24
}

fn default_horses_table() -> String {
    "horses".to_string()
}

fn default_owners_table() -> String {
    "horse_owners".to_string()
}

fn default_media_table() -> String {
    "media_assets".to_string()
}

fn default_movements_table() -> String {
    "horse_movements".to_string()
}

fn default_housing_table() -> String {
    "housing_units".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            bucket: default_bucket(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
            orphan_ttl_hours: default_orphan_ttl_hours(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        TablesConfig {
            horses: default_horses_table(),
            horse_owners: default_owners_table(),
            media_assets: default_media_table(),
            horse_movements: default_movements_table(),
            housing_units: default_housing_table(),
        }
    }
}


pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;
