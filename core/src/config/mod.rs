mod load;
pub mod merge;
pub mod site;
mod types;

pub use load::{apply_env_overrides, get_data_dir, load, load_default, validate_backend};
pub use merge::{format_url, user_site_fields, ConfigMerger, MergeOutcome};
pub use site::SiteConfig;
pub use types::*;
