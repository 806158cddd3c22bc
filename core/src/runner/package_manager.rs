use std::path::Path;

/// Dependency/build tool for a workspace, picked from the lockfile present in
/// its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
}

impl PackageManager {
    pub const YARN_LOCKFILE: &'static str = "yarn.lock";

    pub async fn detect(dir: &Path) -> Self {
        let lockfile = tokio::fs::metadata(dir.join(Self::YARN_LOCKFILE)).await;
        if lockfile.map(|m| m.is_file()).unwrap_or(false) {
            tracing::debug!("Find yarn lockfile, use Yarn package manager");
            Self::Yarn
        } else {
            tracing::debug!("Use NPM package manager");
            Self::Npm
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
        }
    }

    pub fn install_command(self) -> &'static str {
        match self {
            Self::Npm => "npm ci",
            Self::Yarn => "yarn install --production=false --frozen-lockfile",
        }
    }

    /// `clean` then `generate` through the project's engine CLI script.
    pub fn generate_commands(self, engine_script: &str) -> [String; 2] {
        [
            format!("{} run {} clean", self.as_str(), engine_script),
            format!("{} run {} generate", self.as_str(), engine_script),
        ]
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
