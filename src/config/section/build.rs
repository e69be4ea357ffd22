//! `[build]` section configuration.
//!
//! Selects the build tool driven by the recompiler and its coordinates.
//!
//! # Example
//!
//! ```toml
//! [build]
//! system = "gradle"          # "gradle" or "amper"
//! continuous = false         # Let the build tool watch and rebuild by itself
//!
//! [build.gradle]
//! root = "."                 # Directory containing ./gradlew
//! project = ":app"           # Gradle project path (":" for the root project)
//! task = "hotReloadClasses"  # Task compiling the reloadable classes
//! java_home = "/opt/jdk"     # Optional; system java when absent
//!
//! [build.amper]
//! root = "."
//! task = "compileJvm"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::FieldPath;

/// Supported build tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    #[default]
    Gradle,
    Amper,
}

/// `[build]` settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Build tool used for recompilation.
    pub system: BuildSystem,

    /// Run the build tool in continuous (watch) mode.
    /// Only honored by Gradle.
    pub continuous: bool,

    /// Gradle coordinates.
    pub gradle: GradleConfig,

    /// Amper coordinates.
    pub amper: AmperConfig,
}

/// `[build.gradle]` settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GradleConfig {
    pub root: Option<PathBuf>,
    pub project: Option<String>,
    pub task: Option<String>,
    pub java_home: Option<PathBuf>,
}

impl GradleConfig {
    pub const ROOT: FieldPath = FieldPath::new("build.gradle.root");
    pub const PROJECT: FieldPath = FieldPath::new("build.gradle.project");
    pub const TASK: FieldPath = FieldPath::new("build.gradle.task");
    pub const JAVA_HOME: FieldPath = FieldPath::new("build.gradle.java_home");
}

/// `[build.amper]` settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AmperConfig {
    pub root: Option<PathBuf>,
    pub task: Option<String>,
}

impl AmperConfig {
    pub const ROOT: FieldPath = FieldPath::new("build.amper.root");
    pub const TASK: FieldPath = FieldPath::new("build.amper.task");
}

impl BuildSectionConfig {
    /// Resolve relative build roots and java home against the config root.
    pub fn normalize_paths(&mut self, root: &Path) {
        for path in [
            &mut self.gradle.root,
            &mut self.gradle.java_home,
            &mut self.amper.root,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }
}
