use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File name of the optional project configuration.
pub const CONFIG_FILE_NAME: &str = "leanvm.toml";

/// leanvm.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeanVmConfig {
    #[serde(default)]
    pub harness: HarnessConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Directory (relative to the project) holding every generated artifact
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Container engine CLI
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Compressor run as `<compressor> -9 -k <archive>`, looked up on PATH before use
    #[serde(default = "default_compressor")]
    pub compressor: String,
    /// Suffix the compressor appends to the archive (without the dot).
    /// Derived from the compressor name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_suffix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Elixir builder image
    #[serde(default = "default_builder_image")]
    pub builder_image: String,
    /// Alpine runtime base image
    #[serde(default = "default_runtime_image")]
    pub runtime_image: String,
    /// apk packages installed in the builder stage
    #[serde(default = "default_build_packages")]
    pub build_packages: Vec<String>,
    /// apk packages installed in the runtime stage
    #[serde(default = "default_runtime_packages")]
    pub runtime_packages: Vec<String>,
}

/// The Mix release packaged by the `app` profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Release name (`_build/prod/rel/<name>`, `bin/<name>`)
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Application sources, relative to the project directory
    #[serde(default = "default_app_source_dir")]
    pub source_dir: PathBuf,
    /// Text the release must print on start
    #[serde(default = "default_expected_output")]
    pub expected_output: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            engine: default_engine(),
            compressor: default_compressor(),
            compressed_suffix: None,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            builder_image: default_builder_image(),
            runtime_image: default_runtime_image(),
            build_packages: default_build_packages(),
            runtime_packages: default_runtime_packages(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            source_dir: default_app_source_dir(),
            expected_output: default_expected_output(),
        }
    }
}

impl LeanVmConfig {
    /// Load from leanvm.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.clone(),
                source: e,
            })?;
        toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path,
            source: e,
        })
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_engine() -> String {
    "docker".to_owned()
}

fn default_compressor() -> String {
    "xz".to_owned()
}

fn default_builder_image() -> String {
    "elixir:1.15-alpine".to_owned()
}

fn default_runtime_image() -> String {
    "alpine:3.19".to_owned()
}

fn default_build_packages() -> Vec<String> {
    ["git", "build-base", "nodejs", "npm", "python3"]
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

fn default_runtime_packages() -> Vec<String> {
    ["libstdc++", "openssl", "ncurses-libs", "zlib"]
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

fn default_app_name() -> String {
    "hello_world".to_owned()
}

fn default_app_source_dir() -> PathBuf {
    PathBuf::from("examples/hello_world")
}

fn default_expected_output() -> String {
    "Hello from minimal Elixir VM!".to_owned()
}
