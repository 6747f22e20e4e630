use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{AppConfig, ImageConfig, LeanVmConfig, Profile};

/// Suffix (without the dot) that `compressor -k <file>` gives its output.
///
/// Known compressors map to their conventional extension; any other program
/// is assumed to name its output after itself.
pub fn suffix_for_compressor(compressor: &str) -> String {
    let program = Path::new(compressor)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(compressor);
    let suffix = match program {
        "xz" => "xz",
        "gzip" | "pigz" => "gz",
        "zstd" | "pzstd" => "zst",
        "bzip2" | "pbzip2" | "lbzip2" => "bz2",
        "lz4" => "lz4",
        "lzma" => "lzma",
        other => other,
    };
    suffix.to_owned()
}

/// A command run inside the built image, plus the output it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub label: String,
    pub command: Vec<String>,
    /// Substring stdout must contain. `None` means exit status alone decides.
    pub expect: Option<String>,
}

impl Probe {
    pub fn new<const N: usize>(label: &str, command: [&str; N]) -> Self {
        Self {
            label: label.to_owned(),
            command: command.iter().map(|s| (*s).to_owned()).collect(),
            expect: None,
        }
    }

    pub fn expecting(mut self, text: &str) -> Self {
        self.expect = Some(text.to_owned());
        self
    }

    /// The single success predicate shared by every probe.
    pub fn accepts(&self, exit_ok: bool, stdout: &str) -> bool {
        exit_ok
            && self
                .expect
                .as_deref()
                .is_none_or(|needle| stdout.contains(needle))
    }
}

/// Everything the pipeline needs, resolved up front.
///
/// No stage looks at the process working directory; all paths here are
/// absolute so that several pipelines can run side by side in isolated
/// directories.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSettings {
    pub profile: Profile,
    pub engine: String,
    pub compressor: String,
    /// Extension of the compressor's output, without the dot.
    pub compressed_suffix: String,
    pub work_dir: PathBuf,
    /// Build context handed to the engine.
    pub context_dir: PathBuf,
    pub dockerfile: PathBuf,
    pub image_tag: String,
    pub archive: PathBuf,
    pub images: ImageConfig,
    pub app: AppConfig,
    /// Pass `-i` to `run` (the runtime profile keeps stdin open for `iex`).
    pub interactive: bool,
    /// Directory listings printed before anything else. Never fatal.
    pub listings: Vec<Probe>,
    /// Must pass, otherwise the image is considered broken.
    pub smoke_test: Probe,
    /// Runtime invocations logged for diagnosis only.
    pub diagnostics: Vec<Probe>,
    /// Tried in order until one passes.
    pub fallback_chain: Vec<Probe>,
}

impl PipelineSettings {
    pub fn resolve(
        config: &LeanVmConfig,
        profile: Profile,
        project_dir: &Path,
    ) -> crate::Result<Self> {
        let project_dir =
            std::path::absolute(project_dir).map_err(|e| crate::Error::ProjectDirResolve {
                path: project_dir.to_path_buf(),
                source: e,
            })?;
        let work_dir = project_dir.join(&config.harness.work_dir);

        let context_dir = match profile {
            Profile::Runtime => work_dir.clone(),
            // the release sources live outside the work dir
            Profile::App => project_dir.clone(),
        };

        let smoke_test = Probe::new("shell", ["/bin/sh", "-c", "echo Hello from container"]);

        let (listings, diagnostics, fallback_chain) = match profile {
            Profile::Runtime => (
                vec![
                    Probe::new("binaries", ["ls", "-la", "/usr/local/bin/"]),
                    Probe::new("libraries", ["ls", "-la", "/usr/local/lib/"]),
                ],
                vec![Probe::new("erl version", ["erl", "-version"])],
                vec![
                    Probe::new(
                        "iex",
                        ["iex", "-e", "IO.puts(\"Hello from IEx!\")", "--halt"],
                    )
                    .expecting("Hello"),
                    Probe::new(
                        "erl eval",
                        [
                            "erl",
                            "-noshell",
                            "-eval",
                            "io:format(\"Hello from Erlang~n\"), halt().",
                        ],
                    )
                    .expecting("Hello"),
                ],
            ),
            Profile::App => {
                let app = &config.app.name;
                let release_bin = format!("/app/bin/{app}");
                let via_shell = format!("cd /app && ./bin/{app} start");
                let expected = config.app.expected_output.as_str();
                (
                    vec![
                        Probe::new("app directory", ["ls", "-la", "/app"]),
                        Probe::new("app bin directory", ["ls", "-la", "/app/bin"]),
                    ],
                    Vec::new(),
                    vec![
                        Probe::new("release start", [release_bin.as_str(), "start"])
                            .expecting(expected),
                        Probe::new(
                            "release start via shell",
                            ["/bin/sh", "-c", via_shell.as_str()],
                        )
                        .expecting(expected),
                    ],
                )
            }
        };

        Ok(Self {
            profile,
            engine: config.harness.engine.clone(),
            compressor: config.harness.compressor.clone(),
            compressed_suffix: match &config.harness.compressed_suffix {
                Some(suffix) => suffix.trim_start_matches('.').to_owned(),
                None => suffix_for_compressor(&config.harness.compressor),
            },
            dockerfile: work_dir.join(profile.dockerfile_name()),
            archive: work_dir.join(profile.archive_name()),
            image_tag: profile.image_tag().to_owned(),
            interactive: profile == Profile::Runtime,
            images: config.images.clone(),
            app: config.app.clone(),
            work_dir,
            context_dir,
            listings,
            smoke_test,
            diagnostics,
            fallback_chain,
        })
    }

    /// Sibling of [`archive`](Self::archive) produced by the compressor.
    pub fn compressed_archive(&self) -> PathBuf {
        let mut name = self.archive.clone().into_os_string();
        name.push(".");
        name.push(&self.compressed_suffix);
        PathBuf::from(name)
    }

    /// Every file the pipeline may leave behind, in cleanup order.
    pub fn artifact_paths(&self) -> Vec<PathBuf> {
        vec![
            self.dockerfile.clone(),
            self.archive.clone(),
            self.compressed_archive(),
        ]
    }
}
