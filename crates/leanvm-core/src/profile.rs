use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which image the harness builds and verifies.
///
/// - `Runtime`: bare Erlang/Elixir runtime on Alpine, verified through `iex`/`erl`.
/// - `App`: the runtime plus a Mix release, verified by starting the release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Runtime,
    App,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Runtime, Profile::App];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::App => "app",
        }
    }

    pub fn dockerfile_name(self) -> &'static str {
        match self {
            Self::Runtime => "Dockerfile",
            Self::App => "Dockerfile.app",
        }
    }

    pub fn image_tag(self) -> &'static str {
        match self {
            Self::Runtime => "elixir-lean-vm-test",
            Self::App => "elixir-lean-vm-hello",
        }
    }

    pub fn archive_name(self) -> &'static str {
        match self {
            Self::Runtime => "alpine-vm-test.tar",
            Self::App => "alpine-vm-hello.tar",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "runtime" => Ok(Self::Runtime),
            "app" => Ok(Self::App),
            other => Err(crate::Error::UnknownProfile(other.to_owned())),
        }
    }
}
