use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    MacOs,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Arm64,
    Armv7,
}

impl Os {
    pub fn as_str(self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::MacOs => "macos",
            Os::Linux => "linux",
        }
    }

    fn from_consts(os: &str) -> Option<Self> {
        match os {
            "windows" => Some(Os::Windows),
            "macos" => Some(Os::MacOs),
            "linux" => Some(Os::Linux),
            _ => None,
        }
    }
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::Armv7 => "armv7",
        }
    }

    fn from_consts(arch: &str) -> Option<Self> {
        match arch {
            "x86_64" => Some(Arch::X64),
            "aarch64" => Some(Arch::Arm64),
            "arm" => Some(Arch::Armv7),
            _ => None,
        }
    }
}

/// The OS/architecture pair a Tailwind standalone build is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    os: Os,
    arch: Arch,
}

impl PlatformKey {
    /// Validate a pair against the published builds. armv7 only ships for Linux.
    pub fn new(os: Os, arch: Arch) -> Result<Self> {
        match (os, arch) {
            (Os::Windows | Os::MacOs | Os::Linux, Arch::X64 | Arch::Arm64)
            | (Os::Linux, Arch::Armv7) => Ok(Self { os, arch }),
            (Os::Windows | Os::MacOs, Arch::Armv7) => Err(unsupported(os.as_str(), arch.as_str())),
        }
    }

    /// Detect the platform this process runs on.
    pub fn detect() -> Result<Self> {
        let os = std::env::consts::OS;
        let arch = std::env::consts::ARCH;
        tracing::trace!("Detecting platform from OS '{}', ARCH '{}'", os, arch);

        match (Os::from_consts(os), Arch::from_consts(arch)) {
            (Some(os), Some(arch)) => Self::new(os, arch),
            _ => Err(unsupported(os, arch)),
        }
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// `tailwindcss-{os}-{arch}`, with `.exe` on Windows.
    pub fn artifact_file_name(&self) -> String {
        let name = format!("tailwindcss-{}-{}", self.os.as_str(), self.arch.as_str());
        if self.os == Os::Windows {
            format!("{}.exe", name)
        } else {
            name
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

/// Artifact file name for the current platform.
pub fn resolve() -> Result<String> {
    PlatformKey::detect().map(|key| key.artifact_file_name())
}

fn unsupported(os: &str, arch: &str) -> Error {
    Error::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    }
}
