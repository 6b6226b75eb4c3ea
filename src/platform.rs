// Host platform identification

use std::fmt;

/// Operating system a configuration is evaluated for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    FreeBsd,
    OpenBsd,
    Android,
    /// Any identifier not listed above, kept as given (lowercased)
    Other(String),
}

/// Coarse grouping used to key platform-conditional values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    Windows,
    Unix,
}

impl Platform {
    /// Platform of the running host
    pub fn current() -> Self {
        Self::from_identifier(std::env::consts::OS)
    }

    /// Parse a platform identifier.
    ///
    /// Accepts both Node-style names (`win32`, `darwin`) and the names Rust
    /// reports in `std::env::consts::OS` (`windows`, `macos`). Unknown names
    /// become [`Platform::Other`].
    pub fn from_identifier(id: &str) -> Self {
        let id = id.trim().to_ascii_lowercase();
        match id.as_str() {
            "win32" | "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            "darwin" | "macos" => Platform::MacOs,
            "freebsd" => Platform::FreeBsd,
            "openbsd" => Platform::OpenBsd,
            "android" => Platform::Android,
            _ => Platform::Other(id),
        }
    }

    pub fn is_windows_family(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Unrecognized platforms fall into the Unix family.
    pub fn family(&self) -> PlatformFamily {
        if self.is_windows_family() {
            PlatformFamily::Windows
        } else {
            PlatformFamily::Unix
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "win32"),
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "darwin"),
            Platform::FreeBsd => write!(f, "freebsd"),
            Platform::OpenBsd => write!(f, "openbsd"),
            Platform::Android => write!(f, "android"),
            Platform::Other(id) => write!(f, "{}", id),
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformFamily::Windows => write!(f, "windows"),
            PlatformFamily::Unix => write!(f, "unix"),
        }
    }
}
