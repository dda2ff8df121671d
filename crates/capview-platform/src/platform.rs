/// OS family the application is running on, as far as installer selection is
/// concerned. Only Windows and macOS releases ship installer assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }

    /// Map a free-form OS name (for example `"windows"`, `"Mac OS X"`) to a
    /// platform family.
    #[must_use]
    pub fn from_os_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("win") {
            Self::Windows
        } else if name.contains("mac") {
            Self::MacOs
        } else {
            Self::Other
        }
    }

    /// Installer file-name suffixes this platform can execute directly.
    #[must_use]
    pub fn installer_suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &[".exe"],
            Self::MacOs => &[".pkg", ".dmg"],
            Self::Other => &[],
        }
    }

    /// Whether an asset file name looks like an installer for this platform.
    /// Matching is case-insensitive on the suffix.
    #[must_use]
    pub fn matches_installer(self, asset_name: &str) -> bool {
        let name = asset_name.to_ascii_lowercase();
        self.installer_suffixes()
            .iter()
            .any(|suffix| name.ends_with(suffix))
    }
}
