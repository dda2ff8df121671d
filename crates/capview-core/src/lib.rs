//! Core update logic for capview.
//!
//! This crate provides the non-UI half of the update flow:
//! - Version parsing and fail-closed comparison.
//! - Release-feed fetching and platform asset selection.
//! - The update coordinator that checks, downloads, and launches installers.

mod release;
mod update;
mod version;

/// Release metadata model, fetch helper, and asset selection.
pub use release::{FetchError, GitHubRelease, ReleaseAsset, ReleaseInfo, fetch_latest_release, select_asset};
/// Update flow state machine and its presentation-shell seam.
pub use update::{
    DownloadError, DownloadProgress, LaunchError, UpdateCoordinator, UpdateDecision, UpdateOutcome,
    UpdateShell, UserChoice, cleanup_stale_downloads, launch_installer,
};
/// Version comparison helpers and the bundled version record reader.
pub use version::{
    FALLBACK_VERSION, VersionParseError, is_newer_version, parse_components, version_from_properties,
    version_from_tag,
};
