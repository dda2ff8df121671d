use serde::Deserialize;
use thiserror::Error;

use capview_platform::Platform;

use crate::version::version_from_tag;

const GITHUB_REPO: &str = "capview/capview";

/// One downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Raw GitHub release payload. Any other shape is a hard parse failure.
#[derive(Debug, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    pub html_url: String,
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Release metadata after tag normalization. Built fresh per update check and
/// discarded once the update decision is made.
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    pub version: String,
    pub release_url: String,
    pub release_notes: String,
    pub assets: Vec<ReleaseAsset>,
}

impl From<GitHubRelease> for ReleaseInfo {
    fn from(release: GitHubRelease) -> Self {
        Self {
            version: version_from_tag(&release.tag_name).to_string(),
            release_url: release.html_url,
            release_notes: release.body.unwrap_or_default(),
            assets: release.assets,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("release feed request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("release feed returned HTTP {status}")]
    HttpStatus { status: reqwest::StatusCode },
    #[error("failed to parse release feed response: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Fetch the latest published release from the feed endpoint.
///
/// Connect/read timeouts are carried by the shared `client`; callers treat any
/// error here as "no update available".
///
/// # Errors
/// Returns an error on transport failure, a non-success status, or a response
/// that does not match the release schema.
pub async fn fetch_latest_release(client: &reqwest::Client) -> Result<ReleaseInfo, FetchError> {
    let url = format!("https://api.github.com/repos/{GITHUB_REPO}/releases/latest");

    let response = client
        .get(&url)
        .header("User-Agent", "capview")
        .send()
        .await
        .map_err(FetchError::Request)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus {
            status: response.status(),
        });
    }

    let release: GitHubRelease = response.json().await.map_err(FetchError::Parse)?;
    Ok(release.into())
}

/// Pick the first asset, in listed order, whose name carries the platform's
/// installer suffix. `None` means the caller must fall back to the release
/// page.
#[must_use]
pub fn select_asset(assets: &[ReleaseAsset], platform: Platform) -> Option<&ReleaseAsset> {
    assets
        .iter()
        .find(|asset| platform.matches_installer(&asset.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            browser_download_url: format!("https://example.com/{name}"),
        }
    }

    #[test]
    fn release_payload_parses_and_normalizes_tag() {
        let payload = r#"{
            "tag_name": "v.1.5.0",
            "html_url": "https://example.com/releases/1.5.0",
            "body": "Fixes",
            "assets": [
                {"name": "capview-setup.exe", "browser_download_url": "https://example.com/capview-setup.exe"}
            ]
        }"#;

        let release: GitHubRelease =
            serde_json::from_str(payload).expect("release payload should parse");
        let info = ReleaseInfo::from(release);

        assert_eq!(info.version, "1.5.0");
        assert_eq!(info.release_url, "https://example.com/releases/1.5.0");
        assert_eq!(info.release_notes, "Fixes");
        assert_eq!(info.assets.len(), 1);
    }

    #[test]
    fn missing_body_and_assets_default() {
        let payload = r#"{"tag_name": "v1.5.0", "html_url": "https://example.com/r"}"#;

        let release: GitHubRelease =
            serde_json::from_str(payload).expect("minimal payload should parse");
        let info = ReleaseInfo::from(release);

        assert_eq!(info.release_notes, "");
        assert!(info.assets.is_empty());
    }

    #[test]
    fn missing_required_fields_fail_to_parse() {
        assert!(serde_json::from_str::<GitHubRelease>(r#"{"html_url": "https://x"}"#).is_err());
        assert!(serde_json::from_str::<GitHubRelease>(r#"{"tag_name": "v1.0.0"}"#).is_err());
    }

    #[test]
    fn select_asset_matches_platform_suffix_regardless_of_order() {
        let assets = vec![asset("capview-1.5.0.dmg"), asset("capview-setup-1.5.0.exe")];

        let selected = select_asset(&assets, Platform::Windows)
            .expect("windows should find the .exe asset");
        assert_eq!(selected.name, "capview-setup-1.5.0.exe");

        let selected =
            select_asset(&assets, Platform::MacOs).expect("macos should find the .dmg asset");
        assert_eq!(selected.name, "capview-1.5.0.dmg");
    }

    #[test]
    fn select_asset_prefers_first_listed_match() {
        let assets = vec![asset("capview-a.pkg"), asset("capview-b.dmg")];

        let selected =
            select_asset(&assets, Platform::MacOs).expect("macos should match either suffix");
        assert_eq!(selected.name, "capview-a.pkg");
    }

    #[test]
    fn select_asset_returns_none_without_match() {
        let assets = vec![asset("capview-1.5.0.AppImage"), asset("checksums.txt")];

        assert!(select_asset(&assets, Platform::Windows).is_none());
        assert!(select_asset(&assets, Platform::MacOs).is_none());
        assert!(select_asset(&assets, Platform::Other).is_none());
    }
}
