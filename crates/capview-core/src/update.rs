use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use capview_platform::Platform;

use crate::release::{FetchError, ReleaseInfo, fetch_latest_release, select_asset};
use crate::version::is_newer_version;

/// Outcome of a completed update check, shown to the user before anything is
/// downloaded.
#[derive(Debug, Clone)]
pub struct UpdateDecision {
    pub current_version: String,
    pub latest_version: String,
    pub release_url: String,
    pub release_notes: String,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
    Accept,
    Decline,
}

/// Byte-level download progress as reported by the download task.
#[derive(Debug, Clone, Copy)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: u64,
}

impl DownloadProgress {
    /// Integer percentage; zero while the total size is unknown.
    #[must_use]
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = self.downloaded.saturating_mul(100) / self.total;
        u8::try_from(percent.min(100)).unwrap_or(100)
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed with status {status}")]
    HttpStatus { status: reqwest::StatusCode },
    #[error("download task failed: {details}")]
    Task { details: String },
}

impl DownloadError {
    fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal state of one update flow. Every variant means "continue startup";
/// the shell decides which ones deserve a visible notice.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The published version is not newer than the running one.
    UpToDate,
    /// Fetching or parsing release metadata failed. Logged, never surfaced.
    CheckFailed,
    /// The user saw the update and declined it.
    Declined,
    /// No installer asset for this platform; the release page was opened in
    /// the default browser instead.
    ReleasePageOpened,
    /// Opening the release page failed; the URL is kept for a manual fallback.
    ReleasePageFailed { release_url: String },
    /// The installer was downloaded and handed to the OS open handler.
    InstallerLaunched { installer: PathBuf },
    DownloadFailed(DownloadError),
    /// The installer downloaded fine but could not be opened; the path lets
    /// the shell point the user at the file.
    LaunchFailed {
        installer: PathBuf,
        error: LaunchError,
    },
}

/// Presentation-shell seam for the update flow. Implementations render; the
/// coordinator decides.
#[async_trait]
pub trait UpdateShell: Send + Sync {
    /// Present an available update and return the user's choice.
    async fn on_update_available(&self, decision: &UpdateDecision) -> UserChoice;

    /// Latest download percentage. Values arrive non-decreasing and already
    /// coalesced; only the newest needs to be rendered.
    async fn on_download_progress(&self, percent: u8);
}

/// Drives one update check/download/launch flow for a single application
/// session. Holds no cross-session state.
pub struct UpdateCoordinator {
    client: reqwest::Client,
    platform: Platform,
    current_version: String,
    download_dir: PathBuf,
}

impl UpdateCoordinator {
    pub fn new(
        client: reqwest::Client,
        platform: Platform,
        current_version: impl Into<String>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            platform,
            current_version: current_version.into(),
            download_dir,
        }
    }

    /// Check the release feed for a version newer than the running one.
    ///
    /// # Errors
    /// Returns an error when the feed cannot be fetched or parsed.
    pub async fn check(&self) -> Result<Option<UpdateDecision>, FetchError> {
        let release = fetch_latest_release(&self.client).await?;
        Ok(self.decision_for(release))
    }

    fn decision_for(&self, release: ReleaseInfo) -> Option<UpdateDecision> {
        if !is_newer_version(&release.version, &self.current_version) {
            debug!(
                "No update: latest {} vs current {}",
                release.version, self.current_version
            );
            return None;
        }

        let download_url = select_asset(&release.assets, self.platform)
            .map(|asset| asset.browser_download_url.clone());

        Some(UpdateDecision {
            current_version: self.current_version.clone(),
            latest_version: release.version,
            release_url: release.release_url,
            release_notes: release.release_notes,
            download_url,
        })
    }

    /// Run the whole update flow to its terminal state.
    ///
    /// Every failure is absorbed into an [`UpdateOutcome`] variant; this never
    /// errors and never blocks application startup beyond its own duration.
    pub async fn run(&self, shell: &dyn UpdateShell) -> UpdateOutcome {
        let decision = match self.check().await {
            Ok(Some(decision)) => decision,
            Ok(None) => return UpdateOutcome::UpToDate,
            Err(error) => {
                info!("Update check failed, continuing startup: {error}");
                return UpdateOutcome::CheckFailed;
            }
        };

        info!(
            "Update available: {} -> {}",
            decision.current_version, decision.latest_version
        );

        if shell.on_update_available(&decision).await == UserChoice::Decline {
            return UpdateOutcome::Declined;
        }

        let Some(url) = decision.download_url.clone() else {
            // No installer for this platform; the release page is the
            // download path.
            return match open::that(&decision.release_url) {
                Ok(()) => UpdateOutcome::ReleasePageOpened,
                Err(error) => {
                    warn!("Failed to open release page: {error}");
                    UpdateOutcome::ReleasePageFailed {
                        release_url: decision.release_url,
                    }
                }
            };
        };

        let installer = match self.download(&url, shell).await {
            Ok(installer) => installer,
            Err(error) => {
                warn!("Installer download failed: {error}");
                return UpdateOutcome::DownloadFailed(error);
            }
        };

        match launch_installer(&installer) {
            Ok(()) => UpdateOutcome::InstallerLaunched { installer },
            Err(error) => {
                warn!("Installer launch failed: {error}");
                UpdateOutcome::LaunchFailed { installer, error }
            }
        }
    }

    /// Stream the installer to a kept temp directory, forwarding coalesced
    /// percentages to the shell as chunks arrive.
    async fn download(
        &self,
        url: &str,
        shell: &dyn UpdateShell,
    ) -> Result<PathBuf, DownloadError> {
        std::fs::create_dir_all(&self.download_dir)
            .map_err(|error| DownloadError::io("failed to create download directory", error))?;
        let temp_dir = tempfile::tempdir_in(&self.download_dir)
            .map_err(|error| DownloadError::io("failed to create temp directory", error))?;
        let dest = temp_dir.path().join(installer_file_name(url));

        info!("Downloading update from {url}");

        let (tx, mut rx) = mpsc::channel(32);
        let client = self.client.clone();
        let url = url.to_string();
        let target = dest.clone();
        let download_task =
            tokio::spawn(async move { download_installer(&client, &url, &target, &tx).await });

        let mut last_percent = None;
        while let Some(progress) = rx.recv().await {
            let percent = progress.percent();
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                shell.on_download_progress(percent).await;
            }
        }

        match download_task.await {
            Ok(Ok(())) => {
                // The installer now belongs to the OS open handler; keep the
                // temp directory alive past this scope.
                let _ = temp_dir.keep();
                Ok(dest)
            }
            Ok(Err(error)) => Err(error),
            Err(error) => Err(DownloadError::Task {
                details: format!("download task panicked: {error}"),
            }),
        }
    }
}

/// Hand a downloaded installer to the platform's default open/execute
/// handler.
///
/// # Errors
/// Returns an error when the OS handler cannot be invoked; the file itself is
/// left in place.
pub fn launch_installer(path: &Path) -> Result<(), LaunchError> {
    info!("Launching installer: {}", path.display());
    open::that(path).map_err(|source| LaunchError::Open {
        path: path.to_path_buf(),
        source,
    })
}

async fn download_installer(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: &mpsc::Sender<DownloadProgress>,
) -> Result<(), DownloadError> {
    use futures_util::StreamExt;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| DownloadError::http("download request failed", error))?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            status: response.status(),
        });
    }

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|error| DownloadError::io("failed to create download file", error))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| DownloadError::http("download stream error", error))?;
        file.write_all(&chunk)
            .await
            .map_err(|error| DownloadError::io("failed to write download data", error))?;
        downloaded += chunk.len() as u64;
        let _ = progress.send(DownloadProgress { downloaded, total }).await;
    }

    file.flush()
        .await
        .map_err(|error| DownloadError::io("failed to flush download file", error))?;

    info!("Download complete: {downloaded} bytes");
    Ok(())
}

/// Remove leftover temp directories from downloads that earlier sessions
/// never cleaned up (the directory is kept once an installer is handed to the
/// OS handler).
pub fn cleanup_stale_downloads(download_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(download_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && entry.file_name().to_string_lossy().starts_with(".tmp") {
            debug!("Removing stale download dir: {}", path.display());
            let _ = std::fs::remove_dir_all(&path);
        }
    }
}

/// Derive a local file name from the download URL, refusing empty or
/// path-traversing candidates.
fn installer_file_name(url: &str) -> String {
    let raw_name = url.rsplit('/').next().unwrap_or("capview-installer");
    Path::new(raw_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && !name.contains(".."))
        .unwrap_or("capview-installer")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ReleaseAsset;

    fn coordinator(platform: Platform, current: &str) -> UpdateCoordinator {
        UpdateCoordinator::new(
            reqwest::Client::new(),
            platform,
            current,
            std::env::temp_dir().join("capview-update-tests"),
        )
    }

    fn release(version: &str, asset_names: &[&str]) -> ReleaseInfo {
        ReleaseInfo {
            version: version.to_string(),
            release_url: "https://example.com/releases/latest".to_string(),
            release_notes: String::new(),
            assets: asset_names
                .iter()
                .map(|name| ReleaseAsset {
                    name: (*name).to_string(),
                    browser_download_url: format!("https://example.com/{name}"),
                })
                .collect(),
        }
    }

    #[test]
    fn decision_resolves_platform_asset() {
        let coordinator = coordinator(Platform::Windows, "1.4.2");
        let decision = coordinator
            .decision_for(release("1.5.0", &["capview-1.5.0.dmg", "capview-setup.exe"]))
            .expect("newer release should produce a decision");

        assert_eq!(decision.latest_version, "1.5.0");
        assert_eq!(decision.current_version, "1.4.2");
        assert_eq!(
            decision.download_url.as_deref(),
            Some("https://example.com/capview-setup.exe")
        );
    }

    #[test]
    fn decision_without_platform_asset_keeps_release_page_fallback() {
        let coordinator = coordinator(Platform::Other, "1.4.2");
        let decision = coordinator
            .decision_for(release("1.5.0", &["capview-setup.exe"]))
            .expect("newer release should produce a decision");

        assert!(decision.download_url.is_none());
        assert_eq!(decision.release_url, "https://example.com/releases/latest");
    }

    #[test]
    fn equal_or_older_release_yields_no_decision() {
        let coordinator = coordinator(Platform::Windows, "1.4.2");

        assert!(coordinator.decision_for(release("1.4.2", &[])).is_none());
        assert!(coordinator.decision_for(release("1.4.0", &[])).is_none());
        assert!(coordinator.decision_for(release("not-a-version", &[])).is_none());
    }

    #[test]
    fn percent_is_monotonic_and_ends_at_one_hundred() {
        let total = 1000;
        let mut last = 0;
        for downloaded in (0..=total).step_by(80) {
            let percent = DownloadProgress { downloaded, total }.percent();
            assert!(percent >= last, "progress went backwards at {downloaded}");
            last = percent;
        }
        assert_eq!(DownloadProgress { downloaded: total, total }.percent(), 100);
    }

    #[test]
    fn percent_handles_unknown_and_overshot_totals() {
        assert_eq!(DownloadProgress { downloaded: 500, total: 0 }.percent(), 0);
        assert_eq!(DownloadProgress { downloaded: 150, total: 100 }.percent(), 100);
    }

    #[test]
    fn installer_file_name_uses_url_basename() {
        assert_eq!(
            installer_file_name("https://example.com/dl/capview-setup-1.5.0.exe"),
            "capview-setup-1.5.0.exe"
        );
    }

    #[test]
    fn installer_file_name_rejects_unsafe_candidates() {
        assert_eq!(installer_file_name("https://example.com/dl/"), "capview-installer");
        assert_eq!(
            installer_file_name("https://example.com/dl/..%2f"),
            "capview-installer"
        );
    }

    #[test]
    fn cleanup_removes_only_stale_temp_dirs() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        let stale = root.path().join(".tmpabc123");
        let unrelated = root.path().join("notes");
        std::fs::create_dir(&stale).expect("stale dir should be created");
        std::fs::create_dir(&unrelated).expect("unrelated dir should be created");

        cleanup_stale_downloads(root.path());

        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn cleanup_tolerates_missing_download_dir() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        cleanup_stale_downloads(&root.path().join("absent"));
    }
}
