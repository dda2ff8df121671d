mod logging;
mod session;
mod settings;

use std::time::Duration;

use log::info;

use capview_core::{UpdateCoordinator, cleanup_stale_downloads, version_from_properties};
use capview_platform::{AppPaths, Platform};

use crate::session::TerminalShell;
use crate::settings::AppSettings;

const VERSION_PROPERTIES: &str = include_str!("../resources/version.properties");

#[tokio::main]
async fn main() {
    let settings = AppSettings::load();
    logging::init_logging(settings.debug_logging, settings.max_log_size_bytes);

    let current_version = version_from_properties(VERSION_PROPERTIES);
    info!("capview {current_version} starting");
    println!("capview v{current_version}");

    // The update gate runs to completion before caption loading opens up.
    if settings.check_updates {
        println!("Checking for updates...");

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.http_timeout_secs))
            .read_timeout(Duration::from_secs(settings.http_timeout_secs))
            .user_agent(format!("capview/{current_version}"))
            .build()
            .unwrap_or_default();

        let download_dir = AppPaths::new()
            .map(|paths| paths.download_dir())
            .unwrap_or_else(|_| std::env::temp_dir().join("capview"));
        cleanup_stale_downloads(&download_dir);

        let coordinator = UpdateCoordinator::new(
            client,
            Platform::current(),
            &current_version,
            download_dir,
        );
        let outcome = coordinator.run(&TerminalShell).await;
        session::render_outcome(&outcome);
    }

    session::run_caption_session().await;
}
