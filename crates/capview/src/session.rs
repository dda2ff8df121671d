use std::io::Write as _;
use std::path::Path;

use async_trait::async_trait;
use log::warn;

use capview_core::{UpdateDecision, UpdateOutcome, UpdateShell, UserChoice};
use capview_docx::CaptionSet;

/// Line-oriented presentation shell. Rendering only; every decision beyond
/// accept/decline lives in the coordinator.
pub struct TerminalShell;

#[async_trait]
impl UpdateShell for TerminalShell {
    async fn on_update_available(&self, decision: &UpdateDecision) -> UserChoice {
        println!();
        println!("A new version is available.");
        println!("  Current version: {}", decision.current_version);
        println!("  New version:     {}", decision.latest_version);
        let notes = decision.release_notes.trim();
        if !notes.is_empty() {
            println!();
            println!("{notes}");
        }
        println!();

        match read_line("Download the update now? [y/N] ").await {
            Some(answer)
                if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") =>
            {
                UserChoice::Accept
            }
            _ => UserChoice::Decline,
        }
    }

    async fn on_download_progress(&self, percent: u8) {
        print!("\rDownloading update... {percent:>3}%");
        let _ = std::io::stdout().flush();
    }
}

/// Render the terminal state of the update flow. Check failures stay silent
/// here; they are already logged and must not delay startup.
pub fn render_outcome(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate | UpdateOutcome::CheckFailed | UpdateOutcome::Declined => {}
        UpdateOutcome::ReleasePageOpened => {
            println!("Opened the release page in your browser.");
        }
        UpdateOutcome::ReleasePageFailed { release_url } => {
            println!("Could not open the browser. Download the update manually:");
            println!("  {release_url}");
        }
        UpdateOutcome::InstallerLaunched { .. } => {
            println!();
            println!("Download complete. The installer has been opened.");
            println!("Please close capview before installing the update.");
        }
        UpdateOutcome::DownloadFailed(error) => {
            println!();
            println!("Failed to download the update: {error}");
        }
        UpdateOutcome::LaunchFailed { installer, error } => {
            println!();
            println!("Could not open the installer: {error}");
            println!("Run it manually from: {}", installer.display());
        }
    }
}

/// Interactive caption loop: load a document, then step through its captions.
pub async fn run_caption_session() {
    println!();
    println!("Commands: load <file.docx> | next | prev | show | quit");

    let mut captions: Option<CaptionSet> = None;

    loop {
        let Some(line) = read_line("> ").await else {
            break;
        };

        let (command, argument) = match line.split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "" => {}
            "load" if !argument.is_empty() => {
                // A failed or empty load keeps the previous caption set.
                match CaptionSet::load(Path::new(argument)) {
                    Ok(loaded) if loaded.is_empty() => {
                        println!("No captions found in the file.");
                    }
                    Ok(loaded) => {
                        println!("Loaded {} captions.", loaded.len());
                        captions = Some(loaded);
                        show_current(captions.as_ref());
                    }
                    Err(error) => {
                        warn!("Caption load failed: {error}");
                        println!("Failed to load captions: {error}");
                    }
                }
            }
            "next" | "n" => {
                if let Some(set) = captions.as_mut() {
                    set.next_caption();
                }
                show_current(captions.as_ref());
            }
            "prev" | "p" => {
                if let Some(set) = captions.as_mut() {
                    set.previous_caption();
                }
                show_current(captions.as_ref());
            }
            "show" => show_current(captions.as_ref()),
            "quit" | "q" => break,
            _ => println!("Commands: load <file.docx> | next | prev | show | quit"),
        }
    }
}

fn show_current(captions: Option<&CaptionSet>) {
    let current = captions.and_then(|set| {
        set.position()
            .zip(set.current())
            .map(|(position, caption)| (position, set.len(), caption))
    });

    match current {
        Some((position, total, caption)) => println!("[{}/{total}] {caption}", position + 1),
        None => println!("No captions loaded."),
    }
}

/// Prompt and read one trimmed line from stdin off the interactive task.
/// `None` means end of input.
async fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = std::io::stdout().flush();

    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    })
    .await
    .ok()
    .flatten()
}
