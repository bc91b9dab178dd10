use std::path::PathBuf;

use anyhow::Context;
use gdrive_core::DriveClient;
use gdrive_mirror::config::MirrorConfig;
use gdrive_mirror::logging;
use gdrive_mirror::sync::calendar::Cursor;
use gdrive_mirror::sync::engine::SyncEngine;
use gdrive_mirror::sync::materializer::TransferClient;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Run { root: Option<PathBuf> },
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut root = None;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliMode::Help),
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => {
                if root.is_some() {
                    anyhow::bail!("unexpected extra argument: {other}");
                }
                root = Some(PathBuf::from(other));
            }
        }
    }
    Ok(CliMode::Run { root })
}

// Single-threaded runtime: the walk is sequential, and the local UTC offset
// can only be read while the process has one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let root = match parse_cli_mode(std::env::args())? {
        CliMode::Help => {
            println!("Usage: gdrive-mirror [ROOT]");
            println!("  ROOT   Local archive directory (default: $GDRIVE_MIRROR_DIR)");
            return Ok(());
        }
        CliMode::Run { root } => root,
    };
    let today = Cursor::today();
    logging::init();

    let config = MirrorConfig::from_env(root)?;
    let drive = DriveClient::with_base_url(&config.api_base_url, config.api_key.clone())
        .context("invalid GDRIVE_API_BASE_URL")?;
    let transfer = TransferClient::new(drive.clone()).with_policy(config.status_policy);
    let engine = SyncEngine::new(drive, transfer, config.local_root, config.root_folder_id);

    engine
        .run_from(today)
        .await
        .into_result()
        .context("archive sync aborted")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_cli_mode_defaults_to_run_without_root() {
        let mode = parse_cli_mode(args(&["gdrive-mirror"])).unwrap();
        assert_eq!(mode, CliMode::Run { root: None });
    }

    #[test]
    fn parse_cli_mode_takes_positional_root() {
        let mode = parse_cli_mode(args(&["gdrive-mirror", "/srv/archive"])).unwrap();
        assert_eq!(
            mode,
            CliMode::Run {
                root: Some(PathBuf::from("/srv/archive"))
            }
        );
    }

    #[test]
    fn parse_cli_mode_supports_help() {
        let mode = parse_cli_mode(args(&["gdrive-mirror", "--help"])).unwrap();
        assert_eq!(mode, CliMode::Help);
    }

    #[test]
    fn parse_cli_mode_rejects_unknown_flags_and_extra_args() {
        assert!(parse_cli_mode(args(&["gdrive-mirror", "--verbose"])).is_err());
        assert!(parse_cli_mode(args(&["gdrive-mirror", "/a", "/b"])).is_err());
    }
}
