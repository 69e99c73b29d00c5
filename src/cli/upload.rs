//! TUI-less "upload" command

use std::error::Error;
use std::path::PathBuf;

use crate::cli::say::reveal_to_stdout;
use crate::core::backend::BackendClient;
use crate::core::config::Config;
use crate::core::controller::{ChatController, OperationStatus};
use crate::core::executor::CommandExecutor;

pub async fn run_upload(path: PathBuf, config: &Config) -> Result<(), Box<dyn Error>> {
    let backend = BackendClient::new(config.base_url(), config.request_timeout())?;
    let (executor, rx) =
        CommandExecutor::new(backend, config.reveal_interval(), config.download_dir());
    let mut controller = ChatController::new(config.cancel_scope());

    executor.dispatch(controller.pick_file(Some(path)));
    if let Some(attachment) = controller.messages().first() {
        println!("{}", attachment.content);
    }

    let controller = reveal_to_stdout(controller, executor, rx).await?;

    for saved in controller.saved_downloads() {
        println!("💾 Summary saved to {}", saved.display());
    }

    let failed = controller
        .last_result()
        .is_some_and(|result| result.status == OperationStatus::Failed);
    if failed || controller.saved_downloads().is_empty() {
        if let Some(notice) = controller.notice() {
            eprintln!("❌ {notice}");
        }
        std::process::exit(1);
    }
    Ok(())
}
