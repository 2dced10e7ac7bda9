mod chart_sink;
mod cli;
mod console;

use anyhow::{bail, Context};
use clap::Parser;
use ledgerpulse_core::gateway::HttpTransport;
use ledgerpulse_core::session::{
    clear_session, Credentials, KeyringCredentialStore, SessionStatus,
};
use ledgerpulse_core::{ClientConfig, SessionController};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::chart_sink::TerminalChartSink;
use crate::cli::{Cli, Commands};

fn init_logging() -> anyhow::Result<()> {
    // tracing-log forwards the core crate's `log` records
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ledgerpulse_core=info".parse()?),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging()?;

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let store = Arc::new(KeyringCredentialStore::new(config.keyring_service.clone()));

    if cli.command == Some(Commands::Logout) {
        clear_session(store.as_ref())?;
        println!("Stored session removed.");
        return Ok(());
    }

    let transport = Arc::new(HttpTransport::new(&config)?);
    let controller = SessionController::new(
        config,
        transport,
        store,
        Box::new(TerminalChartSink::new()),
    );
    controller.set_view(cli.view.into());

    if controller.is_logged_in() {
        info!("Resuming stored session");
        controller.resume().await;
    } else {
        let (Some(username), Some(password)) = (cli.username, cli.password) else {
            bail!("No stored session; pass --username and --password to log in");
        };
        if let Err(e) = controller.login(Credentials::new(username, password)).await {
            error!("Login failed: {}", e);
            bail!("{}", e);
        }
    }

    if let Some(notice) = console::gate_notice(controller.state().access) {
        println!("{}", notice);
        return Ok(());
    }

    let mut updates = controller.subscribe();
    let mut last_printed = None;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let state = updates.borrow_and_update().clone();
        if state.status == SessionStatus::LoggedOut {
            println!("Session ended. Log in again to continue.");
            break;
        }
        if state.last_refreshed != last_printed {
            console::print_state(&state, controller.config().page_size);
            last_printed = state.last_refreshed;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down; stored session kept");
                controller.shutdown();
                break;
            }
        }
    }

    Ok(())
}
