//! eKYC daemon: runs the sandbox provider, or a terminal-hosted handshake.

mod config;
mod shutdown;
mod terminal;

use clap::Parser;
use config::DaemonConfig;
use ekyc_provider::HttpProvider;
use ekyc_sandbox::SandboxServer;
use ekyc_types::{SystemClock, VerificationStatus, VerifiedIdentity};
use ekyc_utils::LogFormat;
use ekyc_verification::{
    EkycHandshake, HandshakeConfig, HandshakeDeps, HostForm, Notice, VerificationError,
};
use shutdown::ShutdownController;
use std::path::PathBuf;
use std::sync::Arc;
use terminal::TerminalOpener;
use tokio::sync::{broadcast, Notify};

#[derive(Parser)]
#[command(name = "ekyc-daemon", about = "eKYC identity-verification handshake tools")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "EKYC_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "EKYC_LOG_FORMAT", global = true)]
    log_format: LogFormat,

    /// Path to a TOML configuration file with optional `[handshake]` and
    /// `[sandbox]` tables. CLI flags and env vars override file settings.
    #[arg(long, env = "EKYC_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Local stand-in for the eKYC provider.
    #[command(name = "sandbox")]
    Sandbox {
        #[command(subcommand)]
        action: SandboxAction,
    },

    /// Run one verification handshake from the terminal.
    #[command(name = "verify")]
    Verify {
        /// Base URL of the eKYC provider API.
        #[arg(long, env = "EKYC_PROVIDER_URL")]
        provider_url: Option<String>,

        /// Origin whose cross-window messages are trusted.
        #[arg(long, env = "EKYC_HOSTING_ORIGIN")]
        hosting_origin: Option<String>,

        /// Give up polling after this many seconds.
        #[arg(long, env = "EKYC_MAX_POLL_SECS")]
        max_poll_secs: Option<u64>,
    },
}

#[derive(clap::Subcommand)]
enum SandboxAction {
    /// Serve the sandbox provider.
    Run {
        #[arg(long, env = "EKYC_SANDBOX_BIND")]
        bind: Option<String>,

        #[arg(long, env = "EKYC_SANDBOX_PORT")]
        port: Option<u16>,

        /// Base URL used in redirect links, when it differs from bind:port.
        #[arg(long, env = "EKYC_SANDBOX_PUBLIC_URL")]
        public_url: Option<String>,

        /// Verify sessions automatically after this many status polls.
        #[arg(long, env = "EKYC_SANDBOX_AUTO_VERIFY")]
        auto_verify_after: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ekyc_utils::init_logging(cli.log_format, &cli.log_level);

    let file_config = DaemonConfig::load(cli.config.as_deref());

    match cli.command {
        Command::Sandbox { action } => match action {
            SandboxAction::Run {
                bind,
                port,
                public_url,
                auto_verify_after,
            } => {
                let mut config = file_config.sandbox;
                if let Some(bind) = bind {
                    config.bind = bind;
                }
                if let Some(port) = port {
                    config.port = port;
                }
                if public_url.is_some() {
                    config.public_url = public_url;
                }
                if auto_verify_after.is_some() {
                    config.auto_verify_after = auto_verify_after;
                }

                tracing::info!(
                    "Starting sandbox eKYC provider on {}:{} (redirects to {})",
                    config.bind,
                    config.port,
                    config.public_url(),
                );

                let controller = Arc::new(ShutdownController::new());
                let notified = controller.notified();
                let signals = controller.clone();
                tokio::spawn(async move { signals.wait_for_signal().await });

                SandboxServer::new(config).start(notified).await?;
                tracing::info!("sandbox provider exited cleanly");
            }
        },
        Command::Verify {
            provider_url,
            hosting_origin,
            max_poll_secs,
        } => {
            let mut config = file_config.handshake;
            if let Some(url) = provider_url {
                config.provider_url = url;
            }
            if let Some(origin) = hosting_origin {
                config.hosting_origin = origin;
            }
            if let Some(secs) = max_poll_secs {
                config.max_poll_duration_secs = secs;
            }
            run_verify(config).await?;
        }
    }

    Ok(())
}

async fn run_verify(config: HandshakeConfig) -> anyhow::Result<()> {
    tracing::info!("Verifying against provider {}", config.provider_url);

    let provider = Arc::new(HttpProvider::with_timeout(
        &config.provider_url,
        config.request_timeout(),
    )?);
    let opener = Arc::new(TerminalOpener::new());
    let (messages, _) = broadcast::channel(16);
    let deps = HandshakeDeps {
        provider,
        windows: opener.clone(),
        clock: Arc::new(SystemClock),
        messages,
    };
    let mut handshake = EkycHandshake::new(&config, deps, ConsoleForm)?;

    let abort = Arc::new(Notify::new());
    let closer = opener.clone();
    let aborter = abort.clone();
    let ctrl_c = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            closer.interrupt(&aborter);
        }
    });

    let result = tokio::select! {
        result = handshake.verify() => result,
        _ = abort.notified() => {
            tracing::info!("interrupted before the verification window opened");
            Err(VerificationError::UserCancelled)
        }
    };
    ctrl_c.abort();
    handshake.dispose();

    match result {
        Ok(identity) => {
            println!("Full name: {}", identity.full_name);
            println!("ID number: {}", identity.id_number);
            println!("Address:   {}", identity.address);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("verification did not complete: {e}")),
    }
}

/// Host form for the terminal: notices are printed, the identity is printed
/// once the handshake returns.
struct ConsoleForm;

impl HostForm for ConsoleForm {
    fn apply_identity(&mut self, identity: &VerifiedIdentity) {
        tracing::debug!(id_number = %identity.id_number, "identity received");
    }

    fn lock_identity_fields(&mut self) {}

    fn unlock_identity_fields(&mut self) {}

    fn show_notice(&mut self, notice: Notice) {
        println!("{notice}");
    }

    fn status_changed(&mut self, status: VerificationStatus) {
        tracing::debug!(%status, "verification status changed");
    }
}
