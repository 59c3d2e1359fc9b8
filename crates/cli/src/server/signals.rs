use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warden_dns_application::use_cases::PrintConfigurationUseCase;

/// SIGUSR1 dumps the chain configuration; SIGINT and SIGTERM cancel `shutdown`.
pub fn spawn_signal_handlers(
    print_configuration: Arc<PrintConfigurationUseCase>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut usr1 = signal(SignalKind::user_defined1())?;
        let diagnostics_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = diagnostics_shutdown.cancelled() => break,
                    received = usr1.recv() => {
                        if received.is_none() {
                            break;
                        }
                        print_configuration.execute();
                    }
                }
            }
        });

        let mut term = signal(SignalKind::terminate())?;
        let term_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if term.recv().await.is_some() {
                info!("Received SIGTERM, shutting down");
                term_shutdown.cancel();
            }
        });
    }

    #[cfg(not(unix))]
    drop(print_configuration);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT, shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!(error = %e, "Cannot listen for SIGINT"),
        }
    });

    Ok(())
}
