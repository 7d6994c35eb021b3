//! Termination signals for the binary.
//!
//! The controller itself runs on plain threads; only the wait for a stop
//! signal uses tokio, on a current-thread runtime that lives for the
//! duration of [`block_until_shutdown_signal`].
//!
//! On Unix, SIGINT (Ctrl-C) and SIGTERM (systemd, container runtimes) both
//! stop the controller.  Elsewhere only Ctrl-C is awaited.

use log::info;

#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("SIGNAL | SIGINT received");
        }
        _ = sigterm.recv() => info!("SIGNAL | SIGTERM received"),
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("SIGNAL | Ctrl-C received");
    Ok(())
}

/// Park the calling thread until a termination signal arrives.
pub fn block_until_shutdown_signal() -> std::io::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(wait_for_shutdown_signal())
}
