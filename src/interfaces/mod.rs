pub mod cli;
pub mod console;
pub mod status;

/// Resolves on Ctrl-C. Never resolves when the signal cannot be installed.
pub(crate) async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
