//! Interrupt handling
//!
//! SIGINT and SIGTERM are turned into a one-shot value on a watch channel.
//! The poller checks it at every suspension point instead of being torn down
//! from a signal handler.

use tokio::sync::watch;
use tracing::{info, warn};

/// Source of an external stop request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// SIGINT / Ctrl+C
    UserStop,
    /// SIGTERM from the pipeline agent
    SystemTermination,
}

impl Interrupt {
    pub fn message(&self) -> &'static str {
        match self {
            Interrupt::UserStop => "EXECUTION STATUS: GRACEFUL SHUTDOWN ON USER INTERRUPT.",
            Interrupt::SystemTermination => {
                "EXECUTION STATUS: GRACEFUL SHUTDOWN ON SYSTEM TERMINATION."
            }
        }
    }
}

/// Sending half; only the first interrupt is kept
pub struct ShutdownTrigger {
    tx: watch::Sender<Option<Interrupt>>,
}

impl ShutdownTrigger {
    pub fn trigger(&self, interrupt: Interrupt) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(interrupt);
                true
            } else {
                false
            }
        });
    }
}

/// Receiving half observed by the poller
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<Interrupt>>,
}

impl ShutdownSignal {
    pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
        let (tx, rx) = watch::channel(None);
        (ShutdownTrigger { tx }, ShutdownSignal { rx })
    }

    /// Interrupt already delivered, if any
    pub fn current(&self) -> Option<Interrupt> {
        *self.rx.borrow()
    }

    /// Wait until an interrupt is delivered; never resolves once the sender
    /// is gone without having fired
    pub async fn wait(&mut self) -> Interrupt {
        loop {
            if let Some(interrupt) = *self.rx.borrow_and_update() {
                return interrupt;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Install process signal listeners
pub fn listen_for_signals() -> ShutdownSignal {
    let (trigger, signal) = ShutdownSignal::channel();

    tokio::spawn(async move {
        if let Some(interrupt) = wait_for_signal().await {
            info!("Received {:?} signal", interrupt);
            trigger.trigger(interrupt);
        }
    });

    signal
}

#[cfg(unix)]
async fn wait_for_signal() -> Option<Interrupt> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            return tokio::signal::ctrl_c().await.ok().map(|_| Interrupt::UserStop);
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => Some(Interrupt::UserStop),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}", e);
                terminate.recv().await.map(|_| Interrupt::SystemTermination)
            }
        },
        _ = terminate.recv() => Some(Interrupt::SystemTermination),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Option<Interrupt> {
    match tokio::signal::ctrl_c().await {
        Ok(()) => Some(Interrupt::UserStop),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}", e);
            None
        }
    }
}
