//! Notification daemon: D-Bus server plus the serial event loop.

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};
use zbus::fdo::{RequestNameFlags, RequestNameReply};

use super::dbus::{self, NotificationsInterface, BUS_NAME, OBJECT_PATH};
use super::engine::{Engine, EngineSettings, NotifyRequest, Signal};
use super::render::{HeadlessRenderer, MonitorEnumerator, Renderer, StaticMonitors, UiEvent};
use super::state::NotificationId;
use crate::config::Config;
use crate::error::{DaemonError, EngineError};

/// Everything the event loop reacts to, besides timer deadlines.
#[derive(Debug)]
pub enum Event {
    Notify {
        request: NotifyRequest,
        reply: oneshot::Sender<Result<NotificationId, EngineError>>,
    },
    Close {
        id: NotificationId,
        reply: oneshot::Sender<()>,
    },
    Ui(UiEvent),
    Shutdown,
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Run the engine until the event channel closes or `Shutdown` arrives.
///
/// Events and expiries are handled one at a time; signals produced by each
/// step are queued on `signals` before the next step starts.
pub async fn run_loop<R, M>(
    mut engine: Engine<R, M>,
    mut events: mpsc::UnboundedReceiver<Event>,
    signals: mpsc::UnboundedSender<Signal>,
) -> Engine<R, M>
where
    R: Renderer,
    M: MonitorEnumerator<R::Popup>,
{
    loop {
        let deadline = engine.next_deadline();
        tokio::select! {
            event = events.recv() => match event {
                Some(Event::Notify { request, reply }) => {
                    let result = engine.notify(request, Instant::now());
                    // Caller may have given up waiting
                    let _ = reply.send(result);
                }
                Some(Event::Close { id, reply }) => {
                    engine.close_notification(id);
                    let _ = reply.send(());
                }
                Some(Event::Ui(ui)) => engine.handle_ui(ui, Instant::now()),
                Some(Event::Shutdown) | None => break,
            },
            _ = sleep_until(deadline) => engine.expire(Instant::now()),
        }

        for signal in engine.drain_signals() {
            if signals.send(signal).is_err() {
                debug!("Signal receiver gone, dropping signal");
            }
        }
    }

    engine.shutdown();
    engine
}

/// Run the notification daemon until interrupted.
///
/// - Exports `org.freedesktop.Notifications` on the session bus
/// - Claims the well-known name, failing if someone else holds it
/// - Releases all popups on Ctrl-C
pub async fn run(config: Config) -> Result<(), DaemonError> {
    let renderer = HeadlessRenderer::new(config.popup);
    let monitors = StaticMonitors::new(config.monitors.clone());
    let capabilities = renderer.capabilities();
    let engine = Engine::new(
        renderer,
        monitors,
        EngineSettings {
            image_size: config.image_size,
            timeouts: config.timeouts,
        },
    );

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();

    let conn = zbus::connection::Builder::session()?
        .serve_at(
            OBJECT_PATH,
            NotificationsInterface::new(event_tx.clone(), capabilities),
        )?
        .build()
        .await?;

    match conn
        .request_name_with_flags(BUS_NAME, RequestNameFlags::DoNotQueue.into())
        .await
    {
        Ok(RequestNameReply::PrimaryOwner) | Ok(RequestNameReply::AlreadyOwner) => {}
        Ok(_) | Err(zbus::Error::NameTaken) => return Err(DaemonError::NameTaken(BUS_NAME)),
        Err(e) => return Err(e.into()),
    }

    let shutdown_tx = event_tx.clone();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(Event::Shutdown);
    })?;

    info!("D-Bus: {BUS_NAME} on session bus");
    info!(
        "Timeouts: low {}ms, normal {}ms, critical {}ms; image cap {}px",
        config.timeouts.low, config.timeouts.normal, config.timeouts.critical, config.image_size
    );
    info!("Ready. Ctrl+C to stop.");

    let forwarder = tokio::spawn(dbus::forward_signals(conn.clone(), signal_rx));
    run_loop(engine, event_rx, signal_tx).await;

    // run_loop dropped its signal sender; let queued signals drain
    let _ = forwarder.await;
    drop(conn);
    info!("Done.");
    Ok(())
}
