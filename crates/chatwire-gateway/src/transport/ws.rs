//! WebSocket session handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS and assign a connection id
//! - Outbound queue per connection (bounded mpsc)
//! - Lifecycle: ping keepalive + idle timeout force-disconnect
//! - Decode inbound envelopes and drive the presence tracker / message router
//!
//! The idle timeout is the recovery path for ghost connections (browser
//! crash, network loss): it funnels into the same deregister call as a
//! graceful close, so a stuck client cannot stay "online" forever.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info_span, Instrument};

use chatwire_core::protocol::{ClientEvent, ErrorNotice, ServerEvent};

use crate::app_state::AppState;
use crate::realtime::{Connection, PreparedEvent};
use crate::transport::codec::{decode, Inbound};

const OUTBOUND_QUEUE: usize = 1024;
const IDLE_SWEEP: Duration = Duration::from_millis(250);

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let conn_id = app.next_conn_id();
        let span = info_span!("ws_session", conn = %conn_id);
        run_session(app, conn_id, socket).instrument(span).await;
    })
}

async fn run_session(app: AppState, conn_id: String, socket: WebSocket) {
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                match decode(msg) {
                    Ok(Inbound::Event(ev)) => {
                        handle_event(&app, &conn_id, &out_tx, ev).await;
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Ok(Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        // Malformed or unknown events are dropped, never fatal.
                        debug!(error = %e, "undecodable frame ignored");
                    }
                }
            }

            // keepalive ping
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep(IDLE_SWEEP) => {
                if last_activity.elapsed() >= idle_timeout {
                    debug!("idle timeout, force-disconnecting");
                    break;
                }
            }
        }
    }

    // Disconnect path, shared by graceful close and timeout: the tracker call
    // is idempotent, a connection that never joined is a no-op.
    app.tracker().deregister_connection(&conn_id).await;
    app.hub().rooms().cleanup_conn(&conn_id);
}

async fn handle_event(
    app: &AppState,
    conn_id: &str,
    out_tx: &mpsc::Sender<Message>,
    ev: ClientEvent,
) {
    match ev {
        ClientEvent::Join(p) => {
            let conn = Connection {
                tx: out_tx.clone(),
            };
            app.tracker()
                .register_connection(conn_id, &p.user_id, conn)
                .await;
            // Subscribe to the per-user room once the identity stuck
            // (idempotent on repeat joins).
            if app.hub().registry().user_of(conn_id).as_deref() == Some(p.user_id.as_str()) {
                app.hub().rooms().join(&p.user_id, conn_id);
            }
        }

        ClientEvent::GetOnlineUsers(p) => {
            let contacts = app.directory().contacts_of(&p.requesting_user_id);
            let subset = app
                .tracker()
                .query_online_subset(&p.requesting_user_id, &contacts)
                .await;
            send_direct(out_tx, &ServerEvent::OnlineUsers(subset)).await;
        }

        ClientEvent::SendMessage(p) => {
            // Delivery happens via the room broadcast; only failures come
            // back on this connection.
            if let Err(e) = app.messages().send_message(p).await {
                debug!(error = %e, "message send failed");
                send_direct(
                    out_tx,
                    &ServerEvent::Error(ErrorNotice {
                        code: e.client_code().as_str().to_string(),
                        msg: e.to_string(),
                    }),
                )
                .await;
            }
        }
    }
}

async fn send_direct(out_tx: &mpsc::Sender<Message>, ev: &ServerEvent) {
    match PreparedEvent::prepare(ev) {
        Ok(prepared) => {
            let _ = out_tx.send(prepared.to_ws_message()).await;
        }
        Err(e) => debug!(error = %e, "event encode failed"),
    }
}
