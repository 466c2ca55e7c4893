//! Per-connection task.
//!
//! Reads lines from the socket and hands them to the dispatcher; writes
//! whatever the dispatcher queues for this connection. The task ends when
//! the socket closes or the dispatcher drops the connection's sender.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use microirc_proto::{LineCodec, Message, ProtocolError};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use super::Event;
use crate::state::ConnId;

const PING_INTERVAL: Duration = Duration::from_secs(90);
const PING_TIMEOUT: Duration = Duration::from_secs(180);

/// A client connection before it has been handed to the dispatcher.
pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    max_line_len: usize,
}

impl Connection {
    pub fn new(stream: TcpStream, addr: SocketAddr, max_line_len: usize) -> Self {
        Self {
            stream,
            addr,
            max_line_len,
        }
    }

    pub async fn run(self, events: mpsc::UnboundedSender<Event>) {
        let (sender, mut outgoing) = mpsc::unbounded_channel::<Message>();
        let (reply, assigned) = oneshot::channel();
        let connected = Event::Connected {
            host: self.addr.ip().to_string(),
            sender,
            reply,
        };
        if events.send(connected).is_err() {
            warn!(addr = %self.addr, "Dispatcher gone, dropping connection");
            return;
        }
        let Ok(id) = assigned.await else {
            return;
        };

        let mut framed = Framed::new(self.stream, LineCodec::with_max_len(self.max_line_len));
        let reason = event_loop(id, &mut framed, &mut outgoing, &events).await;

        // Flush anything queued before the dispatcher let go (e.g. ERROR).
        while let Ok(msg) = outgoing.try_recv() {
            if framed.send(msg).await.is_err() {
                break;
            }
        }
        info!(conn = %id, addr = %self.addr, reason, "Connection closed");
        let _ = events.send(Event::Closed { id });
    }
}

async fn event_loop(
    id: ConnId,
    framed: &mut Framed<TcpStream, LineCodec>,
    outgoing: &mut mpsc::UnboundedReceiver<Message>,
    events: &mpsc::UnboundedSender<Event>,
) -> &'static str {
    let mut last_activity = Instant::now();
    let mut ping_pending = false;
    let mut ticker = interval(PING_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The framed stream yields `None` once after a decode error, then resumes.
    let mut recovering = false;

    loop {
        tokio::select! {
            incoming = framed.next() => match incoming {
                Some(Ok(line)) => {
                    last_activity = Instant::now();
                    ping_pending = false;
                    if events.send(Event::Line { id, line }).is_err() {
                        return "dispatcher gone";
                    }
                }
                Some(Err(ProtocolError::Io(e))) => {
                    debug!(conn = %id, error = %e, "Read error");
                    return "read error";
                }
                Some(Err(e)) => {
                    warn!(conn = %id, error = %e, "Dropping bad line");
                    recovering = true;
                }
                None if recovering => recovering = false,
                None => return "connection reset by peer",
            },
            msg = outgoing.recv() => match msg {
                Some(msg) => {
                    if let Err(e) = framed.send(msg).await {
                        debug!(conn = %id, error = %e, "Write error");
                        return "write error";
                    }
                }
                None => return "closed by server",
            },
            _ = ticker.tick() => {
                let idle = last_activity.elapsed();
                if idle >= PING_TIMEOUT {
                    return "ping timeout";
                }
                if idle >= PING_INTERVAL && !ping_pending {
                    ping_pending = true;
                    if framed.send(Message::new("PING", ["keepalive"])).await.is_err() {
                        return "write error";
                    }
                }
            }
        }
    }
}
