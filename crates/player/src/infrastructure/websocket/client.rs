//! STOMP-over-WebSocket client using tokio-tungstenite

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::COOKIE, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use galaxytalk_shared::stomp::{self, Command, Frame, Inbound};

use crate::infrastructure::messaging::ConnectionState;

use super::core::{
    outgoing_heartbeat_ms, BackoffState, SubscriptionRegistry, CLIENT_HEARTBEAT_MS,
    MAX_RETRY_ATTEMPTS,
};

/// How long to wait for CONNECTED after the socket opens.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type MessageCallback = Box<dyn Fn(&str, &str) + Send + Sync>;
type StateCallback = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// Yields the `Cookie` header for the next handshake. Asked again on every
/// reconnect so a refreshed session is picked up.
pub type CookieSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Broker client for the match service (Desktop)
///
/// Subscriptions are registered up front and replayed on every (re)connect.
/// MESSAGE bodies are handed to the `on_message` callback together with the
/// destination they arrived on.
pub struct StompClient {
    url: String,
    host: String,
    cookies: Option<CookieSource>,
    state: Arc<RwLock<ConnectionState>>,
    tx: Arc<Mutex<Option<mpsc::Sender<Message>>>>,
    on_message: Arc<Mutex<Option<MessageCallback>>>,
    on_state_change: Arc<Mutex<Option<StateCallback>>>,
    subscriptions: Arc<Mutex<SubscriptionRegistry>>,
    /// Flag to track if disconnect was intentional (vs unexpected close)
    intentional_disconnect: Arc<RwLock<bool>>,
}

impl StompClient {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let host = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());
        Self {
            url,
            host,
            cookies: None,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            tx: Arc::new(Mutex::new(None)),
            on_message: Arc::new(Mutex::new(None)),
            on_state_change: Arc::new(Mutex::new(None)),
            subscriptions: Arc::new(Mutex::new(SubscriptionRegistry::default())),
            intentional_disconnect: Arc::new(RwLock::new(false)),
        }
    }

    pub fn with_cookies(mut self, cookies: CookieSource) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Upgrade request for the broker endpoint, carrying the session cookie.
    fn handshake_request(
        &self,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = self.url.as_str().into_client_request()?;
        if let Some(cookie) = self.cookies.as_ref().and_then(|source| source()) {
            request
                .headers_mut()
                .insert(COOKIE, HeaderValue::from_str(&cookie)?);
        }
        Ok(request)
    }

    pub async fn set_on_message<F>(&self, callback: F)
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        let mut on_message = self.on_message.lock().await;
        *on_message = Some(Box::new(callback));
    }

    pub async fn set_on_state_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let mut on_state_change = self.on_state_change.lock().await;
        *on_state_change = Some(Box::new(callback));
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    async fn set_state(&self, new_state: ConnectionState) {
        {
            let mut state = self.state.write().await;
            *state = new_state;
        }

        let callback = self.on_state_change.lock().await;
        if let Some(ref cb) = *callback {
            cb(new_state);
        }
    }

    /// Register a destination. Sent immediately when connected, and on every reconnect.
    pub async fn subscribe(&self, destination: &str) -> Result<String> {
        let mut registry = self.subscriptions.lock().await;
        let id = registry.register(destination);
        let tx = self.tx.lock().await.clone();
        if let Some(tx) = tx {
            tx.send(frame_message(&Frame::subscribe(&id, destination)))
                .await?;
        }
        tracing::debug!(subscription = %id, destination, "Subscribed");
        Ok(id)
    }

    /// Internal connect logic - returns whether connection closed unexpectedly
    async fn connect_internal(&self) -> Result<bool> {
        self.set_state(ConnectionState::Connecting).await;

        let request = self.handshake_request()?;
        let (ws_stream, _) = match connect_async(request).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!("Failed to connect to broker at {}: {}", self.url, e);
                return Err(e.into());
            }
        };
        let (mut write, mut read) = ws_stream.split();

        write
            .send(frame_message(&Frame::connect(&self.host, CLIENT_HEARTBEAT_MS)))
            .await?;
        let (server_sends, server_expects) =
            match tokio::time::timeout(CONNECT_TIMEOUT, await_connected(&mut read)).await {
                Ok(result) => result?,
                Err(_) => return Err(anyhow!("Timed out waiting for CONNECTED")),
            };

        tracing::info!(url = %self.url, "STOMP session established");
        self.set_state(ConnectionState::Connected).await;

        let (tx, mut rx) = mpsc::channel::<Message>(32);
        {
            // Replay subscriptions and publish the sender under the registry lock
            // so a concurrent subscribe() is neither lost nor sent twice.
            let registry = self.subscriptions.lock().await;
            for (id, destination) in registry.entries() {
                write
                    .send(frame_message(&Frame::subscribe(id, destination)))
                    .await?;
            }
            *self.tx.lock().await = Some(tx);
        }

        let outgoing = outgoing_heartbeat_ms(CLIENT_HEARTBEAT_MS.0, server_expects);
        // Allow the server twice its period before declaring the link dead.
        let read_deadline = outgoing_heartbeat_ms(server_sends, CLIENT_HEARTBEAT_MS.1)
            .map(|ms| Duration::from_millis(ms * 2));

        let on_message = Arc::clone(&self.on_message);
        let state = Arc::clone(&self.state);
        let on_state_change = Arc::clone(&self.on_state_change);
        let subscriptions = Arc::clone(&self.subscriptions);
        let intentional_disconnect = Arc::clone(&self.intentional_disconnect);

        let mut read_handle = tokio::spawn(async move {
            let mut unexpected_close = false;
            loop {
                let next = match read_deadline {
                    Some(deadline) => match tokio::time::timeout(deadline, read.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            tracing::warn!(
                                "No traffic from broker for {:?}, treating link as lost",
                                deadline
                            );
                            unexpected_close = true;
                            break;
                        }
                    },
                    None => read.next().await,
                };

                match next {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&text, &subscriptions, &on_message).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Broker closed connection");
                        unexpected_close = !*intentional_disconnect.read().await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        unexpected_close = !*intentional_disconnect.read().await;
                        break;
                    }
                    None => {
                        unexpected_close = !*intentional_disconnect.read().await;
                        break;
                    }
                }
            }

            {
                let mut s = state.write().await;
                *s = ConnectionState::Disconnected;
            }
            {
                let callback = on_state_change.lock().await;
                if let Some(ref cb) = *callback {
                    cb(ConnectionState::Disconnected);
                }
            }

            unexpected_close
        });

        let mut write_handle = tokio::spawn(async move {
            let mut ticker = outgoing.map(|ms| {
                let period = Duration::from_millis(ms);
                tokio::time::interval_at(Instant::now() + period, period)
            });
            loop {
                let next = match ticker.as_mut() {
                    Some(ticker) => tokio::select! {
                        msg = rx.recv() => msg,
                        _ = ticker.tick() => Some(Message::Text("\n".to_string())),
                    },
                    None => rx.recv().await,
                };
                match next {
                    Some(msg) => {
                        if let Err(e) = write.send(msg).await {
                            tracing::error!("Failed to send frame: {}", e);
                            break;
                        }
                    }
                    None => {
                        // Sender dropped: we are shutting down.
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        let unexpected_close = tokio::select! {
            result = &mut read_handle => {
                tracing::debug!("Read task completed");
                result.unwrap_or(false)
            }
            _ = &mut write_handle => {
                tracing::debug!("Write task completed");
                !*self.intentional_disconnect.read().await
            }
        };
        read_handle.abort();
        write_handle.abort();
        *self.tx.lock().await = None;

        Ok(unexpected_close)
    }

    /// Attempt to reconnect with exponential backoff
    async fn reconnect_with_backoff(&self) -> Result<()> {
        let mut backoff = BackoffState::default();

        loop {
            self.set_state(ConnectionState::Reconnecting).await;
            let Some(delay) = backoff.next_delay_and_advance() else {
                tracing::error!("Max reconnection attempts reached, giving up");
                self.set_state(ConnectionState::Failed).await;
                return Err(anyhow!(
                    "Broker unreachable after {} reconnection attempts",
                    MAX_RETRY_ATTEMPTS
                ));
            };
            tracing::info!(
                "Reconnection attempt {} of {}, waiting {}ms",
                backoff.attempts(),
                MAX_RETRY_ATTEMPTS,
                delay
            );

            // Spread reconnects so clients dropped together don't retry together
            let jitter = {
                use rand::Rng;
                rand::thread_rng().gen_range(0..=delay / 4)
            };
            tokio::time::sleep(Duration::from_millis(delay + jitter)).await;

            // Check if disconnect was requested during the wait
            if *self.intentional_disconnect.read().await {
                tracing::info!("Reconnection cancelled - intentional disconnect");
                self.set_state(ConnectionState::Disconnected).await;
                return Ok(());
            }

            match self.connect_internal().await {
                Ok(unexpected_close) => {
                    if unexpected_close && !*self.intentional_disconnect.read().await {
                        // The session came up and dropped again: start a fresh schedule.
                        backoff.reset();
                        continue;
                    }
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Reconnection attempt {} failed: {}", backoff.attempts(), e);
                }
            }
        }
    }

    /// Connect and keep the session alive until an intentional disconnect.
    ///
    /// Returns once the connection is closed for good. An error means the
    /// first connect failed or reconnection attempts were exhausted.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut flag = self.intentional_disconnect.write().await;
            *flag = false;
        }

        match self.connect_internal().await {
            Ok(unexpected_close) => {
                if unexpected_close && !*self.intentional_disconnect.read().await {
                    tracing::info!("Connection closed unexpectedly, initiating reconnection");
                    self.reconnect_with_backoff().await?;
                }
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Failed).await;
                Err(e)
            }
        }
    }

    /// Unsubscribe everything, send DISCONNECT, and close the socket.
    pub async fn disconnect(&self) {
        // Mark this as intentional to prevent reconnection attempts
        {
            let mut flag = self.intentional_disconnect.write().await;
            *flag = true;
        }
        {
            let mut registry = self.subscriptions.lock().await;
            let tx = self.tx.lock().await.take();
            if let Some(tx) = tx {
                for (id, _) in registry.entries() {
                    let _ = tx.send(frame_message(&Frame::unsubscribe(id))).await;
                }
                let receipt = format!("disconnect-{}", Uuid::new_v4());
                let _ = tx.send(frame_message(&Frame::disconnect(&receipt))).await;
                // Dropping `tx` lets the write task flush and send Close.
            }
            let count = registry.clear();
            if count > 0 {
                tracing::debug!("Released {} subscriptions on disconnect", count);
            }
        }
        self.set_state(ConnectionState::Disconnected).await;
    }
}

impl Clone for StompClient {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            host: self.host.clone(),
            cookies: self.cookies.clone(),
            state: Arc::clone(&self.state),
            tx: Arc::clone(&self.tx),
            on_message: Arc::clone(&self.on_message),
            on_state_change: Arc::clone(&self.on_state_change),
            subscriptions: Arc::clone(&self.subscriptions),
            intentional_disconnect: Arc::clone(&self.intentional_disconnect),
        }
    }
}

fn frame_message(frame: &Frame) -> Message {
    Message::Text(frame.encode())
}

/// Read until CONNECTED (returning the server's heart-beat header) or ERROR.
async fn await_connected<S, E>(read: &mut S) -> Result<(u64, u64)>
where
    S: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    while let Some(msg) = read.next().await {
        let Message::Text(text) = msg? else {
            continue;
        };
        for inbound in stomp::decode_all(&text)? {
            let Inbound::Frame(frame) = inbound else {
                continue;
            };
            match frame.command {
                Command::Connected => return Ok(frame.heartbeat().unwrap_or((0, 0))),
                Command::Error => {
                    let reason = frame.get_header("message").unwrap_or("unknown error");
                    return Err(anyhow!("Broker refused connection: {}", reason));
                }
                other => tracing::debug!(command = %other, "Ignoring frame before CONNECTED"),
            }
        }
    }
    Err(anyhow!("Socket closed before CONNECTED"))
}

async fn handle_text(
    text: &str,
    subscriptions: &Mutex<SubscriptionRegistry>,
    on_message: &Mutex<Option<MessageCallback>>,
) {
    let inbound = match stomp::decode_all(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!("Failed to decode STOMP frame: {}", e);
            return;
        }
    };

    for item in inbound {
        let frame = match item {
            Inbound::Heartbeat => {
                tracing::trace!("Broker heart-beat");
                continue;
            }
            Inbound::Frame(frame) => frame,
        };

        match frame.command {
            Command::Message => {
                let destination = {
                    let registry = subscriptions.lock().await;
                    frame
                        .subscription()
                        .and_then(|id| registry.destination(id))
                        .or_else(|| frame.destination())
                        .map(str::to_string)
                };
                let Some(destination) = destination else {
                    tracing::warn!("MESSAGE frame without a known destination");
                    continue;
                };
                let callback = on_message.lock().await;
                if let Some(ref cb) = *callback {
                    cb(&destination, &frame.body);
                }
            }
            Command::Error => {
                tracing::warn!(
                    message = frame.get_header("message").unwrap_or(""),
                    body = %frame.body,
                    "Broker sent ERROR frame"
                );
            }
            Command::Receipt => {
                tracing::debug!(receipt = frame.get_header("receipt-id").unwrap_or(""), "Receipt");
            }
            other => tracing::debug!(command = %other, "Ignoring unexpected frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    type WsResult = std::result::Result<Message, std::io::Error>;

    fn text(s: &str) -> WsResult {
        Ok(Message::Text(s.to_string()))
    }

    #[tokio::test]
    async fn await_connected_reads_heartbeat() {
        let mut read = stream::iter(vec![
            text("\n"),
            text("CONNECTED\nversion:1.2\nheart-beat:0,10000\n\n\0"),
        ]);
        assert_eq!(await_connected(&mut read).await.unwrap(), (0, 10_000));
    }

    #[tokio::test]
    async fn await_connected_surfaces_error_frame() {
        let mut read = stream::iter(vec![text("ERROR\nmessage:bad login\n\n\0")]);
        let err = await_connected(&mut read).await.unwrap_err();
        assert!(err.to_string().contains("bad login"));
    }

    #[tokio::test]
    async fn await_connected_requires_frame_before_close() {
        let mut read = stream::iter(Vec::<WsResult>::new());
        assert!(await_connected(&mut read).await.is_err());
    }

    #[tokio::test]
    async fn message_frames_are_routed_by_subscription() {
        let registry = Mutex::new(SubscriptionRegistry::default());
        let id = registry.lock().await.register("/topic/matching/users/new");

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: MessageCallback = Box::new(move |dest, body| {
            seen_clone
                .lock()
                .unwrap()
                .push((dest.to_string(), body.to_string()));
        });
        let on_message = Mutex::new(Some(callback));

        let wire = format!("MESSAGE\nsubscription:{}\nmessage-id:1\n\n{{}}\0\n", id);
        handle_text(&wire, &registry, &on_message).await;
        handle_text("garbage", &registry, &on_message).await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![("/topic/matching/users/new".to_string(), "{}".to_string())]
        );
    }

    #[test]
    fn host_is_taken_from_url() {
        let client = StompClient::new("wss://galaxytalk.example/api/match/ws");
        assert_eq!(client.host, "galaxytalk.example");
    }
}
