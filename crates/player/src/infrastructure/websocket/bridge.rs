//! WebSocket Bridge - connects the EventBus to the StompClient.
//!
//! `create_connection` spawns a task that owns the broker client, feeds
//! decoded events into an [`EventBus`], and publishes connection state. The
//! returned handle tears the connection down when released or dropped.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use galaxytalk_domain::UserId;
use galaxytalk_shared::topics;

use crate::infrastructure::message_translator;
use crate::infrastructure::messaging::{
    state_channel, ConnectionHandle, ConnectionState, EventBus, StatePublisher,
};
use crate::ports::outbound::{
    RealtimeError, RealtimeEvent, RealtimePort, RealtimeSubscription,
};

use super::client::{CookieSource, StompClient};

/// How long a disconnect waits for the client to flush UNSUBSCRIBE/DISCONNECT.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Broker endpoint for an API base URL: `http(s)://host/api` becomes
/// `ws(s)://host/api/match/ws/websocket`, the raw WebSocket transport of the
/// SockJS endpoint.
pub fn ws_url_from_api_base(api_base: &str) -> Result<String, RealtimeError> {
    let mut url =
        Url::parse(api_base).map_err(|e| RealtimeError::InvalidUrl(format!("{api_base}: {e}")))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(RealtimeError::InvalidUrl(format!(
                "unsupported scheme {other} in {api_base}"
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| RealtimeError::InvalidUrl(api_base.to_string()))?;
    let path = format!(
        "{}{}{}",
        url.path().trim_end_matches('/'),
        topics::MATCH_WS_PATH,
        topics::SOCKJS_WEBSOCKET_SUFFIX
    );
    url.set_path(&path);
    Ok(url.to_string())
}

/// Cookies `jar` holds for the HTTP origin of `ws_url`, read at every call.
pub fn jar_cookie_source(jar: Arc<Jar>, ws_url: &str) -> Result<CookieSource, RealtimeError> {
    let mut origin =
        Url::parse(ws_url).map_err(|e| RealtimeError::InvalidUrl(format!("{ws_url}: {e}")))?;
    let scheme = match origin.scheme() {
        "ws" => "http",
        "wss" => "https",
        _ => return Err(RealtimeError::InvalidUrl(ws_url.to_string())),
    };
    origin
        .set_scheme(scheme)
        .map_err(|_| RealtimeError::InvalidUrl(ws_url.to_string()))?;

    Ok(Arc::new(move || {
        jar.cookies(&origin)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }))
}

/// Open a connection for `user_id`, subscribe to its three destinations and
/// dispatch decoded events into `event_bus`. `cookies` authenticates the
/// WebSocket handshake.
pub fn create_connection(
    url: &str,
    user_id: &UserId,
    event_bus: EventBus,
    cookies: Option<CookieSource>,
) -> ConnectionHandle {
    let (disconnect_tx, disconnect_rx) = oneshot::channel::<()>();
    let (publisher, state) = state_channel();

    let mut client = StompClient::new(url);
    if let Some(cookies) = cookies {
        client = client.with_cookies(cookies);
    }
    let destinations = vec![
        topics::user_topic(user_id),
        topics::NEW_USER_TOPIC.to_string(),
        topics::EXIT_USER_TOPIC.to_string(),
    ];

    tokio::spawn(bridge_task(
        client,
        destinations,
        disconnect_rx,
        event_bus,
        Arc::new(publisher),
    ));

    ConnectionHandle::new(state, disconnect_tx)
}

async fn bridge_task(
    client: StompClient,
    destinations: Vec<String>,
    mut disconnect_rx: oneshot::Receiver<()>,
    event_bus: EventBus,
    state: Arc<StatePublisher>,
) {
    let state_for_callback = Arc::clone(&state);
    client
        .set_on_state_change(move |conn_state| {
            tracing::debug!(state = %conn_state, "Broker connection state");
            state_for_callback.send_replace(conn_state);
        })
        .await;

    // Events go through a channel so dispatch order matches arrival order.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RealtimeEvent>();
    client
        .set_on_message(move |destination, body| {
            if let Some(event) = message_translator::translate(destination, body) {
                let _ = event_tx.send(event);
            }
        })
        .await;

    for destination in &destinations {
        if let Err(e) = client.subscribe(destination).await {
            tracing::error!(destination = %destination, "Failed to register subscription: {}", e);
        }
    }

    let runner = client.clone();
    let mut connect_task = tokio::spawn(async move { runner.connect().await });

    loop {
        tokio::select! {
            // Explicit disconnect, or the handle was dropped
            _ = &mut disconnect_rx => {
                tracing::info!("Disconnect requested");
                client.disconnect().await;
                if tokio::time::timeout(SHUTDOWN_GRACE, &mut connect_task).await.is_err() {
                    tracing::warn!("Broker client did not stop in time, aborting");
                    connect_task.abort();
                }
                state.send_replace(ConnectionState::Disconnected);
                break;
            }

            Some(event) = event_rx.recv() => {
                event_bus.dispatch(event);
            }

            result = &mut connect_task => {
                let reason = match result {
                    Ok(Ok(())) => "broker connection closed".to_string(),
                    Ok(Err(e)) => e.to_string(),
                    Err(e) => format!("broker task failed: {e}"),
                };
                tracing::error!(reason = %reason, "Real-time transport stopped");
                while let Ok(event) = event_rx.try_recv() {
                    event_bus.dispatch(event);
                }
                state.send_replace(ConnectionState::Failed);
                event_bus.dispatch(RealtimeEvent::TransportFailed(reason));
                break;
            }
        }
    }
}

/// `RealtimePort` backed by the STOMP bridge.
#[derive(Clone)]
pub struct StompRealtimeAdapter {
    ws_url: String,
    cookie_jar: Option<Arc<Jar>>,
}

impl StompRealtimeAdapter {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            cookie_jar: None,
        }
    }

    /// Send the session cookies from `jar` with every handshake.
    pub fn with_cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }
}

#[async_trait::async_trait]
impl RealtimePort for StompRealtimeAdapter {
    async fn subscribe(&self, user_id: &UserId) -> Result<RealtimeSubscription, RealtimeError> {
        let parsed = Url::parse(&self.ws_url)
            .map_err(|e| RealtimeError::InvalidUrl(format!("{}: {}", self.ws_url, e)))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidUrl(self.ws_url.clone()));
        }
        if user_id.is_empty() {
            return Err(RealtimeError::Transport(
                "cannot subscribe without a user id".to_string(),
            ));
        }

        let cookies = self
            .cookie_jar
            .clone()
            .map(|jar| jar_cookie_source(jar, &self.ws_url))
            .transpose()?;

        let event_bus = EventBus::new();
        let rx = event_bus.subscribe();

        let handle = create_connection(&self.ws_url, user_id, event_bus, cookies);
        tracing::info!(user_id = %user_id, url = %self.ws_url, "Opened real-time subscription");

        Ok(RealtimeSubscription::new(rx, Box::new(handle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use galaxytalk_domain::WaitingUser;
    use galaxytalk_shared::stomp::{self, Command, Frame, Inbound};
    use galaxytalk_shared::PoolEvent;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    #[test]
    fn ws_url_rewrites_scheme_and_appends_path() {
        assert_eq!(
            ws_url_from_api_base("http://localhost:8080/api").unwrap(),
            "ws://localhost:8080/api/match/ws/websocket"
        );
        assert_eq!(
            ws_url_from_api_base("https://galaxytalk.example/api/").unwrap(),
            "wss://galaxytalk.example/api/match/ws/websocket"
        );
        assert!(ws_url_from_api_base("ftp://nope").is_err());
        assert!(ws_url_from_api_base("not a url").is_err());
    }

    #[tokio::test]
    async fn adapter_rejects_bad_inputs() {
        let adapter = StompRealtimeAdapter::new("http://localhost/api/match/ws");
        assert!(matches!(
            adapter.subscribe(&UserId::new("u-1")).await,
            Err(RealtimeError::InvalidUrl(_))
        ));

        let adapter = StompRealtimeAdapter::new("ws://localhost/api/match/ws");
        assert!(matches!(
            adapter.subscribe(&UserId::default()).await,
            Err(RealtimeError::Transport(_))
        ));
    }

    /// Minimal broker: answers CONNECT, pushes one NEW_USER message once the
    /// pool topic is subscribed, and reports every frame it receives.
    async fn spawn_fake_broker() -> (String, mpsc::UnboundedReceiver<Frame>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                let Message::Text(text) = msg else {
                    continue;
                };
                for inbound in stomp::decode_all(&text).unwrap_or_default() {
                    let Inbound::Frame(frame) = inbound else {
                        continue;
                    };
                    match frame.command {
                        Command::Connect => {
                            let connected = Frame::new(Command::Connected)
                                .header("version", "1.2")
                                .header("heart-beat", "0,0");
                            ws.send(Message::Text(connected.encode())).await.unwrap();
                        }
                        Command::Subscribe
                            if frame.destination() == Some(topics::NEW_USER_TOPIC) =>
                        {
                            let id = frame.get_header("id").unwrap_or_default().to_string();
                            let body = r#"{"type":"NEW_USER","data":{"userId":"u-2","concern":"exam stress","status":"WAITING"}}"#;
                            let message = Frame::new(Command::Message)
                                .header("subscription", id)
                                .header("destination", topics::NEW_USER_TOPIC)
                                .header("message-id", "1")
                                .with_body(body);
                            ws.send(Message::Text(message.encode())).await.unwrap();
                        }
                        _ => {}
                    }
                    let _ = frames_tx.send(frame);
                }
            }
        });

        (format!("ws://{}/api/match/ws/websocket", addr), frames_rx)
    }

    #[test]
    fn jar_cookies_are_looked_up_on_the_http_origin() {
        let jar = Arc::new(Jar::default());
        let api = Url::parse("https://galaxytalk.example/api").unwrap();
        jar.add_cookie_str("AccessToken=abc; Secure; HttpOnly", &api);

        let source =
            jar_cookie_source(Arc::clone(&jar), "wss://galaxytalk.example/api/match/ws/websocket")
                .unwrap();
        assert_eq!(source().as_deref(), Some("AccessToken=abc"));

        // a refresh replaces the cookie; the next handshake sees the new one
        jar.add_cookie_str("AccessToken=def; Secure; HttpOnly", &api);
        assert_eq!(source().as_deref(), Some("AccessToken=def"));

        assert!(jar_cookie_source(jar, "http://galaxytalk.example/api").is_err());
    }

    #[tokio::test]
    async fn handshake_carries_the_session_cookie() {
        use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (cookie_tx, mut cookie_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let cookie = req
                    .headers()
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let _ = cookie_tx.send(cookie);
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                .await
                .unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let jar = Arc::new(Jar::default());
        let api = Url::parse(&format!("http://{}/api", addr)).unwrap();
        jar.add_cookie_str("AccessToken=abc", &api);

        let adapter = StompRealtimeAdapter::new(format!("ws://{}/api/match/ws/websocket", addr))
            .with_cookie_jar(jar);
        let mut subscription = adapter.subscribe(&UserId::new("u-1")).await.unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(5), cookie_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen.as_deref(), Some("AccessToken=abc"));
        subscription.close();
    }

    #[tokio::test]
    async fn subscription_receives_events_and_releases_on_close() {
        let (url, mut frames) = spawn_fake_broker().await;
        let adapter = StompRealtimeAdapter::new(url);

        let mut subscription = adapter.subscribe(&UserId::new("u-1")).await.unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), subscription.next_event())
            .await
            .unwrap();
        assert_eq!(
            event,
            Some(RealtimeEvent::Pool(PoolEvent::NewUser(WaitingUser::new(
                "u-2",
                "exam stress"
            ))))
        );

        subscription.close();

        let mut commands = Vec::new();
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), frames.recv())
                .await
                .unwrap()
                .unwrap();
            let done = frame.command == Command::Disconnect;
            commands.push(frame);
            if done {
                break;
            }
        }

        let subscribed: Vec<_> = commands
            .iter()
            .filter(|f| f.command == Command::Subscribe)
            .filter_map(|f| f.destination().map(str::to_string))
            .collect();
        assert_eq!(
            subscribed,
            vec![
                "/topic/matching/u-1".to_string(),
                topics::NEW_USER_TOPIC.to_string(),
                topics::EXIT_USER_TOPIC.to_string(),
            ]
        );
        let unsubscribed = commands
            .iter()
            .filter(|f| f.command == Command::Unsubscribe)
            .count();
        assert_eq!(unsubscribed, 3);
    }
}
