//! Fakes and in-process servers shared by the integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use roulette_common::{Role, UserName};
use roulette_session::{
    LocalStream, MatchingConfig, MediaConstraints, MediaDevices, MediaError, MediaKind,
    MediaTrack, PeerConfig, PeerConnector, PeerError, PeerEvent, PeerHandle, PeerLink,
    PeerOptions, SessionConfig, SignalingConfig,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};

pub const WAIT: Duration = Duration::from_secs(5);

/// Await `fut`, failing the test if it takes longer than [`WAIT`].
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut)
        .await
        .expect("timed out waiting")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("roulette_session=debug")
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Media devices
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FakeTrack {
    id: String,
    kind: MediaKind,
    stopped: AtomicBool,
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Capture that succeeds with one audio and one video track, unless told
/// to fail. Individual captures can be held open with [`FakeDevices::hold`].
#[derive(Default)]
pub struct FakeDevices {
    fail: AtomicBool,
    captures: AtomicUsize,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    issued: Mutex<Vec<LocalStream>>,
}

impl FakeDevices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let devices = Self::default();
        devices.fail.store(true, Ordering::SeqCst);
        Arc::new(devices)
    }

    /// The next capture waits until the returned sender fires or is dropped.
    pub fn hold(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Every stream handed out so far, oldest first.
    pub fn issued(&self) -> Vec<LocalStream> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalStream, MediaError> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied("camera blocked".into()));
        }

        let mut tracks: Vec<Arc<dyn MediaTrack>> = Vec::new();
        for (wanted, kind) in [
            (constraints.audio, MediaKind::Audio),
            (constraints.video, MediaKind::Video),
        ] {
            if wanted {
                tracks.push(Arc::new(FakeTrack {
                    id: format!("{kind}-{n}"),
                    kind,
                    stopped: AtomicBool::new(false),
                }));
            }
        }
        let stream = LocalStream::new(format!("local-{n}"), tracks);
        self.issued.lock().unwrap().push(stream.clone());
        Ok(stream)
    }
}

// ---------------------------------------------------------------------------
// Peer connections
// ---------------------------------------------------------------------------

/// One connection created by [`FakeConnector`].
pub struct FakePeer {
    pub role: Role,
    pub local_stream: LocalStream,
    pub options: PeerOptions,
    fed: Mutex<Vec<Value>>,
    destroyed: AtomicUsize,
    events: mpsc::UnboundedSender<PeerEvent>,
}

impl FakePeer {
    /// Payloads fed so far, in order.
    pub fn fed(&self) -> Vec<Value> {
        self.fed.lock().unwrap().clone()
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(event);
    }
}

struct FakeHandle(Arc<FakePeer>);

impl PeerHandle for FakeHandle {
    fn feed_negotiation_data(&mut self, data: Value) -> Result<(), PeerError> {
        if data.get("reject").is_some() {
            return Err(PeerError::InvalidData("rejected by fake".into()));
        }
        self.0.fed.lock().unwrap().push(data);
        Ok(())
    }

    fn destroy(&mut self) {
        self.0.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// The offer every fake initiator emits as soon as it is created.
pub fn fake_offer() -> Value {
    json!({"type": "offer", "sdp": "v=0\r\no=- fake offer\r\n"})
}

pub fn fake_answer() -> Value {
    json!({"type": "answer", "sdp": "v=0\r\no=- fake answer\r\n"})
}

/// Records every connection it creates. Initiators emit [`fake_offer`].
pub struct FakeConnector {
    peers: Mutex<Vec<Arc<FakePeer>>>,
    created: watch::Sender<usize>,
    fail: AtomicBool,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            peers: Mutex::new(Vec::new()),
            created: watch::Sender::new(0),
            fail: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let connector = Self::new();
        connector.fail.store(true, Ordering::SeqCst);
        connector
    }

    pub fn count(&self) -> usize {
        *self.created.borrow()
    }

    pub fn peer(&self, index: usize) -> Arc<FakePeer> {
        Arc::clone(&self.peers.lock().unwrap()[index])
    }

    /// Wait until at least `index + 1` connections exist and return that one.
    pub async fn wait_for_peer(&self, index: usize) -> Arc<FakePeer> {
        let mut rx = self.created.subscribe();
        within(rx.wait_for(|n| *n > index))
            .await
            .expect("connector dropped");
        self.peer(index)
    }
}

impl PeerConnector for FakeConnector {
    fn create(&self, config: PeerConfig) -> Result<PeerLink, PeerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PeerError::Setup("no transport".into()));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let peer = Arc::new(FakePeer {
            role: config.role,
            local_stream: config.local_stream,
            options: config.options,
            fed: Mutex::new(Vec::new()),
            destroyed: AtomicUsize::new(0),
            events: events_tx,
        });
        if peer.role.is_initiator() {
            peer.emit(PeerEvent::NegotiationData(fake_offer()));
        }

        self.peers.lock().unwrap().push(Arc::clone(&peer));
        self.created.send_modify(|n| *n += 1);

        Ok(PeerLink {
            handle: Box::new(FakeHandle(peer)),
            events: events_rx,
        })
    }
}

// ---------------------------------------------------------------------------
// Matching service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MatchingState {
    registrations: Vec<String>,
    reject: bool,
    sockets: HashMap<String, mpsc::UnboundedSender<String>>,
}

/// `POST /registerForMatching` plus `/ws/{name}` match notifications.
#[derive(Clone)]
pub struct MatchingServer {
    pub http_url: String,
    pub ws_url: String,
    state: Arc<Mutex<MatchingState>>,
    connected: Arc<watch::Sender<Vec<String>>>,
}

impl MatchingServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Self {
            http_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}"),
            state: Arc::new(Mutex::new(MatchingState::default())),
            connected: Arc::new(watch::Sender::new(Vec::new())),
        };

        let app = Router::new()
            .route("/registerForMatching", post(register_handler))
            .route("/ws/{name}", get(matching_ws_handler))
            .with_state(server.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        server
    }

    /// Every registration attempt, including rejected ones.
    pub fn registrations(&self) -> Vec<String> {
        self.state.lock().unwrap().registrations.clone()
    }

    /// Answer further registrations with 503.
    pub fn reject_registrations(&self) {
        self.state.lock().unwrap().reject = true;
    }

    pub async fn wait_connected(&self, name: &str) {
        let mut rx = self.connected.subscribe();
        within(rx.wait_for(|names| names.iter().any(|n| n == name)))
            .await
            .expect("matching server stopped");
    }

    pub async fn wait_disconnected(&self, name: &str) {
        let mut rx = self.connected.subscribe();
        within(rx.wait_for(|names| names.iter().all(|n| n != name)))
            .await
            .expect("matching server stopped");
    }

    pub async fn wait_registrations(&self, count: usize) {
        within(async {
            while self.registrations().len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
    }

    pub fn push(&self, name: &str, message: Value) {
        let state = self.state.lock().unwrap();
        let socket = state
            .sockets
            .get(name)
            .unwrap_or_else(|| panic!("{name} has no matching socket"));
        socket.send(message.to_string()).unwrap();
    }

    pub fn push_match(&self, name: &str, room_code: &str, initiator: bool) {
        self.push(
            name,
            json!({"event": "matched", "room_code": room_code, "initiator": initiator}),
        );
    }

    /// Drop the user's notification socket from the server side.
    pub fn disconnect(&self, name: &str) {
        self.state.lock().unwrap().sockets.remove(name);
    }

    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            http_url: self.http_url.clone(),
            ws_url: self.ws_url.clone(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(2),
        }
    }
}

async fn register_handler(
    State(server): State<MatchingServer>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut state = server.state.lock().unwrap();
    state.registrations.push(name.clone());
    if state.reject {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "error", "message": "queue closed"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "message": format!("{name} queued")})),
    )
}

async fn matching_ws_handler(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(server): State<MatchingServer>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| matching_socket(socket, name, server))
}

async fn matching_socket(mut socket: WebSocket, name: String, server: MatchingServer) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    server.state.lock().unwrap().sockets.insert(name.clone(), tx);
    server.connected.send_modify(|names| names.push(name.clone()));

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    server
        .connected
        .send_modify(|names| names.retain(|n| *n != name));
}

// ---------------------------------------------------------------------------
// Signaling relay
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RelayState {
    sockets: HashMap<String, mpsc::UnboundedSender<String>>,
    rooms: HashMap<String, String>,
    received: Vec<(String, Value)>,
}

/// Minimal relay: `join` is answered with `verified`, `signal` is forwarded
/// to its target with `from` added, and a dropped socket notifies the rest
/// of its room with `peer-disconnected`.
#[derive(Clone)]
pub struct RelayServer {
    pub ws_url: String,
    state: Arc<Mutex<RelayState>>,
    connected: Arc<watch::Sender<Vec<String>>>,
}

impl RelayServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let relay = Self {
            ws_url: format!("ws://{addr}"),
            state: Arc::new(Mutex::new(RelayState::default())),
            connected: Arc::new(watch::Sender::new(Vec::new())),
        };

        let app = Router::new()
            .route("/ws/{name}", get(relay_ws_handler))
            .with_state(relay.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        relay
    }

    /// Every envelope received so far with its sender.
    pub fn received(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().received.clone()
    }

    /// Envelopes `name` sent with the given `event`.
    pub fn received_from(&self, name: &str, event: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|(from, env)| from == name && env["event"] == event)
            .map(|(_, env)| env)
            .collect()
    }

    pub async fn wait_for_envelope(&self, name: &str, event: &str, count: usize) -> Vec<Value> {
        within(async {
            loop {
                let found = self.received_from(name, event);
                if found.len() >= count {
                    return found;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
    }

    pub async fn wait_connected(&self, name: &str) {
        let mut rx = self.connected.subscribe();
        within(rx.wait_for(|names| names.iter().any(|n| n == name)))
            .await
            .expect("relay stopped");
    }

    pub async fn wait_disconnected(&self, name: &str) {
        let mut rx = self.connected.subscribe();
        within(rx.wait_for(|names| names.iter().all(|n| n != name)))
            .await
            .expect("relay stopped");
    }

    /// Write a raw frame to `name`.
    pub fn send_to(&self, name: &str, message: Value) {
        let state = self.state.lock().unwrap();
        let socket = state
            .sockets
            .get(name)
            .unwrap_or_else(|| panic!("{name} is not on the relay"));
        socket.send(message.to_string()).unwrap();
    }

    /// Drop `name`'s socket from the server side.
    pub fn kick(&self, name: &str) {
        self.state.lock().unwrap().sockets.remove(name);
    }

    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            ws_url: self.ws_url.clone(),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

async fn relay_ws_handler(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(relay): State<RelayServer>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_socket(socket, name, relay))
}

async fn relay_socket(mut socket: WebSocket, name: String, relay: RelayServer) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    relay.state.lock().unwrap().sockets.insert(name.clone(), tx);
    relay.connected.send_modify(|names| names.push(name.clone()));

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => relay.on_frame(&name, text.as_str()),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    relay.on_leave(&name);
    relay
        .connected
        .send_modify(|names| names.retain(|n| *n != name));
}

impl RelayServer {
    fn on_frame(&self, name: &str, text: &str) {
        let Ok(envelope) = serde_json::from_str::<Value>(text) else {
            return;
        };
        let mut state = self.state.lock().unwrap();
        state.received.push((name.to_string(), envelope.clone()));

        match envelope["event"].as_str() {
            Some("join") => {
                let room = envelope["room_code"].as_str().unwrap_or_default().to_string();
                state.rooms.insert(name.to_string(), room.clone());
                if let Some(socket) = state.sockets.get(name) {
                    let reply = json!({
                        "event": "verified",
                        "room_code": room,
                        "role": envelope["type"],
                    });
                    let _ = socket.send(reply.to_string());
                }
            }
            Some("signal") => {
                let target = envelope["target"].as_str().unwrap_or_default();
                if let Some(socket) = state.sockets.get(target) {
                    let relayed = json!({
                        "event": "signal",
                        "room_code": envelope["room_code"],
                        "from": name,
                        "type": "signal",
                        "data": envelope["data"],
                    });
                    let _ = socket.send(relayed.to_string());
                }
            }
            _ => {}
        }
    }

    fn on_leave(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.sockets.remove(name);
        let Some(room) = state.rooms.remove(name) else {
            return;
        };
        let notice = json!({"event": "peer-disconnected", "message": "Your peer has left the room."});
        for (other, other_room) in &state.rooms {
            if *other_room == room {
                if let Some(socket) = state.sockets.get(other) {
                    let _ = socket.send(notice.to_string());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session wiring
// ---------------------------------------------------------------------------

pub fn session_config(matching: &MatchingServer, relay: &RelayServer) -> SessionConfig {
    SessionConfig {
        matching: matching.matching_config(),
        signaling: relay.signaling_config(),
        media: MediaConstraints::default(),
        peer: PeerOptions::default(),
    }
}

pub fn user(name: &str) -> UserName {
    UserName::new(name)
}
