use std::env;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use dashmap::DashMap;
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use headsup_core::{
    ClientMessage, EquityEstimator, GameError, Seat, ServerMessage, Session, SessionId, DEFAULT_SIMULATIONS,
};

const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 25917);

// Shared server state
struct AppState {
    // one match per connected client
    sessions: DashMap<SessionId, Arc<Mutex<Session>>>,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = SharedState::new(AppState {
        sessions: DashMap::new(),
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state);

    let addr = env::var("HEADSUP_ADDR")
        .ok()
        .and_then(|s| s.parse::<SocketAddr>().ok())
        .unwrap_or_else(|| SocketAddr::from(DEFAULT_ADDR));
    info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

/// Upgrades the request to a WebSocket
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Lifetime of a single WebSocket connection
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // everything bound for this client goes through the channel
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("failed to encode message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // the client went away
                break;
            }
        }
    });

    let mut session_id: Option<SessionId> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    for reply in handle_client_message(client_msg, &state, &mut session_id).await {
                        if tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!("failed to parse message: {}", e);
                    let _ = tx.send(ServerMessage::Error { message: format!("unreadable message: {}", e) }).await;
                }
            }
        }
    }

    if let Some(id) = session_id {
        state.sessions.remove(&id);
        info!("session {} closed, {} still open", id, state.sessions.len());
    }
    info!("connection closed");
}

/// Turns one client message into the replies for that client
async fn handle_client_message(
    msg: ClientMessage,
    state: &SharedState,
    session_id: &mut Option<SessionId>,
) -> Vec<ServerMessage> {
    if let ClientMessage::NewMatch { config } = msg {
        let config = config.unwrap_or_default();
        let session = match Session::try_new(config) {
            Ok(session) => session,
            Err(e) => {
                warn!("rejected match config: {}", e);
                return vec![error_message(e)];
            }
        };
        if let Some(old) = session_id.take() {
            state.sessions.remove(&old);
        }
        let id = Uuid::new_v4();
        let view = session.state().for_player();
        state.sessions.insert(id, Arc::new(Mutex::new(session)));
        *session_id = Some(id);
        info!("session {} opened (stack {}, big blind {})", id, config.initial_stack, config.big_blind);
        return vec![ServerMessage::MatchCreated { session_id: id, state: view }];
    }

    let session = session_id.and_then(|id| state.sessions.get(&id).map(|s| Arc::clone(s.value())));
    let Some(session) = session else {
        // the calculator works without a match
        if let ClientMessage::Estimate { hand, board, simulations } = msg {
            let estimator = EquityEstimator::new(simulations.unwrap_or(DEFAULT_SIMULATIONS));
            let result = tokio::task::spawn_blocking(move || estimator.estimate(&hand, &board)).await;
            return match result {
                Ok(Ok(estimate)) => vec![ServerMessage::Equity(estimate)],
                Ok(Err(e)) => vec![error_message(e)],
                Err(e) => vec![ServerMessage::Error { message: format!("estimate failed: {}", e) }],
            };
        }
        return vec![ServerMessage::Error { message: "start a match first (NewMatch)".to_string() }];
    };

    // equity sampling is CPU bound, keep it off the reactor
    let result = tokio::task::spawn_blocking(move || {
        let mut session = session.blocking_lock();
        run_session_command(&mut session, msg)
    })
    .await;

    result.unwrap_or_else(|e| vec![ServerMessage::Error { message: format!("session task failed: {}", e) }])
}

/// Applies a command to the client's match
fn run_session_command(session: &mut Session, msg: ClientMessage) -> Vec<ServerMessage> {
    let outcome = match msg {
        ClientMessage::StartHand => session.start_hand(),
        ClientMessage::PerformAction(action) => session.player_act(action),
        ClientMessage::ShowEquity => {
            return match session.player_equity() {
                Ok(estimate) => vec![ServerMessage::Equity(estimate)],
                Err(e) => vec![error_message(e)],
            };
        }
        ClientMessage::Estimate { hand, board, simulations } => {
            return match session.estimate(&hand, &board, simulations) {
                Ok(estimate) => vec![ServerMessage::Equity(estimate)],
                Err(e) => vec![error_message(e)],
            };
        }
        ClientMessage::ResetMatch => {
            session.reset();
            Ok(vec![])
        }
        ClientMessage::NewMatch { .. } => Ok(vec![]),
    };

    let events = match outcome {
        Ok(events) => events,
        Err(e) => return vec![error_message(e)],
    };

    let match_state = session.state();
    let mut replies: Vec<ServerMessage> = events.into_iter().map(ServerMessage::from).collect();
    replies.push(ServerMessage::Snapshot(match_state.for_player()));
    if match_state.hand_active() {
        replies.push(ServerMessage::NextToAct {
            valid_actions: match_state.legal_actions(Seat::Player),
        });
    } else if match_state.player_stack <= 0.0 || match_state.ai_stack <= 0.0 {
        replies.push(ServerMessage::Info {
            message: "a seat is out of chips, reset the match to continue".to_string(),
        });
    }
    replies
}

fn error_message(e: GameError) -> ServerMessage {
    ServerMessage::Error { message: e.to_string() }
}
