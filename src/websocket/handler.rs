use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::game::opponent::OpponentDriver;
use crate::game::selection::ClickOutcome;
use crate::game::session::Session;
use crate::game::standard::StandardRules;
use crate::game::utils::parse_square;
use crate::models::*;

/// WebSocket actor owning one player's session
pub struct ChessWebSocket {
    pub id: String,
    pub session: Session<StandardRules>,
    /// Delayed delivery of the next opponent move, if one is scheduled
    opponent_timer: Option<SpawnHandle>,
}

impl ChessWebSocket {
    pub fn new(id: String, app_state: &AppState) -> Self {
        let config = &app_state.config;
        let session = Session::restore(
            StandardRules::new(config.default_promotion),
            OpponentDriver::new(config.opponent_delay),
            config.default_promotion,
            app_state.persistence.clone(),
        );
        ChessWebSocket {
            id,
            session,
            opponent_timer: None,
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("WebSocket connection started: {}", self.id);
        self.after_change(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<OpponentTurn> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: OpponentTurn, ctx: &mut Self::Context) {
        self.opponent_timer = None;
        match self.session.play_opponent(msg.0) {
            Some(record) => info!("Computer played {} in session {}", record.san, self.id),
            None => debug!("Dropped stale opponent turn in session {}", self.id),
        }
        self.after_change(ctx);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                // Do nothing for pong messages
            }
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);
                match ClientMessage::parse(text.as_ref()) {
                    Ok(command) => self.handle_command(command, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send(&ServerMessage::error(e), ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send(&ServerMessage::error("Binary messages are not supported"), ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl ChessWebSocket {
    fn send(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing message: {}", e),
        }
    }

    pub fn handle_command(&mut self, command: Command, ctx: &mut ws::WebsocketContext<Self>) {
        match command {
            Command::Click(square) => {
                let square = match parse_square(&square) {
                    Ok(square) => square,
                    Err(e) => {
                        warn!("Ignoring click: {}", e);
                        self.send(&ServerMessage::error(e), ctx);
                        return;
                    }
                };
                match self.session.click(square) {
                    ClickOutcome::Moved(record) => info!("Player played {} in session {}", record.san, self.id),
                    outcome => debug!("Click on {}: {:?}", square, outcome),
                }
            }
            Command::NewGame => self.session.request_new_game(),
            Command::ConfirmNewGame => {
                self.session.confirm_new_game();
            }
            Command::CancelNewGame => self.session.cancel_new_game(),
            Command::Undo => {
                let undone = self.session.undo();
                debug!("Took back {} moves", undone.len());
            }
            Command::ToggleOpponent => self.session.toggle_opponent(),
            Command::ToggleColor => self.session.toggle_human_side(),
            Command::SetTheme(theme) => {
                if !self.session.set_theme(&theme) {
                    debug!("Ignoring unknown theme {:?}", theme);
                }
            }
            Command::Sync => {}
        }
        self.after_change(ctx);
    }

    /// Fires the celebration if due, re-arms or cancels the opponent timer, and pushes
    /// the new state to the page.
    fn after_change(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(effect) = self.session.take_celebration() {
            info!("Player delivered mate in session {}", self.id);
            self.send(&ServerMessage::Celebrate(effect), ctx);
        }

        if let Some(ticket) = self.session.schedule_opponent() {
            self.cancel_opponent_timer(ctx);
            let delay = self.session.opponent_delay();
            self.opponent_timer = Some(ctx.notify_later(OpponentTurn(ticket), delay));
        } else if !self.session.opponent_pending() {
            self.cancel_opponent_timer(ctx);
        }

        self.send(&ServerMessage::State(BoardView::from_session(&self.session)), ctx);
    }

    fn cancel_opponent_timer(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(handle) = self.opponent_timer.take() {
            ctx.cancel_future(handle);
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(req: HttpRequest, stream: web::Payload, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    // Generate a unique ID for this connection
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection: {}", id);

    let ws = ChessWebSocket::new(id, &app_state);
    ws::start(ws, &req, stream)
}
