use actix::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::celebration::CelebrationEffect;
use crate::models::view::BoardView;

/// Message sent from the page to its session
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientMessage {
    pub message_type: String,
    pub square: Option<String>,
    pub theme: Option<String>,
}

/// What the page asked for, once the raw message has been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Click(String),
    NewGame,
    ConfirmNewGame,
    CancelNewGame,
    Undo,
    ToggleOpponent,
    ToggleColor,
    SetTheme(String),
    Sync,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    Malformed(String),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("{0} requires a {1}")]
    MissingField(String, &'static str),
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Command, ProtocolError> {
        let msg: ClientMessage = serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        msg.into_command()
    }

    pub fn into_command(self) -> Result<Command, ProtocolError> {
        let command = match self.message_type.as_str() {
            "click" => Command::Click(
                self.square
                    .ok_or_else(|| ProtocolError::MissingField(self.message_type.clone(), "square"))?,
            ),
            "new_game" => Command::NewGame,
            "confirm_new_game" => Command::ConfirmNewGame,
            "cancel_new_game" => Command::CancelNewGame,
            "undo" => Command::Undo,
            "toggle_opponent" => Command::ToggleOpponent,
            "toggle_color" => Command::ToggleColor,
            "set_theme" => Command::SetTheme(
                self.theme
                    .ok_or_else(|| ProtocolError::MissingField(self.message_type.clone(), "theme"))?,
            ),
            "sync" => Command::Sync,
            _ => return Err(ProtocolError::UnknownType(self.message_type)),
        };
        Ok(command)
    }
}

/// Message sent from the session to the page
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ServerMessage {
    State(BoardView),
    Celebrate(CelebrationEffect),
    Error { error: String },
}

impl ServerMessage {
    pub fn error(e: impl ToString) -> Self {
        ServerMessage::Error { error: e.to_string() }
    }
}

/// Deferred opponent move, delivered to the session actor when its delay elapses
#[derive(Message)]
#[rtype(result = "()")]
pub struct OpponentTurn(pub crate::game::opponent::MoveTicket);
