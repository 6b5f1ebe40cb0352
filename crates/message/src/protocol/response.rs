//! Server responses: a [`Message`] with a status code and reason phrase.

use super::message::{sealed::Sealed, HttpMessage, Message};
use super::status::{is_valid_status_code, reason_phrase};
use super::MessageError;
use crate::ensure;

fn check_status(code: u16) -> Result<(), MessageError> {
    ensure!(
        is_valid_status_code(code),
        MessageError::invalid_argument(format!("the code {code} is not a valid HTTP status code"))
    );
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Response {
    message: Message,
    status_code: u16,
    reason_phrase: String,
}

impl Response {
    /// A `200 OK` response with no headers and an empty body.
    pub fn new() -> Self {
        Self { message: Message::new(), status_code: 200, reason_phrase: reason_phrase(200).to_string() }
    }

    /// A response with the given code and its default reason phrase.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] if the code isn't within `100..=599`.
    pub fn with_code(code: u16) -> Result<Self, MessageError> {
        check_status(code)?;
        Ok(Self { message: Message::new(), status_code: code, reason_phrase: reason_phrase(code).to_string() })
    }

    /// The three-digit status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The reason phrase; empty for unlisted codes set without a phrase.
    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    /// Sets the status code with its default reason phrase.
    pub fn with_status(&self, code: u16) -> Result<Self, MessageError> {
        self.with_status_and_reason(code, "")
    }

    /// Sets the status code and a custom reason phrase. An empty phrase falls
    /// back to the default one for `code`.
    pub fn with_status_and_reason(&self, code: u16, reason: &str) -> Result<Self, MessageError> {
        check_status(code)?;
        let reason = if reason.is_empty() { reason_phrase(code) } else { reason };

        Ok(Self { status_code: code, reason_phrase: reason.to_string(), ..self.clone() })
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Sealed for Response {
    fn message(&self) -> &Message {
        &self.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}

impl HttpMessage for Response {}
