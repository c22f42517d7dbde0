//! Canned transport for tests and offline integrations

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufReader, Cursor, Read};

use serde_json::Value;

use super::{InferenceTransport, ResponseLines};
use crate::core::types::Result;
use crate::core::Error;

#[derive(Debug)]
enum Scripted {
    Lines(Vec<String>),
    BrokenAfter(Vec<String>, String),
    Refused(String),
}

/// Replays queued responses in order and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response streaming `lines`
    pub fn push_lines<S: Into<String>>(&self, lines: impl IntoIterator<Item = S>) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(Scripted::Lines(lines.into_iter().map(Into::into).collect()));
        self
    }

    /// Queue a response that streams `lines` then fails with `message`
    pub fn push_broken_stream<S: Into<String>>(
        &self,
        lines: impl IntoIterator<Item = S>,
        message: impl Into<String>,
    ) -> &Self {
        self.responses.borrow_mut().push_back(Scripted::BrokenAfter(
            lines.into_iter().map(Into::into).collect(),
            message.into(),
        ));
        self
    }

    /// Queue a request that fails before any line is streamed
    pub fn push_refused(&self, message: impl Into<String>) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(Scripted::Refused(message.into()));
        self
    }

    /// Every (route, body) pair posted so far
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl InferenceTransport for ScriptedTransport {
    fn post_lines(&self, route: &str, body: &Value) -> Result<ResponseLines> {
        self.requests
            .borrow_mut()
            .push((route.to_string(), body.clone()));

        match self.responses.borrow_mut().pop_front() {
            Some(Scripted::Lines(lines)) => Ok(ResponseLines::from_lines(lines)),
            Some(Scripted::BrokenAfter(lines, message)) => {
                let mut text = String::new();
                for line in lines {
                    text.push_str(&line);
                    text.push('\n');
                }
                Ok(ResponseLines::new(BufReader::new(FailingReader {
                    data: Cursor::new(text.into_bytes()),
                    message,
                })))
            }
            Some(Scripted::Refused(message)) => Err(Error::Transport(message)),
            None => Err(Error::Transport(format!("no scripted response for route {}", route))),
        }
    }
}

/// Yields its data, then fails every further read.
struct FailingReader {
    data: Cursor<Vec<u8>>,
    message: String,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, self.message.clone())),
            n => Ok(n),
        }
    }
}
