//! Streaming transport to the inference service
//!
//! A request is a JSON body posted to a route (`structure` or `color`); the
//! answer is a stream of newline-delimited JSON values that the generation
//! loops consume one line at a time.

pub mod http;
pub mod scripted;

pub use http::HttpTransport;
pub use scripted::ScriptedTransport;

use std::io::BufRead;

use serde_json::Value;

use crate::core::types::Result;
use crate::core::Error;

/// Route for structure (solid/empty) generation
pub const STRUCTURE_ROUTE: &str = "structure";
/// Route for block-id (color) generation
pub const COLOR_ROUTE: &str = "color";

/// Something that can post a JSON body and stream back response lines.
pub trait InferenceTransport {
    fn post_lines(&self, route: &str, body: &Value) -> Result<ResponseLines>;
}

impl<T: InferenceTransport + ?Sized> InferenceTransport for &T {
    fn post_lines(&self, route: &str, body: &Value) -> Result<ResponseLines> {
        (**self).post_lines(route, body)
    }
}

/// Lazily read, non-blank lines of a streamed response.
///
/// Dropping the value closes the underlying connection.
pub struct ResponseLines {
    reader: Box<dyn BufRead>,
    line: String,
}

impl ResponseLines {
    pub fn new(reader: impl BufRead + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            line: String::new(),
        }
    }

    /// Stream over already-known lines
    pub fn from_lines<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> Self {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        Self::new(std::io::Cursor::new(text.into_bytes()))
    }
}

impl std::fmt::Debug for ResponseLines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseLines")
            .field("reader", &"<stream>")
            .finish()
    }
}

impl Iterator for ResponseLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = self.line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(Ok(trimmed.to_string()));
                }
                Err(e) => {
                    return Some(Err(Error::Transport(format!("stream read failed: {}", e))));
                }
            }
        }
    }
}
