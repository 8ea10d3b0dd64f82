//! Client-side request façade.
//!
//! Sidebar actions are phrased in page ids ("move `slides-slide-3--docs` up").
//! The [`Client`] translates them into the import-path requests the router
//! understands, using the [`LinkedIndex`] to find the deck's sibling paths,
//! sends them over a [`Transport`], and waits for the correlated response.
//!
//! Two transports are provided:
//!
//! - [`LocalTransport`] calls a [`Router`] in-process (the CLI uses this).
//! - [`LineTransport`] speaks line-delimited JSON over any reader/writer pair,
//!   the client half of [`crate::router::serve`].

use crate::drag::DropIntent;
use crate::index::{Direction, IndexError, LinkedIndex};
use crate::protocol::{
    DeleteSlideRequest, GetSlideSourceRequest, InsertSlideRequest, MoveSlideDownRequest,
    MoveSlideUpRequest, Operation, Request, RequestEnvelope, ResponseEnvelope, SaveSlideRequest,
};
use crate::router::Router;
use crate::store::SlideStore;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{op} failed: {message}")]
    Remote { op: Operation, message: String },
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("{0} is not a slide in a deck")]
    NotInDeck(String),
    #[error("{story_id} has no {direction:?} neighbour in its deck")]
    NoNeighbour {
        story_id: String,
        direction: Direction,
    },
}

/// Carries one request envelope to the router and brings back its response.
pub trait Transport {
    fn round_trip(&mut self, request: &RequestEnvelope) -> io::Result<ResponseEnvelope>;
}

/// In-process transport over a [`Router`].
pub struct LocalTransport<'r, S: SlideStore> {
    router: &'r Router<S>,
}

impl<'r, S: SlideStore> LocalTransport<'r, S> {
    pub fn new(router: &'r Router<S>) -> Self {
        Self { router }
    }
}

impl<S: SlideStore> Transport for LocalTransport<'_, S> {
    fn round_trip(&mut self, request: &RequestEnvelope) -> io::Result<ResponseEnvelope> {
        Ok(self.router.handle(request))
    }
}

/// Line-delimited JSON transport. Lines that are not the awaited response
/// are logged and dropped.
pub struct LineTransport<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LineTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> Transport for LineTransport<R, W> {
    fn round_trip(&mut self, request: &RequestEnvelope) -> io::Result<ResponseEnvelope> {
        serde_json::to_writer(&mut self.writer, request)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("channel closed before response to {}", request.id),
                ));
            }
            match serde_json::from_str::<ResponseEnvelope>(&line) {
                Ok(response) if response.id == request.id => return Ok(response),
                Ok(response) => {
                    tracing::debug!(expected = %request.id, got = %response.id, "dropping uncorrelated response");
                }
                Err(e) => {
                    if !line.trim().is_empty() {
                        tracing::warn!(error = %e, "dropping line that is not a response envelope");
                    }
                }
            }
        }
    }
}

/// Issues slide requests on behalf of the sidebar.
pub struct Client<T: Transport> {
    transport: T,
    next_id: u64,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("slideset-{}", self.next_id)
    }

    /// Send one typed request and decode its typed response.
    pub fn call<R: Request>(&mut self, request: &R) -> Result<R::Response, ClientError> {
        let id = self.next_id();
        let envelope = RequestEnvelope::new(id, request)
            .map_err(|e| ClientError::Protocol(format!("cannot encode {}: {e}", R::OP)))?;
        tracing::debug!(op = %envelope.op, id = %envelope.id, context = %request.describe(), "sending request");

        let response = self.transport.round_trip(&envelope)?;
        if response.id != envelope.id || response.op != envelope.op {
            return Err(ClientError::Protocol(format!(
                "response {}/{} does not match request {}/{}",
                response.op, response.id, envelope.op, envelope.id
            )));
        }
        if !response.success {
            return Err(ClientError::Remote {
                op: R::OP,
                message: response.error.unwrap_or_default(),
            });
        }
        let payload = response
            .payload
            .ok_or_else(|| ClientError::Protocol(format!("{} response has no payload", R::OP)))?;
        serde_json::from_value(payload)
            .map_err(|e| ClientError::Protocol(format!("bad {} response payload: {e}", R::OP)))
    }

    /// Slide content of a page.
    pub fn get_slide_content(
        &mut self,
        index: &LinkedIndex,
        story_id: &str,
    ) -> Result<String, ClientError> {
        let import_path = import_path_of(index, story_id)?;
        let response = self.call(&GetSlideSourceRequest {
            story_id: story_id.to_string(),
            import_path,
        })?;
        Ok(response.content)
    }

    /// Replace a page's slide content.
    pub fn save_slide(
        &mut self,
        index: &LinkedIndex,
        story_id: &str,
        content: &str,
    ) -> Result<(), ClientError> {
        let import_path = import_path_of(index, story_id)?;
        self.call(&SaveSlideRequest {
            story_id: story_id.to_string(),
            import_path,
            content: content.to_string(),
        })?;
        Ok(())
    }

    /// Swap a slide with its predecessor in the deck.
    pub fn move_slide_up(&mut self, index: &LinkedIndex, story_id: &str) -> Result<(), ClientError> {
        let (paths, position) = deck_position(index, story_id)?;
        if position == 0 {
            return Err(ClientError::NoNeighbour {
                story_id: story_id.to_string(),
                direction: Direction::Prev,
            });
        }
        self.swap_up(&paths, position)
    }

    /// Swap a slide with its successor in the deck.
    pub fn move_slide_down(
        &mut self,
        index: &LinkedIndex,
        story_id: &str,
    ) -> Result<(), ClientError> {
        let (paths, position) = deck_position(index, story_id)?;
        if position + 1 >= paths.len() {
            return Err(ClientError::NoNeighbour {
                story_id: story_id.to_string(),
                direction: Direction::Next,
            });
        }
        self.swap_down(&paths, position)
    }

    fn swap_up(&mut self, paths: &[String], position: usize) -> Result<(), ClientError> {
        self.call(&MoveSlideUpRequest {
            story_import_path: paths[position].clone(),
            previous_import_path: paths[position - 1].clone(),
        })?;
        Ok(())
    }

    fn swap_down(&mut self, paths: &[String], position: usize) -> Result<(), ClientError> {
        self.call(&MoveSlideDownRequest {
            story_import_path: paths[position].clone(),
            next_import_path: paths[position + 1].clone(),
        })?;
        Ok(())
    }

    /// Remove a slide; later slides shift up.
    pub fn delete_slide(&mut self, index: &LinkedIndex, story_id: &str) -> Result<(), ClientError> {
        let target_import_path = import_path_of(index, story_id)?;
        let all_slide_import_paths = index.sibling_import_paths(story_id)?;
        self.call(&DeleteSlideRequest {
            target_import_path,
            all_slide_import_paths,
        })?;
        Ok(())
    }

    /// Insert a slide at position `at` of `story_id`'s deck, returning the
    /// import path of the file that was created.
    pub fn insert_slide_at(
        &mut self,
        index: &LinkedIndex,
        story_id: &str,
        at: usize,
        content: &str,
    ) -> Result<String, ClientError> {
        let all_slide_import_paths = index.sibling_import_paths(story_id)?;
        let response = self.call(&InsertSlideRequest {
            insert_at_index: at,
            all_slide_import_paths,
            content: Some(content.to_string()),
        })?;
        Ok(response.new_import_path)
    }

    /// Insert a slide at the end of `story_id`'s deck.
    pub fn append_slide(
        &mut self,
        index: &LinkedIndex,
        story_id: &str,
        content: &str,
    ) -> Result<String, ClientError> {
        let len = index.siblings(story_id)?.len();
        self.insert_slide_at(index, story_id, len, content)
    }

    /// Carry out a completed drag: move the dragged slide to the drop zone
    /// with adjacent swaps. Returns the number of swaps sent.
    pub fn move_slide_to(
        &mut self,
        index: &LinkedIndex,
        intent: &DropIntent,
    ) -> Result<usize, ClientError> {
        let siblings = index.siblings(&intent.dragged)?;
        let ids: Vec<&str> = siblings.iter().map(|entry| entry.id.as_str()).collect();
        let paths: Vec<String> = siblings
            .iter()
            .map(|entry| entry.import_path.clone())
            .collect();
        let (from, to) = intent
            .positions(&ids)
            .ok_or_else(|| ClientError::NotInDeck(intent.zone.target.clone()))?;

        tracing::debug!(dragged = %intent.dragged, zone = %intent.zone, from, to, "moving slide");
        if from < to {
            for position in from..to {
                self.swap_down(&paths, position)?;
            }
        } else {
            for position in (to + 1..=from).rev() {
                self.swap_up(&paths, position)?;
            }
        }
        Ok(from.abs_diff(to))
    }
}

fn import_path_of(index: &LinkedIndex, story_id: &str) -> Result<String, ClientError> {
    index
        .get(story_id)
        .map(|entry| entry.data.import_path.clone())
        .ok_or_else(|| IndexError::UnknownStory(story_id.to_string()).into())
}

fn deck_position(index: &LinkedIndex, story_id: &str) -> Result<(Vec<String>, usize), ClientError> {
    let position = index
        .position_in_deck(story_id)?
        .ok_or_else(|| ClientError::NotInDeck(story_id.to_string()))?;
    Ok((index.sibling_import_paths(story_id)?, position))
}
