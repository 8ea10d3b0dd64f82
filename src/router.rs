//! Server-side dispatch of named requests.
//!
//! [`Router::handle`] turns one [`RequestEnvelope`] into exactly one
//! [`ResponseEnvelope`] with the same id. Nothing escapes it: unknown
//! operations, malformed payloads and mutation failures all become failure
//! responses whose `error` starts with the failure family:
//!
//! | Error                                   | Family           |
//! |-----------------------------------------|------------------|
//! | missing block, path not in deck, index  | `NotFound`       |
//! | replacement text or file fails to parse | `InvalidContent` |
//! | read/write/remove failure, bad path     | `IOError`        |
//! | unknown op, bad payload, encoding       | `UnknownError`   |
//!
//! The router holds no state between requests. [`serve`] runs it over a
//! line-delimited JSON channel, one request at a time in arrival order.

use crate::config::DeckConfig;
use crate::mutate::Mutator;
use crate::protocol::{
    DeleteSlideRequest, Empty, ErrorKind, GetSlideSourceRequest, GetSlideSourceResponse,
    InsertSlideRequest, InsertSlideResponse, MoveSlideDownRequest, MoveSlideUpRequest, Operation,
    Request, RequestEnvelope, ResponseEnvelope, SaveSlideRequest,
};
use crate::slide::SlideError;
use crate::store::SlideStore;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Invalid {op} payload: {source}")]
    InvalidPayload {
        op: Operation,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Slide(#[from] SlideError),
    #[error("Cannot encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RouterError {
    /// Failure family reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::Slide(err) => match err {
                SlideError::NotFound { .. }
                | SlideError::NotInDeck(_)
                | SlideError::IndexOutOfRange { .. } => ErrorKind::NotFound,
                SlideError::InvalidContent(_)
                | SlideError::Markup { .. }
                | SlideError::NotPreserved { .. } => ErrorKind::InvalidContent,
                SlideError::Io { .. }
                | SlideError::OutsideRoot(_)
                | SlideError::NumbersExhausted { .. } => ErrorKind::IoError,
            },
            RouterError::UnknownOperation(_)
            | RouterError::InvalidPayload { .. }
            | RouterError::Encode(_) => ErrorKind::UnknownError,
        }
    }
}

/// Dispatches requests to the mutation engine over one store.
pub struct Router<S: SlideStore> {
    store: S,
    config: DeckConfig,
}

impl<S: SlideStore> Router<S> {
    pub fn new(store: S, config: DeckConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Answer one request. Never fails; errors become failure responses.
    pub fn handle(&self, request: &RequestEnvelope) -> ResponseEnvelope {
        match self.dispatch(request) {
            Ok(payload) => ResponseEnvelope::success(request, payload),
            Err(err) => ResponseEnvelope::failure(request, err.kind(), &err),
        }
    }

    fn dispatch(&self, request: &RequestEnvelope) -> Result<Value, RouterError> {
        let Some(op) = Operation::from_name(&request.op) else {
            tracing::error!(op = %request.op, id = %request.id, "unknown operation");
            return Err(RouterError::UnknownOperation(request.op.clone()));
        };

        match op {
            Operation::GetSlideSource => self.run(request, |m, req: GetSlideSourceRequest| {
                let content = m.read_content(&req.import_path)?;
                Ok(GetSlideSourceResponse {
                    content,
                    story_id: req.story_id,
                })
            }),
            Operation::SaveSlide => self.run(request, |m, req: SaveSlideRequest| {
                m.save(&req.import_path, &req.content)?;
                Ok(Empty {})
            }),
            Operation::MoveSlideUp => self.run(request, |m, req: MoveSlideUpRequest| {
                m.move_up(&req.story_import_path, &req.previous_import_path)?;
                Ok(Empty {})
            }),
            Operation::MoveSlideDown => self.run(request, |m, req: MoveSlideDownRequest| {
                m.move_down(&req.story_import_path, &req.next_import_path)?;
                Ok(Empty {})
            }),
            Operation::DeleteSlide => self.run(request, |m, req: DeleteSlideRequest| {
                m.delete(&req.target_import_path, &req.all_slide_import_paths)?;
                Ok(Empty {})
            }),
            Operation::InsertSlide => self.run(request, |m, req: InsertSlideRequest| {
                let new_import_path = m.insert_at(
                    req.insert_at_index,
                    &req.all_slide_import_paths,
                    req.content.as_deref().unwrap_or_default(),
                )?;
                Ok(InsertSlideResponse { new_import_path })
            }),
        }
    }

    /// Decode the payload as `R`, run `action`, encode its result. Logs the
    /// request at debug and any failure at error, both with the request's
    /// identifying fields.
    fn run<R, F>(&self, request: &RequestEnvelope, action: F) -> Result<Value, RouterError>
    where
        R: Request,
        F: FnOnce(&Mutator<'_, S>, R) -> Result<R::Response, SlideError>,
    {
        let op = R::OP;
        let payload: R = serde_json::from_value(request.payload.clone()).map_err(|source| {
            tracing::error!(op = %op, id = %request.id, error = %source, "invalid payload");
            RouterError::InvalidPayload { op, source }
        })?;

        let context = payload.describe();
        tracing::debug!(op = %op, id = %request.id, %context, "handling request");

        let mutator = Mutator::new(&self.store, &self.config);
        let result = action(&mutator, payload)
            .map_err(RouterError::from)
            .and_then(|response| serde_json::to_value(response).map_err(RouterError::Encode));

        if let Err(err) = &result {
            tracing::error!(op = %op, id = %request.id, %context, error = %err, "request failed");
        }
        result
    }
}

/// Serve requests from `reader`, one JSON envelope per line, writing one
/// response line each to `writer`. Returns the number of requests handled
/// once `reader` reaches end of input.
pub fn serve<S: SlideStore>(
    router: &Router<S>,
    reader: impl BufRead,
    mut writer: impl Write,
) -> io::Result<usize> {
    let mut handled = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: RequestEnvelope = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "skipping line that is not a request envelope");
                continue;
            }
        };
        let response = router.handle(&request);
        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        handled += 1;
    }
    tracing::debug!(handled, "request channel closed");
    Ok(handled)
}
