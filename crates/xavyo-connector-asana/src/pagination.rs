//! Continuation tokens handed to the sync runtime.
//!
//! A token is a stack of per-resource cursors, serialized as JSON and
//! encoded with URL-safe base64. Syncers only ever see plain cursor strings:
//! [`PageBag::current`] for the request and [`PageBag::advance`] for the
//! response.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::resource::ResourceId;
use crate::{AsanaError, AsanaResult};

/// Cursor for one resource being paged through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub resource_type_id: String,
    pub resource_id: String,
    #[serde(default)]
    pub token: String,
}

impl PageState {
    fn seed(resource_id: &ResourceId) -> Self {
        Self {
            resource_type_id: resource_id.resource_type.clone(),
            resource_id: resource_id.resource.clone(),
            token: String::new(),
        }
    }

    fn belongs_to(&self, resource_id: &ResourceId) -> bool {
        self.resource_type_id == resource_id.resource_type
            && self.resource_id == resource_id.resource
    }
}

/// Ordered collection of page states; the last one is current.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBag {
    states: Vec<PageState>,
}

impl PageBag {
    /// Decodes `token`, seeding a fresh state for `seed` when the token is empty.
    ///
    /// # Errors
    ///
    /// Returns `AsanaError::InvalidPageToken` if the token is not a bag this
    /// connector produced, or if its outermost state belongs to a resource
    /// other than `seed`.
    pub fn parse(token: &str, seed: &ResourceId) -> AsanaResult<Self> {
        let mut bag = if token.is_empty() {
            Self::default()
        } else {
            let bytes = URL_SAFE_NO_PAD
                .decode(token)
                .map_err(|e| AsanaError::InvalidPageToken(e.to_string()))?;
            serde_json::from_slice::<Self>(&bytes)
                .map_err(|e| AsanaError::InvalidPageToken(e.to_string()))?
        };

        match bag.states.first() {
            None => bag.push(PageState::seed(seed)),
            Some(root) if !root.belongs_to(seed) => {
                return Err(AsanaError::InvalidPageToken(format!(
                    "token belongs to {}:{}, not {seed}",
                    root.resource_type_id, root.resource_id
                )));
            }
            Some(_) => {}
        }

        Ok(bag)
    }

    /// Cursor to send upstream; empty on the first page.
    #[must_use]
    pub fn current(&self) -> &str {
        self.states.last().map_or("", |s| s.token.as_str())
    }

    /// The state currently being paged.
    #[must_use]
    pub fn current_state(&self) -> Option<&PageState> {
        self.states.last()
    }

    /// Pushes a nested state to be paged before the current one resumes.
    pub fn push(&mut self, state: PageState) {
        self.states.push(state);
    }

    /// Drops the current state.
    pub fn pop(&mut self) -> Option<PageState> {
        self.states.pop()
    }

    /// Records the upstream's next offset and returns the outer token.
    ///
    /// An empty `next_offset` finishes the current state; once no state is
    /// left the returned token is empty, which ends the runtime's paging loop.
    ///
    /// # Errors
    ///
    /// Returns `AsanaError::Json` if the bag cannot be serialized.
    pub fn advance(&mut self, next_offset: &str) -> AsanaResult<String> {
        if next_offset.is_empty() {
            self.pop();
        } else if let Some(state) = self.states.last_mut() {
            state.token = next_offset.to_string();
        }

        self.marshal()
    }

    /// Serializes the bag, or returns an empty token if nothing is left.
    ///
    /// # Errors
    ///
    /// Returns `AsanaError::Json` if the bag cannot be serialized.
    pub fn marshal(&self) -> AsanaResult<String> {
        if self.states.is_empty() {
            return Ok(String::new());
        }

        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}
