//! Per-channel merge strategies.
//!
//! Every state channel has a reducer deciding how a [`NodePartial`] delta
//! folds into the running state. The transcript channel appends, replacing
//! in place when an incoming message reuses an existing id; the extra
//! channel is a shallow last-write-wins map merge. Reducers never drop or
//! reorder existing data.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::node::NodePartial;
use crate::state::ConversationState;
use crate::types::ChannelType;

/// A reducer folds one partial update into the running state.
pub trait Reducer: Send + Sync {
    fn apply(&self, state: &mut ConversationState, update: &NodePartial);
}

/// Reducer failures (currently only an unregistered channel).
#[derive(Debug, Error, Diagnostic)]
pub enum ReducerError {
    #[error("no reducer registered for channel: {0}")]
    #[diagnostic(
        code(threadloom::reducers::unknown_channel),
        help("Register a reducer for every channel a node writes to.")
    )]
    UnknownChannel(ChannelType),
}

/// Append messages to the transcript; an incoming message whose id matches
/// an existing one replaces it in place instead.
pub struct AddMessages;

impl Reducer for AddMessages {
    fn apply(&self, state: &mut ConversationState, update: &NodePartial) {
        let Some(incoming) = &update.messages else {
            return;
        };
        for message in incoming {
            match state.messages.iter_mut().find(|m| m.id == message.id) {
                Some(existing) => *existing = message.clone(),
                None => state.messages.push(message.clone()),
            }
        }
    }
}

/// Shallow last-write-wins merge into the extra map.
pub struct MergeExtras;

impl Reducer for MergeExtras {
    fn apply(&self, state: &mut ConversationState, update: &NodePartial) {
        let Some(incoming) = &update.extra else {
            return;
        };
        for (key, value) in incoming {
            state.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Skip reducers whose channel has nothing in the partial.
fn channel_guard(channel: ChannelType, partial: &NodePartial) -> bool {
    match channel {
        ChannelType::Messages => partial
            .messages
            .as_ref()
            .map(|v| !v.is_empty())
            .unwrap_or(false),
        ChannelType::Extra => partial
            .extra
            .as_ref()
            .map(|m| !m.is_empty())
            .unwrap_or(false),
    }
}

/// Channel-keyed registry of reducers.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<ChannelType, Arc<dyn Reducer>>,
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self::new()
            .with_reducer(ChannelType::Messages, Arc::new(AddMessages))
            .with_reducer(ChannelType::Extra, Arc::new(MergeExtras))
    }
}

impl ReducerRegistry {
    /// Empty registry; use [`Default`] for the standard wiring.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    /// Registers a reducer for a channel (builder style).
    #[must_use]
    pub fn with_reducer(mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) -> Self {
        self.reducer_map.insert(channel, reducer);
        self
    }

    /// Applies the reducer for one channel, skipping empty deltas.
    pub fn try_update(
        &self,
        channel: ChannelType,
        state: &mut ConversationState,
        update: &NodePartial,
    ) -> Result<(), ReducerError> {
        if !channel_guard(channel, update) {
            return Ok(());
        }
        match self.reducer_map.get(&channel) {
            Some(reducer) => {
                reducer.apply(state, update);
                Ok(())
            }
            None => Err(ReducerError::UnknownChannel(channel)),
        }
    }

    /// Applies a reducer for every channel the partial populates.
    ///
    /// A populated channel with no registered reducer is an error, not a
    /// silent drop.
    pub fn apply_all(
        &self,
        state: &mut ConversationState,
        update: &NodePartial,
    ) -> Result<(), ReducerError> {
        for channel in [ChannelType::Messages, ChannelType::Extra] {
            self.try_update(channel, state, update)?;
        }
        Ok(())
    }
}
