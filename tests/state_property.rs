//! Property tests for reducer invariants: existing transcript entries are
//! never dropped or reordered, whatever deltas arrive.

use proptest::prelude::*;
use rustc_hash::FxHashMap;
use threadloom::message::Message;
use threadloom::node::NodePartial;
use threadloom::reducers::ReducerRegistry;
use threadloom::state::ConversationState;

fn role_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        Message::USER,
        Message::ASSISTANT,
        Message::SYSTEM,
        Message::TOOL,
    ])
}

fn message_strategy() -> impl Strategy<Value = Message> {
    (role_strategy(), "[a-z ]{0,24}").prop_map(|(role, content)| Message::new(role, &content))
}

fn delta_strategy() -> impl Strategy<Value = NodePartial> {
    (
        prop::collection::vec(message_strategy(), 0..4),
        prop::collection::hash_map("[a-z]{1,8}", "[a-z]{0,8}", 0..3),
    )
        .prop_map(|(messages, extra)| {
            let extra: FxHashMap<String, serde_json::Value> = extra
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();
            NodePartial::new().with_messages(messages).with_extra(extra)
        })
}

proptest! {
    /// Fresh messages only ever append: ids already in the transcript stay
    /// put, in order, whatever deltas are merged after them.
    #[test]
    fn merging_preserves_existing_message_order(
        seed in prop::collection::vec(message_strategy(), 1..5),
        deltas in prop::collection::vec(delta_strategy(), 0..5),
    ) {
        let registry = ReducerRegistry::default();
        let mut state = ConversationState::new_with_messages(seed.clone());
        let original_ids: Vec<String> = seed.iter().map(|m| m.id.clone()).collect();

        for delta in &deltas {
            registry.apply_all(&mut state, delta).expect("reducers wired");
        }

        // All original ids survive, in their original relative order.
        let surviving: Vec<String> = state
            .messages
            .iter()
            .map(|m| m.id.clone())
            .filter(|id| original_ids.contains(id))
            .collect();
        prop_assert_eq!(surviving, original_ids);
    }

    /// Replacing by id changes content in place without growing the
    /// transcript.
    #[test]
    fn replacement_by_id_never_grows_the_transcript(
        seed in prop::collection::vec(message_strategy(), 1..5),
        index in any::<prop::sample::Index>(),
        new_content in "[a-z ]{0,24}",
    ) {
        let registry = ReducerRegistry::default();
        let mut state = ConversationState::new_with_messages(seed.clone());
        let target = index.get(&seed);

        let mut edited = target.clone();
        edited.content = new_content.clone();
        registry
            .apply_all(&mut state, &NodePartial::new().with_messages(vec![edited]))
            .expect("reducers wired");

        prop_assert_eq!(state.messages.len(), seed.len());
        let position = seed.iter().position(|m| m.id == target.id).unwrap();
        prop_assert_eq!(&state.messages[position].content, &new_content);
    }
}
