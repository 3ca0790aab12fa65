use crate::*;
use tripgraph_macros::State;

#[derive(State, Debug, Clone, Default)]
struct CounterState {
    count: i32,
    #[update(append)]
    history: Vec<String>,
}

#[test]
fn test_replace_and_append_updates() {
    let mut state = CounterState::default();
    state.apply_many(vec![
        CounterStateUpdate::Count(3),
        CounterStateUpdate::History(vec!["a".to_string()]),
        CounterStateUpdate::History(vec!["b".to_string()]),
        CounterStateUpdate::Count(5),
    ]);

    assert_eq!(state.count, 5);
    assert_eq!(state.history, vec!["a", "b"]);
}

#[test]
fn test_node_output_full_replaces_state() {
    let mut state = CounterState {
        count: 1,
        history: vec!["kept?".to_string()],
    };
    NodeOutput::Full(CounterState::default()).apply_to(&mut state);
    assert_eq!(state.count, 0);
    assert!(state.history.is_empty());
}

#[test]
fn test_hidden_messages() {
    let message = Message::tool("call_1", "Successfully extracted trip details").hidden();
    assert!(message.is_hidden());
    assert!(message.id.starts_with(DO_NOT_RENDER_ID_PREFIX));
    assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
    assert!(!Message::human("hi").is_hidden());
}

#[test]
fn test_message_serializes_with_type_tag() {
    let message = Message::ai("hello");
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["type"], "ai");
    assert!(value.get("tool_calls").is_none());
}
