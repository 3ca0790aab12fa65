use crate::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tripgraph_macros::State;

#[derive(State, Debug, Clone, PartialEq)]
struct CounterState {
    #[update(replace)]
    count: i32,
}

fn create_add_1_node() -> impl Node<CounterState> {
    FunctionNode::new("node1", |_ctx, state: CounterState| async move {
        Ok(NodeOutput::Updates(vec![CounterStateUpdate::Count(
            state.count + 1,
        )]))
    })
}

fn create_multiply_2_node() -> impl Node<CounterState> {
    FunctionNode::new("node2", |_ctx, state: CounterState| async move {
        Ok(NodeOutput::Full(CounterState {
            count: state.count * 2,
        }))
    })
}

#[tokio::test]
async fn test_basic_graph() {
    let built_graph = {
        let mut graph = Graph::new("g");
        graph
            .add_node(create_add_1_node())
            .add_node(create_multiply_2_node())
            .add_edge("node1", "node2")
            .add_edge(START, "node1")
            .add_edge("node2", END);
        graph.build()
    };

    let ctx = Context::new("test");
    let result = built_graph
        .run(&ctx, CounterState { count: 1 })
        .await
        .unwrap();

    // 1 + 1 = 2, 2 * 2 = 4
    assert_eq!(result.count, 4);
}

#[tokio::test]
async fn test_conditional_graph() {
    let built_graph = {
        let mut graph = Graph::new("g");
        graph
            .add_node(create_add_1_node())
            .add_node(create_multiply_2_node())
            .add_edge(START, "node1")
            .add_edge("node2", END)
            .add_conditional_edge("node1", |state: &CounterState| {
                if state.count < 5 {
                    "node2".into()
                } else {
                    END.into()
                }
            });
        graph.build()
    };

    let result = built_graph
        .run(&Context::new("test1"), CounterState { count: 1 })
        .await
        .unwrap();
    assert_eq!(result.count, 4);

    let result = built_graph
        .run(&Context::new("test2"), CounterState { count: 5 })
        .await
        .unwrap();
    assert_eq!(result.count, 6);
}

#[tokio::test]
async fn test_build_rejects_dangling_edge() {
    let built_graph = {
        let mut graph = Graph::new("g");
        graph
            .add_node(create_add_1_node())
            .add_edge(START, "node1")
            .add_edge("node1", "missing");
        graph.build()
    };

    let err = built_graph
        .run(&Context::default(), CounterState { count: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
}

#[tokio::test]
async fn test_missing_start_edge() {
    let built_graph = {
        let mut graph = Graph::new("g");
        graph.add_node(create_add_1_node()).add_edge("node1", END);
        graph.build()
    };

    let err = built_graph
        .run(&Context::default(), CounterState { count: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
}

#[tokio::test]
async fn test_conditional_edge_to_unknown_node() {
    let built_graph = {
        let mut graph = Graph::new("g");
        graph
            .add_node(create_add_1_node())
            .add_edge(START, "node1")
            .add_conditional_edge("node1", |_: &CounterState| "ghost".to_string());
        graph.build()
    };

    let err = built_graph
        .run(&Context::default(), CounterState { count: 0 })
        .await
        .unwrap_err();
    assert_eq!(err, GraphError::NodeNotFound("ghost".into()));
}

#[tokio::test]
async fn test_missing_transition() {
    let built_graph = {
        let mut graph = Graph::new("g");
        graph.add_node(create_add_1_node()).add_edge(START, "node1");
        graph.build()
    };

    let err = built_graph
        .run(&Context::default(), CounterState { count: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_recursion_limit() {
    let built_graph = {
        let mut graph = Graph::new("loop");
        graph
            .add_node(create_add_1_node())
            .add_edge(START, "node1")
            .add_edge("node1", "node1")
            .with_recursion_limit(5);
        graph.build()
    };

    let err = built_graph
        .run(&Context::default(), CounterState { count: 0 })
        .await
        .unwrap_err();
    assert_eq!(err, GraphError::RecursionLimit(5));
}

#[tokio::test(start_paused = true)]
async fn test_node_config_retries_retryable_errors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let node_calls = Arc::clone(&calls);
    let flaky = FunctionNode::new("flaky", move |_ctx, state: CounterState| {
        let calls = Arc::clone(&node_calls);
        async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AgentError::Routing("no decision".into()))
            } else {
                Ok(NodeOutput::update(CounterStateUpdate::Count(state.count + 10)))
            }
        }
    });

    let built_graph = {
        let mut graph = Graph::new("g");
        graph
            .add_node(flaky)
            .add_edge(START, "flaky")
            .add_edge("flaky", END)
            .configure_node(
                "flaky",
                NodeConfig::new().with_retry(
                    RetryOptions::new()
                        .max_retries(2)
                        .base_delay(Duration::from_millis(10)),
                ),
            );
        graph.build()
    };

    let result = built_graph
        .run(&Context::default(), CounterState { count: 1 })
        .await
        .unwrap();
    assert_eq!(result.count, 11);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_node_config_timeout() {
    let slow = FunctionNode::new("slow", |_ctx, _state: CounterState| async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(NodeOutput::none())
    });

    let built_graph = {
        let mut graph = Graph::new("g");
        graph
            .add_node(slow)
            .add_edge(START, "slow")
            .add_edge("slow", END)
            .configure_node(
                "slow",
                NodeConfig::new().with_timeout(Duration::from_secs(1)),
            );
        graph.build()
    };

    let err = built_graph
        .run(&Context::default(), CounterState { count: 0 })
        .await
        .unwrap_err();
    match err {
        GraphError::Node(AgentError::Timeout(message)) => {
            assert_eq!(message, "slow timed out after 1000ms")
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_subgraph_propagates_node_error() {
    let inner = {
        let mut graph = Graph::new("inner");
        graph
            .add_node(FunctionNode::new(
                "classify",
                |_ctx, _state: CounterState| async move {
                    Err(AgentError::Classification("No classification result".into()))
                },
            ))
            .add_edge(START, "classify")
            .add_edge("classify", END);
        graph.build()
    };

    let outer = {
        let mut graph = Graph::new("outer");
        graph
            .add_node(inner)
            .add_edge(START, "inner")
            .add_edge("inner", END);
        graph.build()
    };

    let err = outer
        .run(&Context::default(), CounterState { count: 0 })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::Node(AgentError::Classification(
            "No classification result".into()
        ))
    );
}

#[tokio::test]
async fn test_subgraph_runs_as_node() {
    let inner = {
        let mut graph = Graph::new("inner");
        graph
            .add_node(create_multiply_2_node())
            .add_edge(START, "node2")
            .add_edge("node2", END);
        graph.build()
    };

    let outer = {
        let mut graph = Graph::new("outer");
        graph
            .add_node(create_add_1_node())
            .add_node(inner)
            .add_edge(START, "node1")
            .add_edge("node1", "inner")
            .add_edge("inner", END);
        graph.build()
    };

    let result = outer
        .run(&Context::default(), CounterState { count: 2 })
        .await
        .unwrap();
    assert_eq!(result.count, 6);
}

#[test]
fn test_edge_debug_formatting() {
    let direct_edge: Edge<CounterState> = Edge::Direct("next".to_string());
    assert!(format!("{:?}", direct_edge).contains("Direct"));

    let condition: Condition<CounterState> = Arc::new(|state: &CounterState| {
        if state.count > 5 {
            "high".to_string()
        } else {
            "low".to_string()
        }
    });
    let cond_edge: Edge<CounterState> = Edge::Conditional(condition);
    assert!(format!("{:?}", cond_edge).contains("Conditional"));
    assert_eq!(cond_edge.next(&CounterState { count: 10 }), "high");
    assert_eq!(cond_edge.next(&CounterState { count: 3 }), "low");
}
