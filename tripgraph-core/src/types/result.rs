use crate::{AgentError, GraphError, GraphState};

#[derive(Debug)]
pub enum NodeOutput<S>
where
    S: GraphState,
{
    /// The node has produced an entirely new state.
    Full(S),

    /// The node has produced zero or more updates to the existing state.
    Updates(Vec<S::Update>),
}

impl<S: GraphState> NodeOutput<S> {
    pub fn update(update: S::Update) -> Self {
        NodeOutput::Updates(vec![update])
    }

    pub fn none() -> Self {
        NodeOutput::Updates(Vec::new())
    }

    pub(crate) fn apply_to(self, state: &mut S) {
        match self {
            NodeOutput::Full(next) => *state = next,
            NodeOutput::Updates(updates) => state.apply_many(updates),
        }
    }
}

pub type NodeResult<S> = Result<NodeOutput<S>, AgentError>;

pub type GraphResult<T> = Result<T, GraphError>;
