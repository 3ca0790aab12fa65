use std::fmt::Debug;

/// State threaded through a graph.
///
/// Nodes never mutate state directly; they emit `Update`s which the runtime
/// folds in with [`GraphState::apply`]. Usually derived with
/// `#[derive(State)]` from `tripgraph-macros`.
pub trait GraphState: Debug + Clone + Send + Sync + 'static {
    type Update: Debug + Send;

    /// Fold a single update into this state.
    fn apply(&mut self, update: Self::Update);

    /// Apply multiple updates in sequence.
    fn apply_many<I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = Self::Update>,
        Self: Sized,
    {
        for update in updates {
            self.apply(update);
        }
    }
}
