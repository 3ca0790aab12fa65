use proc_macro::TokenStream;

mod state;

/// Derives `tripgraph_core::GraphState` for a struct with named fields.
///
/// Every field becomes a variant of a generated `<Name>Update` enum. The
/// `#[update(...)]` attribute picks how an update is applied:
///
/// - `replace` (default): the field is overwritten
/// - `append`: the update is `extend`ed onto the field
#[proc_macro_derive(State, attributes(update))]
pub fn derive_state(input: TokenStream) -> TokenStream {
    state::derive_state_impl(input)
}
