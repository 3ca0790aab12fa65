use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Error, Field, Fields, Ident};

enum UpdateStrategy {
    Replace,
    Append,
}

fn update_strategy(field: &Field) -> syn::Result<UpdateStrategy> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("update")) else {
        return Ok(UpdateStrategy::Replace);
    };

    let strategy: Ident = attr.parse_args()?;
    match strategy.to_string().as_str() {
        "replace" => Ok(UpdateStrategy::Replace),
        // `merge` is kept as an alias for map-like fields
        "append" | "merge" => Ok(UpdateStrategy::Append),
        other => Err(Error::new(
            strategy.span(),
            format!("Unknown update strategy: {other} (expected `replace` or `append`)"),
        )),
    }
}

pub fn derive_state_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let vis = &input.vis;
    let update_name = format_ident!("{}Update", name);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Error::new_spanned(name, "State can only be derived for named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return Error::new_spanned(name, "State can only be derived for structs")
                .to_compile_error()
                .into()
        }
    };

    let mut update_variants = vec![];
    let mut update_match_arms = vec![];

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;

        let strategy = match update_strategy(field) {
            Ok(strategy) => strategy,
            Err(err) => return err.to_compile_error().into(),
        };

        let variant_name = format_ident!("{}", field_name.to_string().to_case(Case::Pascal));
        update_variants.push(quote! {
            #variant_name(#field_type)
        });

        let apply = match strategy {
            UpdateStrategy::Replace => quote! { self.#field_name = value },
            UpdateStrategy::Append => quote! { self.#field_name.extend(value) },
        };

        update_match_arms.push(quote! {
            #update_name::#variant_name(value) => { #apply }
        });
    }

    let expanded = quote! {
        #[derive(Debug)]
        #vis enum #update_name {
            #(#update_variants),*
        }

        impl ::tripgraph_core::GraphState for #name {
            type Update = #update_name;

            fn apply(&mut self, update: Self::Update) {
                match update {
                    #(#update_match_arms),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}
