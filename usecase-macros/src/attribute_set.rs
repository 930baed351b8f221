use crate::utils::{apply_derives, has_serde_flag, is_option};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Ident, Item, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[attribute_set] 宏实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as AttributeSetConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[attribute_set] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let actor_name = cfg
        .actor
        .unwrap_or_else(|| Ident::new("current_user", proc_macro2::Span::call_site()));

    // 操作主体字段：存在则生成 current_user()，否则沿用 trait 默认实现
    let actor_fn = fields_named
        .named
        .iter()
        .find(|f| f.ident.as_ref().map(|i| *i == actor_name).unwrap_or(false))
        .map(|f| {
            let body = if is_option(&f.ty) {
                quote! { self.#actor_name.as_ref() }
            } else {
                quote! { ::std::option::Option::Some(&self.#actor_name) }
            };
            quote! {
                fn current_user(&self) -> ::std::option::Option<&::usecase_domain::actor::Actor> {
                    #body
                }
            }
        });

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    apply_derives(&mut st.attrs, required);

    if !has_serde_flag(&st.attrs, "deny_unknown_fields") {
        st.attrs.push(syn::parse_quote!(#[serde(deny_unknown_fields)]));
    }

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let expanded = quote! {
        #st

        impl #impl_generics ::usecase_domain::attributes::AttributeSet for #ident #ty_generics #where_clause {
            #actor_fn
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

// 解析键值参数：actor = <ident>
struct AttributeSetConfig {
    actor: Option<Ident>,
}

impl Parse for AttributeSetConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut actor: Option<Ident> = None;

        if input.is_empty() {
            return Ok(Self { actor });
        }

        let pairs: syn::punctuated::Punctuated<KvIdent, Token![,]> =
            syn::punctuated::Punctuated::parse_terminated(input)?;

        for kv in pairs {
            match kv.key.to_string().as_str() {
                "actor" => {
                    if actor.is_some() {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "duplicate key 'actor' in attribute",
                        ));
                    }
                    actor = Some(kv.value);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key in attribute; expected 'actor'",
                    ));
                }
            }
        }

        Ok(Self { actor })
    }
}

struct KvIdent {
    key: Ident,
    value: Ident,
}

impl Parse for KvIdent {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Ident = input.parse()?;
        Ok(Self { key, value })
    }
}
