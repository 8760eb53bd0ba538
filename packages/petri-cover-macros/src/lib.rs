use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Expr, GenericArgument, Ident, PathArguments, Token, Type, Visibility,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    token,
};

/// A single `name: Type = default` entry of a `config!` block, together with
/// any outer attributes (usually doc comments) written above it.
struct ConfigField {
    attrs: Vec<Attribute>,
    name: Ident,
    ty: Type,
    default_value: Expr,
    partial_ty: Option<Type>,
}

impl Parse for ConfigField {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let name: Ident = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty: Type = input.parse()?;

        // field: Type = Default
        // field: NestedConfig (PartialType = Default)
        let (partial_ty, default_value) = if input.peek(token::Paren) {
            let content;
            syn::parenthesized!(content in input);
            let partial_ty: Type = content.parse()?;
            content.parse::<Token![=]>()?;
            (Some(partial_ty), content.parse()?)
        } else {
            input.parse::<Token![=]>()?;
            (None, input.parse()?)
        };

        Ok(ConfigField {
            attrs,
            name,
            ty,
            default_value,
            partial_ty,
        })
    }
}

struct ConfigInput {
    attrs: Vec<Attribute>,
    vis: Visibility,
    name: Ident,
    fields: Punctuated<ConfigField, Token![,]>,
}

impl Parse for ConfigInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![struct]>()?;
        let name: Ident = input.parse()?;
        let content;
        syn::braced!(content in input);
        let fields = content.parse_terminated(ConfigField::parse, Token![,])?;
        Ok(ConfigInput {
            attrs,
            vis,
            name,
            fields,
        })
    }
}

fn is_option(ty: &Type) -> bool {
    if let Type::Path(tp) = ty
        && let Some(seg) = tp.path.segments.last()
        && seg.ident == "Option"
        && let PathArguments::AngleBracketed(args) = &seg.arguments
    {
        return args.args.len() == 1 && matches!(args.args[0], GenericArgument::Type(_));
    }
    false
}

/// Generates a config struct with defaults, a `Partial*` twin where every
/// field is optional (for TOML files that only override some values), and
/// builder style accessors.
///
/// ```ignore
/// config! {
///     /// Exploration settings.
///     pub struct ExploreConfig {
///         /// Give up after this many nodes.
///         max_nodes: Option<u64> = None,
///         logger: LoggerConfig (Option<PartialLoggerConfig> = LoggerConfig::default()),
///     }
/// }
/// ```
#[proc_macro]
pub fn config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ConfigInput);
    let attrs = &input.attrs;
    let vis = &input.vis;
    let struct_name = &input.name;
    let partial_struct_name = format_ident!("Partial{}", struct_name);

    let fields = input.fields.iter().map(|f| {
        let attrs = &f.attrs;
        let name = &f.name;
        let ty = &f.ty;
        quote! { #( #attrs )* #name: #ty }
    });

    let partial_fields = input.fields.iter().map(|f| {
        let name = &f.name;
        let ty = &f.ty;
        let partial_ty = match &f.partial_ty {
            Some(pt) => quote! { #pt },
            None if is_option(ty) => quote! { #ty },
            None => quote! { Option<#ty> },
        };
        quote! {
            #[serde(default)]
            #name: #partial_ty
        }
    });

    let from_partial_assignments = input.fields.iter().map(|f| {
        let name = &f.name;
        let default_value = &f.default_value;
        quote! { #name: partial.#name.into_or(#default_value) }
    });

    let methods = input.fields.iter().map(|f| {
        let attrs = &f.attrs;
        let name = &f.name;
        let ty = &f.ty;
        let with_name = format_ident!("with_{}", name);
        let set_name = format_ident!("set_{}", name);
        let get_name = format_ident!("get_{}", name);
        quote! {
            pub fn #with_name(mut self, #name: #ty) -> Self {
                self.#name = #name;
                self
            }
            pub fn #set_name(&mut self, #name: #ty) {
                self.#name = #name;
            }
            #( #attrs )*
            pub fn #get_name(&self) -> &#ty {
                &self.#name
            }
        }
    });

    let default_assignments = input.fields.iter().map(|f| {
        let name = &f.name;
        let default_value = &f.default_value;
        quote! { #name: #default_value }
    });

    let expanded = quote! {
        #( #attrs )*
        #[derive(Debug, Clone, PartialEq, serde::Serialize)]
        #vis struct #struct_name {
            #( #fields, )*
        }

        #[derive(Debug, Clone, Default, serde::Deserialize)]
        #vis struct #partial_struct_name {
            #( #partial_fields, )*
        }

        impl #struct_name {
            pub fn from_partial(partial: #partial_struct_name) -> Self {
                use crate::config::IntoOr;
                Self {
                    #( #from_partial_assignments, )*
                }
            }
            pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
                Ok(Self::from_partial(toml::from_str(content)?))
            }
            pub fn from_file<P: AsRef<std::path::Path>>(file_path: P) -> anyhow::Result<Self> {
                let canonic_path = std::fs::canonicalize(file_path)?;
                let content = std::fs::read_to_string(canonic_path)?;
                Self::from_toml_str(&content)
            }
            pub fn from_optional_file<P: AsRef<std::path::Path>>(file_path: Option<P>) -> anyhow::Result<Self> {
                match file_path {
                    Some(p) => Self::from_file(p),
                    None => Ok(Self::default()),
                }
            }
            #( #methods )*
        }

        impl Default for #struct_name {
            fn default() -> Self {
                #struct_name {
                    #( #default_assignments, )*
                }
            }
        }

        impl crate::config::IntoOr<#struct_name> for Option<#partial_struct_name> {
            fn into_or(self, or: #struct_name) -> #struct_name {
                match self {
                    Some(t) => #struct_name::from_partial(t),
                    None => or,
                }
            }
        }
    };
    TokenStream::from(expanded)
}
