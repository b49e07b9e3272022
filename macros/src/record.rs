//! `#[derive(Record)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Attribute, Data, DeriveInput, Fields, LitStr};

/// Case conversion applied to every field name without an explicit `rename`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    Upper,
    Lower,
    Pascal,
    Camel,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "UPPERCASE" | "SCREAMING_SNAKE_CASE" => Ok(Self::Upper),
            "lowercase" | "snake_case" => Ok(Self::Lower),
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            other => Err(syn::Error::new(
                lit.span(),
                format!("unknown rename_all rule `{other}`"),
            )),
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            Self::Upper => name.to_uppercase(),
            Self::Lower => name.to_lowercase(),
            Self::Pascal => pascal(name),
            Self::Camel => {
                let pascal = pascal(name);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => pascal,
                }
            }
        }
    }
}

fn pascal(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Per-field `#[env(...)]` markers.
#[derive(Default)]
struct FieldAttrs {
    key: Option<String>,
    rename: Option<String>,
    skip: bool,
    embedded: bool,
}

pub fn derive(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "Record requires a struct with named fields",
                ))
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Record cannot be derived for enums",
            ))
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Record cannot be derived for unions",
            ))
        }
    };

    let rule = parse_struct_attrs(&input.attrs)?;

    let mut descriptors = Vec::new();
    let mut arms = Vec::new();
    let mut bound_types = Vec::new();

    for field in fields {
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        let declared = ident.to_string();
        let declared = declared.strip_prefix("r#").unwrap_or(&declared);
        let name = match (&attrs.rename, rule) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rule.apply(declared),
            (None, None) => declared.to_string(),
        };

        let index = descriptors.len();
        descriptors.push(match (&attrs.key, attrs.embedded) {
            (_, true) => quote! { ::confbind::Field::embedded(#name) },
            (Some(key), false) => quote! { ::confbind::Field::keyed(#name, #key) },
            (None, false) => quote! { ::confbind::Field::new(#name) },
        });
        bound_types.push(&field.ty);
        arms.push(quote! {
            #index => ::core::option::Option::Some(&mut self.#ident as &mut dyn ::confbind::Bind),
        });
    }

    // Generic structs need every bound field type to be `Bind`.
    let mut generics = input.generics.clone();
    if !generics.params.is_empty() {
        let where_clause = generics.make_where_clause();
        for ty in bound_types {
            where_clause
                .predicates
                .push(syn::parse_quote! { #ty: ::confbind::Bind });
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::confbind::Record for #name #ty_generics #where_clause {
            fn fields() -> &'static [::confbind::Field] {
                const FIELDS: &[::confbind::Field] = &[#(#descriptors),*];
                FIELDS
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::confbind::Bind> {
                match index {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ::confbind::Bind for #name #ty_generics #where_clause {
            fn kind(&self) -> ::confbind::FieldKind {
                ::confbind::FieldKind::Record
            }

            fn bind_text(
                &mut self,
                text: &str,
                walk: ::confbind::Walk,
            ) -> ::core::result::Result<(), ::confbind::BindError> {
                ::confbind::bind_record_text(self, text, walk)
            }

            fn bind_node(
                &mut self,
                node: &::confbind::Node,
                walk: ::confbind::Walk,
            ) -> ::core::result::Result<(), ::confbind::BindError> {
                ::confbind::bind_record_node(self, node, walk)
            }

            fn bind_entry(
                &mut self,
                key: &str,
                value: &::confbind::Node,
                walk: ::confbind::Walk,
                case: ::confbind::Case,
            ) -> ::core::option::Option<::core::result::Result<(), ::confbind::BindError>> {
                ::confbind::bind_record_entry(self, key, value, walk, case)
            }
        }
    })
}

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<Option<RenameRule>> {
    let mut rule = None;

    for attr in attrs {
        if !attr.path().is_ident("env") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                rule = Some(RenameRule::parse(&meta.value()?.parse::<LitStr>()?)?);
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute, expected `rename_all`"))
            }
        })?;
    }

    Ok(rule)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("env") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                result.key = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("rename") {
                result.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("skip") {
                result.skip = true;
            } else if meta.path.is_ident("embedded") {
                result.embedded = true;
            } else {
                return Err(meta.error(
                    "unsupported field attribute, expected `key`, `rename`, `skip` or `embedded`",
                ));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::Upper.apply("connection_string"), "CONNECTION_STRING");
        assert_eq!(RenameRule::Lower.apply("Port"), "port");
        assert_eq!(RenameRule::Pascal.apply("connection_string"), "ConnectionString");
        assert_eq!(RenameRule::Camel.apply("connection_string"), "connectionString");
        assert_eq!(RenameRule::Pascal.apply("port"), "Port");
    }

    #[test]
    fn test_derive_rejects_enums() {
        let input: DeriveInput = syn::parse_quote! {
            enum Mode { A, B }
        };
        assert!(derive(&input).is_err());
    }

    #[test]
    fn test_derive_rejects_tuple_structs() {
        let input: DeriveInput = syn::parse_quote! {
            struct Pair(u16, u16);
        };
        assert!(derive(&input).is_err());
    }

    #[test]
    fn test_generic_struct_bounds_field_types() {
        let input: DeriveInput = syn::parse_quote! {
            struct Wrapper<T> {
                inner: T,
                items: Vec<T>,
                #[env(skip)]
                cache: T,
            }
        };
        let tokens = derive(&input).unwrap().to_string().replace(' ', "");
        assert!(tokens.contains("T:::confbind::Bind"));
        assert!(tokens.contains("Vec<T>:::confbind::Bind"));
    }

    #[test]
    fn test_derive_rejects_unknown_attribute() {
        let input: DeriveInput = syn::parse_quote! {
            struct Conf {
                #[env(default = "1")]
                port: u16,
            }
        };
        assert!(derive(&input).is_err());
    }
}
