use std::collections::BTreeMap;

use check_keyword::CheckKeyword;
use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::{Literal, Span, TokenStream};
use quote::{format_ident, quote};
use syn::{parse_quote, Expr, Ident, Item, Type};

use uxsd::{
    AllGroupLayout, AttributeLayout, BuiltinType, ChildElement, CompiledSchema, CompiledType,
    ContentLayout, ElementDeclaration, GroupDfa, SchemaError, TypeRef,
};

use crate::error::GeneratorError;

/// Item names the generated module defines besides the schema types.
const RESERVED_TYPE_NAMES: &[&str] = &["Pools", "PhantomData", "CharPool", "Error"];

enum ChildKind {
    /// At most one occurrence of a builtin type.
    SimpleSingle(BuiltinType),
    SimpleMany(BuiltinType),
    /// Always a collapsed vector, whatever the multiplicity.
    Complex(Ident),
}

struct ChildField<'a> {
    element: &'a ChildElement,
    ident: Ident,
    kind: ChildKind,
}

struct RustEmitter<'a> {
    type_idents: BTreeMap<&'a str, Ident>,
    /// Collapsed pools by field name, with their element type.
    pools: BTreeMap<String, Type>,
    output_items: Vec<Item>,
}

impl<'a> RustEmitter<'a> {
    fn new(schema: &'a CompiledSchema) -> Result<Self, GeneratorError> {
        let mut type_idents = BTreeMap::new();
        let mut by_rust_name = BTreeMap::<String, &str>::new();
        for ty in &schema.types {
            let ident = Self::name_to_ident(&Self::pascal_case(&ty.name));
            let rust_name = ident.to_string();
            if let Some(reserved) = RESERVED_TYPE_NAMES.iter().find(|&&r| r == rust_name) {
                return Err(GeneratorError::NameCollision {
                    first: ty.name.clone(),
                    second: format!("generated {reserved}"),
                    rust_name,
                });
            }
            if let Some(first) = by_rust_name.insert(rust_name.clone(), &ty.name) {
                return Err(GeneratorError::NameCollision {
                    first: first.to_string(),
                    second: ty.name.clone(),
                    rust_name,
                });
            }
            type_idents.insert(ty.name.as_str(), ident);
        }
        Ok(Self {
            type_idents,
            pools: BTreeMap::new(),
            output_items: Vec::new(),
        })
    }

    fn name_to_ident(name: &str) -> Ident {
        if ["crate", "self", "super", "Self"].contains(&name) {
            // These are keywords that are not allowed as raw identifiers
            Ident::new(&format!("{}_", name), Span::call_site())
        } else if name.is_keyword() {
            Ident::new_raw(name, Span::call_site())
        } else {
            Ident::new(name, Span::call_site())
        }
    }

    fn pascal_case(name: &str) -> String {
        match name.to_pascal_case() {
            empty if empty.is_empty() => "Unnamed".to_string(),
            name => name,
        }
    }

    fn snake_case(name: &str) -> String {
        match name.to_snake_case() {
            empty if empty.is_empty() => "unnamed".to_string(),
            name => name,
        }
    }

    fn type_ident(&self, name: &str) -> Result<&Ident, GeneratorError> {
        self.type_idents
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()).into())
    }

    fn builtin_type(builtin: BuiltinType) -> Type {
        use BuiltinType::*;
        match builtin {
            String | NormalizedString | Token | Language | Name | NCName | NMTOKEN | ID | IDREF
            | AnyURI => parse_quote!(&'p str),
            Boolean => parse_quote!(bool),
            Float => parse_quote!(f32),
            Double | Decimal => parse_quote!(f64),
            Integer | NonPositiveInteger | NegativeInteger | Long => parse_quote!(i64),
            Int => parse_quote!(i32),
            Short => parse_quote!(i16),
            Byte => parse_quote!(i8),
            UnsignedLong | NonNegativeInteger | PositiveInteger => parse_quote!(u64),
            UnsignedInt => parse_quote!(u32),
            UnsignedShort => parse_quote!(u16),
            UnsignedByte => parse_quote!(u8),
        }
    }

    /// Converts the raw string `raw` to a value of `builtin`, interning strings in `chars`.
    fn load_builtin(builtin: BuiltinType, raw: TokenStream) -> Expr {
        match builtin {
            BuiltinType::String => parse_quote!(chars.add(#raw)),
            BuiltinType::NormalizedString => parse_quote! {
                chars.add(&meta::normalized_value(#raw, meta::Whitespace::Replace))
            },
            builtin if builtin.is_string_like() => parse_quote! {
                chars.add(&meta::normalized_value(#raw, meta::Whitespace::Collapse))
            },
            _ => parse_quote!(meta::parse_literal(#raw)?),
        }
    }

    fn value_type(&self, type_: &TypeRef) -> Result<Type, GeneratorError> {
        Ok(match type_ {
            TypeRef::Builtin(builtin) => Self::builtin_type(*builtin),
            TypeRef::Complex(name) => {
                let ident = self.type_ident(name)?;
                parse_quote!(#ident<'p>)
            }
        })
    }

    /// Registers the collapsed pool holding values of `type_` and returns its field name.
    fn pool(&mut self, type_: &TypeRef) -> Result<Ident, GeneratorError> {
        let name = match type_ {
            TypeRef::Builtin(builtin) => {
                let rust = match builtin {
                    builtin if builtin.is_string_like() => "str".to_string(),
                    builtin => {
                        let ty = Self::builtin_type(*builtin);
                        quote!(#ty).to_string()
                    }
                };
                format!("{rust}_values")
            }
            TypeRef::Complex(name) => format!("{}_pool", Self::snake_case(name)),
        };
        let element_type = self.value_type(type_)?;
        self.pools.insert(name.clone(), element_type);
        Ok(Ident::new(&name, Span::call_site()))
    }

    fn literal(value: usize) -> Literal {
        Literal::usize_unsuffixed(value)
    }

    fn emit_group_automaton(&mut self, name: &Ident, dfa: &GroupDfa) {
        let tags = dfa.tags().iter().map(String::as_str);
        let transitions = dfa.transitions().iter().map(|transition| match transition {
            Some(state) => {
                let state = Literal::u32_unsuffixed(*state);
                quote!(Some(#state))
            }
            None => quote!(None),
        });
        let accepting = dfa.accepting();
        self.output_items.push(parse_quote! {
            pub static #name: GroupAutomaton<'static> = GroupAutomaton::new(
                &[#(#tags),*],
                &[#(#transitions),*],
                &[#(#accepting),*],
            );
        });
    }

    fn emit_all_layout(&mut self, name: &Ident, layout: &AllGroupLayout) {
        let words = Self::literal(layout.words());
        let names = layout
            .members()
            .iter()
            .map(|member| member.element.name.as_str());
        let required = layout.required_ordinals().map(Self::literal);
        let emptiable = layout.emptiable();
        self.output_items.push(parse_quote! {
            pub static #name: PresenceLayout<'static, #words> = PresenceLayout::all_group(
                &[#(#names),*],
                PresenceBits::from_ordinals(&[#(#required),*]),
                #emptiable,
            );
        });
    }

    fn emit_attribute_layout(&mut self, name: &Ident, layout: &AttributeLayout) {
        let words = Self::literal(layout.words());
        let names = layout.attributes().iter().map(|attribute| attribute.name.as_str());
        let required = layout.required_ordinals().map(Self::literal);
        self.output_items.push(parse_quote! {
            pub static #name: PresenceLayout<'static, #words> = PresenceLayout::attributes(
                &[#(#names),*],
                PresenceBits::from_ordinals(&[#(#required),*]),
            );
        });
    }

    fn child_fields<'t>(
        &self,
        ty: &'t CompiledType,
    ) -> Result<Vec<ChildField<'t>>, GeneratorError> {
        let mut fields: Vec<ChildField> = Vec::with_capacity(ty.children.len());
        for element in &ty.children {
            let ident = Self::name_to_ident(&Self::snake_case(&element.name));
            if let Some(other) = fields.iter().find(|field| field.ident == ident) {
                return Err(GeneratorError::NameCollision {
                    first: other.element.name.clone(),
                    second: element.name.clone(),
                    rust_name: ident.to_string(),
                });
            }
            let kind = match &element.type_ {
                TypeRef::Complex(name) => ChildKind::Complex(self.type_ident(name)?.clone()),
                TypeRef::Builtin(builtin) if element.max_occurs.is_many() => {
                    ChildKind::SimpleMany(*builtin)
                }
                TypeRef::Builtin(builtin) => ChildKind::SimpleSingle(*builtin),
            };
            fields.push(ChildField {
                element,
                ident,
                kind,
            });
        }
        Ok(fields)
    }

    fn visit_complex_type(&mut self, ty: &CompiledType) -> Result<(), GeneratorError> {
        let name = self.type_ident(&ty.name)?.clone();
        let shouty = Self::pascal_case(&ty.name).to_shouty_snake_case();
        let content_name = format_ident!("{}_CONTENT", shouty);
        let attributes_name = format_ident!("{}_ATTRIBUTES", shouty);

        let check_content = match &ty.content {
            ContentLayout::Group(dfa) => {
                self.emit_group_automaton(&content_name, dfa);
                quote!(node::check_group(node, &#content_name)?;)
            }
            ContentLayout::All(layout) => {
                self.emit_all_layout(&content_name, layout);
                quote!(node::check_all_group(node, &#content_name)?;)
            }
        };
        self.emit_attribute_layout(&attributes_name, &ty.attributes);

        let children = self.child_fields(ty)?;
        let mut fields = Vec::new();
        let mut fill_children = Vec::new();
        let mut load_grandchildren = Vec::new();
        for child in &children {
            let ident = &child.ident;
            let tag = child.element.name.as_str();
            match &child.kind {
                ChildKind::SimpleSingle(builtin) => {
                    let value_type = Self::builtin_type(*builtin);
                    let value = Self::load_builtin(*builtin, quote!(&node::text_content(child)));
                    fields.push(quote!(pub #ident: Option<#value_type>));
                    fill_children.push(quote! {
                        if let Some(child) = node::children_named(node, #tag).next() {
                            node::check_simple(child)?;
                            self.#ident = Some(#value);
                        }
                    });
                }
                ChildKind::SimpleMany(builtin) => {
                    let value_type = Self::builtin_type(*builtin);
                    let pool = self.pool(&child.element.type_)?;
                    let value = Self::load_builtin(*builtin, quote!(&node::text_content(child)));
                    fields.push(quote!(pub #ident: CollapsedVec<#value_type>));
                    fill_children.push(quote! {
                        self.#ident = CollapsedVec::new(&pools.#pool);
                        for child in node::children_named(node, #tag) {
                            node::check_simple(child)?;
                            let value = #value;
                            self.#ident.push(&mut pools.#pool, value);
                        }
                    });
                }
                ChildKind::Complex(child_type) => {
                    let pool = self.pool(&child.element.type_)?;
                    fields.push(quote!(pub #ident: CollapsedVec<#child_type<'p>>));
                    fill_children.push(quote! {
                        self.#ident = CollapsedVec::new(&pools.#pool);
                        for child in node::children_named(node, #tag) {
                            let value = #child_type::load_shallow(child, chars)?;
                            self.#ident.push(&mut pools.#pool, value);
                        }
                    });
                    load_grandchildren.push(quote! {
                        for (index, child) in node::children_named(node, #tag).enumerate() {
                            let mut value = self.#ident.as_slice(&pools.#pool)[index];
                            value.load_children(child, chars, pools)?;
                            self.#ident.as_mut_slice(&mut pools.#pool)[index] = value;
                        }
                    });
                }
            }
        }

        let mut load_attributes = Vec::new();
        for (ordinal, attribute) in ty.attributes.attributes().iter().enumerate() {
            let mut field_name = Self::snake_case(&attribute.name);
            if children.iter().any(|child| child.ident == field_name) {
                field_name.push_str("_attr");
            }
            let ident = Self::name_to_ident(&field_name);
            let value_type = Self::builtin_type(attribute.type_);
            let value = Self::load_builtin(attribute.type_, quote!(attribute.value()));
            let ordinal = Self::literal(ordinal);
            if attribute.required {
                fields.push(quote!(pub #ident: #value_type));
                load_attributes.push(quote!(#ordinal => self_.#ident = #value,));
            } else {
                fields.push(quote!(pub #ident: Option<#value_type>));
                load_attributes.push(quote!(#ordinal => self_.#ident = Some(#value),));
            }
        }

        tracing::debug!(
            r#type = %ty.name,
            rust_name = %name,
            fields = fields.len(),
            "emitting type"
        );
        let doc = format!("Content of `{}` elements.", ty.name);
        self.output_items.push(parse_quote! {
            #[doc = #doc]
            #[derive(Clone, Copy, Debug, Default)]
            pub struct #name<'p> {
                #(#fields,)*
                _marker: PhantomData<&'p str>,
            }
        });
        self.output_items.push(parse_quote! {
            impl<'p> #name<'p> {
                /// Loads the attributes of `node`; children are left empty.
                pub fn load_shallow(
                    node: roxmltree::Node,
                    chars: &'p CharPool,
                ) -> Result<Self, Error> {
                    let mut self_ = Self::default();
                    let mut tracker = PresenceTracker::new(&#attributes_name);
                    for attribute in node::attributes(node) {
                        match tracker.record(attribute.name())? {
                            #(#load_attributes)*
                            _ => {}
                        }
                    }
                    tracker.finish()?;
                    Ok(self_)
                }

                /// Validates the children of `node` and loads them, recursively.
                pub fn load_children(
                    &mut self,
                    node: roxmltree::Node,
                    chars: &'p CharPool,
                    pools: &mut Pools<'p>,
                ) -> Result<(), Error> {
                    #check_content
                    #(#fill_children)*
                    #(#load_grandchildren)*
                    Ok(())
                }
            }
        });
        Ok(())
    }

    fn visit_root_element(&mut self, element: &ElementDeclaration) -> Result<(), GeneratorError> {
        let function = format_ident!("load_{}", Self::snake_case(&element.name));
        let tag = element.name.as_str();
        let doc = format!("Loads a document whose root element is `{tag}`.");
        let item = match &element.type_ {
            TypeRef::Complex(name) => {
                let ty = self.type_ident(name)?;
                parse_quote! {
                    #[doc = #doc]
                    pub fn #function<'p>(
                        document: &roxmltree::Document,
                        chars: &'p CharPool,
                        pools: &mut Pools<'p>,
                    ) -> Result<#ty<'p>, Error> {
                        let root = document.root_element();
                        node::check_root(root, #tag)?;
                        let mut value = #ty::load_shallow(root, chars)?;
                        value.load_children(root, chars, pools)?;
                        Ok(value)
                    }
                }
            }
            TypeRef::Builtin(builtin) => {
                let ty = Self::builtin_type(*builtin);
                let value = Self::load_builtin(*builtin, quote!(&node::text_content(root)));
                parse_quote! {
                    #[doc = #doc]
                    pub fn #function<'p>(
                        document: &roxmltree::Document,
                        chars: &'p CharPool,
                    ) -> Result<#ty, Error> {
                        let root = document.root_element();
                        node::check_root(root, #tag)?;
                        node::check_simple(root)?;
                        Ok(#value)
                    }
                }
            }
        };
        self.output_items.push(item);
        Ok(())
    }

    fn emit_pools(&mut self) {
        let names = self
            .pools
            .keys()
            .map(|name| Ident::new(name, Span::call_site()))
            .collect::<Vec<_>>();
        let types = self.pools.values();
        self.output_items.push(parse_quote! {
            /// Backing storage of every collapsed vector in a loaded document.
            #[derive(Debug, Default)]
            pub struct Pools<'p> {
                #(pub #names: CollapsedPool<#types>,)*
                _marker: PhantomData<&'p str>,
            }
        });
        self.output_items.push(parse_quote! {
            impl Pools<'_> {
                pub fn clear(&mut self) {
                    #(self.#names.clear();)*
                }
            }
        });
    }
}

pub fn generate(schema: &CompiledSchema) -> Result<String, GeneratorError> {
    let mut emitter = RustEmitter::new(schema)?;

    emitter.output_items.push(parse_quote!(
        use std::marker::PhantomData;
    ));
    emitter.output_items.push(parse_quote!(
        use uxsd_builtins::{
            meta, node, CharPool, CollapsedPool, CollapsedVec, Error, GroupAutomaton,
            PresenceBits, PresenceLayout, PresenceTracker,
        };
    ));

    for ty in &schema.types {
        emitter.visit_complex_type(ty)?;
    }
    for element in &schema.elements {
        emitter.visit_root_element(element)?;
    }
    emitter.emit_pools();

    let doc_comment = concat!(
        "Generated by ",
        env!("CARGO_PKG_NAME"),
        " ",
        env!("CARGO_PKG_VERSION")
    );
    let root = syn::File {
        shebang: None,
        attrs: vec![
            parse_quote!(#![doc = #doc_comment]),
            parse_quote!(#![allow(dead_code, unused_imports, unused_mut, unused_variables)]),
            parse_quote!(#![allow(clippy::all)]),
        ],
        items: emitter.output_items,
    };
    Ok(prettyplease::unparse(&root))
}
