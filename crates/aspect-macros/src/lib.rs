//! Proc macros for the interception runtime.
//!
//! `#[interceptable]` turns an inherent `impl` block into an aspect target:
//! the original impl is re-emitted untouched, and alongside it the macro
//! generates the proxy struct, one trampoline per `#[pointcut]` method, one
//! non-virtual executor per trampoline, forwarding methods for the rest of
//! the public surface, and the `AspectTarget` wiring (manifest, bindings,
//! weave). Generated code refers to the `aspect` facade crate by absolute
//! path, so the facade must be a dependency of the expanding crate.
extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{
    parenthesized,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    Data, DeriveInput, Error, Expr, FnArg, GenericParam, Ident, ImplItem, ImplItemFn, ItemImpl,
    LitBool, Path, ReturnType, Token, Type,
};

/// Options accepted by `#[interceptable(...)]`.
struct InterceptableOptions {
    proxy_aware: bool,
}

impl Parse for InterceptableOptions {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(Self { proxy_aware: false });
        }
        let ident: Ident = input.parse()?;
        if ident == "proxy_aware" {
            Ok(Self { proxy_aware: true })
        } else {
            Err(Error::new(ident.span(), "expected `proxy_aware`"))
        }
    }
}

enum AdviceForm {
    Sync(Expr),
    Async(Expr),
    Bundle(Expr),
    Types(Vec<TypeEntry>),
}

enum TypeEntry {
    Advice(Path),
    Bundle(Path),
}

impl Parse for TypeEntry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Ident) && input.peek2(syn::token::Paren) {
            let kw: Ident = input.parse()?;
            if kw != "bundle" {
                return Err(Error::new(
                    kw.span(),
                    "expected `bundle(Type)` or an advice type path",
                ));
            }
            let content;
            parenthesized!(content in input);
            Ok(TypeEntry::Bundle(content.parse()?))
        } else {
            Ok(TypeEntry::Advice(input.parse()?))
        }
    }
}

/// One `#[pointcut(...)]` annotation.
struct PointcutArgs {
    form: AdviceForm,
    order: Option<Expr>,
    swallow_errors: bool,
}

impl Parse for PointcutArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let kind: Ident = input.parse()?;
        let content;
        parenthesized!(content in input);
        let form = match kind.to_string().as_str() {
            "advice" => AdviceForm::Sync(content.parse()?),
            "async_advice" => AdviceForm::Async(content.parse()?),
            "bundle" => AdviceForm::Bundle(content.parse()?),
            "types" => {
                let entries = Punctuated::<TypeEntry, Token![,]>::parse_terminated(&content)?;
                if entries.is_empty() {
                    return Err(Error::new(kind.span(), "`types(...)` must not be empty"));
                }
                AdviceForm::Types(entries.into_iter().collect())
            }
            other => {
                return Err(Error::new(
                    kind.span(),
                    format!(
                        "unknown pointcut form `{other}`; expected `advice`, `async_advice`, \
                         `bundle`, or `types`"
                    ),
                ))
            }
        };

        let mut order = None;
        let mut swallow_errors = false;
        while input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            let option: Ident = input.parse()?;
            if option == "order" {
                input.parse::<Token![=]>()?;
                order = Some(input.parse::<Expr>()?);
            } else if option == "swallow_errors" {
                if input.peek(Token![=]) {
                    input.parse::<Token![=]>()?;
                    swallow_errors = input.parse::<LitBool>()?.value;
                } else {
                    swallow_errors = true;
                }
            } else {
                return Err(Error::new(
                    option.span(),
                    "expected `order = <int>` or `swallow_errors`",
                ));
            }
        }
        Ok(Self {
            form,
            order,
            swallow_errors,
        })
    }
}

impl PointcutArgs {
    /// The `Annotation` expression this pointcut lowers to.
    fn annotation_tokens(&self) -> proc_macro2::TokenStream {
        match &self.form {
            AdviceForm::Sync(expr) | AdviceForm::Async(expr) => {
                let constructor = if matches!(self.form, AdviceForm::Sync(_)) {
                    quote! { ::aspect::advice }
                } else {
                    quote! { ::aspect::async_advice }
                };
                let mut binding = quote! {
                    ::aspect::AdviceBinding::new(#constructor(#expr))
                };
                if let Some(order) = &self.order {
                    binding = quote! { #binding.with_order(#order) };
                }
                if self.swallow_errors {
                    binding = quote! { #binding.with_swallow_errors(true) };
                }
                quote! { ::aspect::Annotation::Single(#binding) }
            }
            AdviceForm::Bundle(expr) => {
                let order = match &self.order {
                    Some(order) => order.to_token_stream(),
                    None => quote! { 0i32 },
                };
                quote! { ::aspect::Annotation::Bundle { order: #order, sources: (#expr) } }
            }
            AdviceForm::Types(entries) => {
                let refs = entries.iter().map(|entry| match entry {
                    TypeEntry::Advice(path) => quote! {
                        ::aspect::TypeRef::Advice(::aspect::TypeDescriptor::of::<#path>())
                    },
                    TypeEntry::Bundle(path) => quote! {
                        ::aspect::TypeRef::Bundle(::aspect::TypeDescriptor::of::<#path>())
                    },
                });
                quote! { ::aspect::Annotation::TypeList(::std::vec![#(#refs),*]) }
            }
        }
    }
}

/// One instance method of the target impl, analyzed for generation.
struct MethodModel {
    item: ImplItemFn,
    index: u16,
    overridable: bool,
    is_async: bool,
    pointcuts: Vec<PointcutArgs>,
    /// Renamed `(name, type)` pairs for the declared value parameters.
    args: Vec<(Ident, Type)>,
}

impl MethodModel {
    fn name(&self) -> &Ident {
        &self.item.sig.ident
    }

    fn descriptor_fn(&self) -> Ident {
        format_ident!("__method_{}", self.item.sig.ident)
    }

    fn executor_fn(&self) -> Ident {
        format_ident!("__exec_{}_{}", self.item.sig.ident, self.index)
    }

    fn kind_tokens(&self) -> proc_macro2::TokenStream {
        if self.is_async {
            quote! { ::aspect::MethodKind::Task }
        } else {
            quote! { ::aspect::MethodKind::Sync }
        }
    }

    fn type_params(&self) -> Vec<Ident> {
        self.item
            .sig
            .generics
            .type_params()
            .map(|p| p.ident.clone())
            .collect()
    }
}

#[proc_macro_attribute]
pub fn interceptable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = parse_macro_input!(attr as InterceptableOptions);
    let input = parse_macro_input!(item as ItemImpl);
    match expand_interceptable(options, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_interceptable(
    options: InterceptableOptions,
    mut input: ItemImpl,
) -> syn::Result<proc_macro2::TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(Error::new_spanned(
            path,
            "#[interceptable] applies to inherent impl blocks, not trait impls",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[interceptable] cannot proxy an open generic type",
        ));
    }
    let target = match input.self_ty.as_ref() {
        Type::Path(path) if path.qself.is_none() => {
            let segment = path
                .path
                .segments
                .last()
                .ok_or_else(|| Error::new_spanned(path, "expected a type name"))?;
            if !segment.arguments.is_none() {
                return Err(Error::new_spanned(
                    segment,
                    "#[interceptable] cannot proxy an open generic type",
                ));
            }
            segment.ident.clone()
        }
        other => {
            return Err(Error::new_spanned(
                other,
                "#[interceptable] expects a plain type name",
            ))
        }
    };

    let mut methods = Vec::new();
    let mut index: u16 = 0;
    for item in &mut input.items {
        let ImplItem::Fn(method) = item else { continue };
        let Some(receiver) = method.sig.receiver() else {
            if has_pointcut(&method.attrs) {
                return Err(Error::new_spanned(
                    &method.sig,
                    "#[pointcut] requires an instance method",
                ));
            }
            continue;
        };
        let overridable = receiver.reference.is_some()
            && receiver.mutability.is_none()
            && receiver.colon_token.is_none();

        let mut pointcuts = Vec::new();
        let mut kept = Vec::new();
        for attr in method.attrs.drain(..) {
            if attr.path().is_ident("pointcut") {
                pointcuts.push(attr.parse_args_with(PointcutArgs::parse)?);
            } else {
                kept.push(attr);
            }
        }
        method.attrs = kept;

        if !pointcuts.is_empty() {
            if !overridable {
                return Err(Error::new_spanned(
                    &method.sig,
                    "this method is not overridable: pointcut methods must take `&self`",
                ));
            }
            validate_pointcut_signature(method)?;
        }

        let args = collect_args(method);
        methods.push(MethodModel {
            item: method.clone(),
            index,
            overridable,
            is_async: method.sig.asyncness.is_some(),
            pointcuts,
            args,
        });
        index += 1;
    }

    let proxy = format_ident!("{target}Proxy");
    let vis = methods
        .iter()
        .find(|m| !m.pointcuts.is_empty())
        .or_else(|| methods.iter().find(|m| matches!(m.item.vis, syn::Visibility::Public(_))))
        .map(|m| m.item.vis.clone())
        .unwrap_or(syn::Visibility::Inherited);

    let descriptor_fns = methods.iter().map(|m| descriptor_fn(&target, m));
    let executor_fns = methods
        .iter()
        .filter(|m| !m.pointcuts.is_empty())
        .map(|m| executor_fn(&target, m))
        .collect::<syn::Result<Vec<_>>>()?;
    let trampolines = methods
        .iter()
        .filter(|m| !m.pointcuts.is_empty())
        .map(|m| trampoline(&target, m))
        .collect::<syn::Result<Vec<_>>>()?;
    let forwards = methods
        .iter()
        .filter(|m| m.pointcuts.is_empty() && m.overridable)
        .map(forwarding_method);

    let manifest_entries = methods.iter().map(|m| {
        let descriptor = m.descriptor_fn();
        let kind = m.kind_tokens();
        let overridable = m.overridable;
        quote! {
            .method(::aspect::MethodEntry {
                method: Self::#descriptor(),
                kind: #kind,
                overridable: #overridable,
            })
        }
    });

    let binding_pushes = methods.iter().flat_map(|m| {
        let descriptor = m.descriptor_fn();
        let kind = m.kind_tokens();
        m.pointcuts.iter().map(move |p| {
            let annotation = p.annotation_tokens();
            quote! {
                __out.push(::aspect::MethodBinding {
                    method: Self::#descriptor(),
                    kind: #kind,
                    annotation: #annotation,
                });
            }
        })
    });

    let backref = if options.proxy_aware {
        quote! {
            fn __aspect_backref(&self) -> ::std::option::Option<::aspect::ProxyBackref<'_>> {
                let __proxy = self.__proxy.upgrade()?;
                ::std::option::Option::Some(::aspect::ProxyBackref {
                    slot: ::aspect::ProxyAware::proxy_slot(&*self.target),
                    proxy: __proxy as ::aspect::SharedValue,
                })
            }
        }
    } else {
        quote! {
            fn __aspect_backref(&self) -> ::std::option::Option<::aspect::ProxyBackref<'_>> {
                ::std::option::Option::None
            }
        }
    };

    Ok(quote! {
        #input

        #vis struct #proxy {
            target: ::std::sync::Arc<#target>,
            dispatcher: ::std::sync::Arc<::aspect::Dispatcher>,
            __proxy: ::std::sync::Weak<#proxy>,
        }

        impl #proxy {
            /// The wrapped target instance.
            pub fn target(&self) -> &#target {
                &self.target
            }

            #backref

            #(#descriptor_fns)*
            #(#executor_fns)*
            #(#trampolines)*
            #(#forwards)*

            #[doc(hidden)]
            pub fn __manifest() -> ::aspect::ClassManifest {
                ::aspect::ClassManifest::new(::aspect::TypeDescriptor::of::<#target>())
                    #(#manifest_entries)*
            }

            #[doc(hidden)]
            pub fn __bindings() -> ::std::vec::Vec<::aspect::MethodBinding> {
                let mut __out = ::std::vec::Vec::new();
                #(#binding_pushes)*
                __out
            }
        }

        impl ::aspect::AspectTarget for #target {
            type Proxy = #proxy;

            fn manifest() -> ::aspect::ClassManifest {
                #proxy::__manifest()
            }

            fn bindings() -> ::std::vec::Vec<::aspect::MethodBinding> {
                #proxy::__bindings()
            }

            fn weave(
                target: ::std::sync::Arc<Self>,
                dispatcher: ::std::sync::Arc<::aspect::Dispatcher>,
            ) -> ::std::sync::Arc<#proxy> {
                ::std::sync::Arc::new_cyclic(|__weak| #proxy {
                    target,
                    dispatcher,
                    __proxy: __weak.clone(),
                })
            }
        }
    })
}

fn has_pointcut(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|a| a.path().is_ident("pointcut"))
}

/// Pointcut methods box their arguments, so each parameter must be an owned
/// concrete type.
fn validate_pointcut_signature(method: &ImplItemFn) -> syn::Result<()> {
    for param in &method.sig.generics.params {
        if let GenericParam::Const(param) = param {
            return Err(Error::new_spanned(
                param,
                "pointcut methods cannot take const generic parameters",
            ));
        }
    }
    for input in &method.sig.inputs {
        let FnArg::Typed(arg) = input else { continue };
        match arg.ty.as_ref() {
            Type::Reference(_) => {
                return Err(Error::new_spanned(
                    arg,
                    "pointcut methods take owned arguments; borrowed parameters cannot be boxed",
                ))
            }
            Type::ImplTrait(_) => {
                return Err(Error::new_spanned(
                    arg,
                    "pointcut methods need concrete argument types",
                ))
            }
            _ => {}
        }
    }
    if let ReturnType::Type(_, ty) = &method.sig.output {
        if matches!(ty.as_ref(), Type::Reference(_) | Type::ImplTrait(_)) {
            return Err(Error::new_spanned(
                ty,
                "pointcut methods return owned concrete values",
            ));
        }
    }
    Ok(())
}

/// Value parameters renamed positionally so the generated code never has to
/// deal with argument patterns.
fn collect_args(method: &ImplItemFn) -> Vec<(Ident, Type)> {
    method
        .sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(arg) => Some(arg.ty.as_ref().clone()),
            FnArg::Receiver(_) => None,
        })
        .enumerate()
        .map(|(i, ty)| (format_ident!("__arg{i}"), ty))
        .collect()
}

/// Generated trampolines and executors must be able to box, clone, and send
/// every generic argument, so the method's type parameters pick up the
/// corresponding bounds on the generated items (the original impl is left
/// untouched).
fn augment_generics(generics: &syn::Generics) -> syn::Generics {
    let mut generics = generics.clone();
    for param in generics.params.iter_mut() {
        if let GenericParam::Type(tp) = param {
            tp.bounds.push(syn::parse_quote!(::std::marker::Send));
            tp.bounds.push(syn::parse_quote!(::std::marker::Sync));
            tp.bounds.push(syn::parse_quote!(::std::clone::Clone));
            tp.bounds.push(syn::parse_quote!('static));
        }
    }
    generics
}

fn descriptor_fn(target: &Ident, method: &MethodModel) -> proc_macro2::TokenStream {
    let descriptor = method.descriptor_fn();
    let name = method.name().to_string();
    let index = method.index;
    quote! {
        #[doc(hidden)]
        pub fn #descriptor() -> ::aspect::MethodDescriptor {
            ::aspect::MethodDescriptor::new(
                ::aspect::TypeDescriptor::of::<#target>(),
                #name,
                #index,
            )
        }
    }
}

fn executor_fn(target: &Ident, method: &MethodModel) -> syn::Result<proc_macro2::TokenStream> {
    let executor = method.executor_fn();
    let name = method.name();
    let generics = augment_generics(&method.item.sig.generics);
    let (impl_generics, _, where_clause) = generics.split_for_impl();
    let arg_names: Vec<_> = method.args.iter().map(|(name, _)| name.clone()).collect();
    let arg_types: Vec<_> = method.args.iter().map(|(_, ty)| ty.clone()).collect();
    let indices: Vec<_> = (0..method.args.len()).collect();
    let arg_errors: Vec<String> = (0..method.args.len())
        .map(|i| format!("argument {i} of {name} has an unexpected type"))
        .collect();

    let body = if method.is_async {
        let wrap = match &method.item.sig.output {
            ReturnType::Default => quote! {
                { let _ = __ret; ::std::option::Option::None }
            },
            ReturnType::Type(_, _) => quote! {
                ::std::option::Option::Some(
                    ::std::sync::Arc::new(__ret) as ::aspect::SharedValue
                )
            },
        };
        quote! {
            ::aspect::Executor::asynchronous(|__target, __args| {
                let __target = ::std::sync::Arc::clone(__target);
                #(
                    let #arg_names = __args
                        .get(#indices)
                        .and_then(|__v| __v.downcast_ref::<#arg_types>())
                        .cloned();
                )*
                let __fut: ::aspect::TaskFuture = ::std::boxed::Box::pin(async move {
                    let __target = __target
                        .downcast::<#target>()
                        .map_err(|_| ::aspect::UserError::msg("receiver type mismatch in executor"))?;
                    #(
                        let #arg_names = #arg_names
                            .ok_or_else(|| ::aspect::UserError::msg(#arg_errors))?;
                    )*
                    let __ret = __target.#name(#(#arg_names),*).await;
                    ::std::result::Result::Ok(#wrap)
                });
                __fut
            })
        }
    } else {
        let wrap = match &method.item.sig.output {
            ReturnType::Default => quote! {
                { let _ = __ret; ::std::option::Option::None }
            },
            ReturnType::Type(_, _) => quote! {
                ::std::option::Option::Some(::std::boxed::Box::new(__ret))
            },
        };
        quote! {
            ::aspect::Executor::sync(|__target, __args| {
                let __target = __target
                    .downcast_ref::<#target>()
                    .ok_or_else(|| ::aspect::UserError::msg("receiver type mismatch in executor"))?;
                #(
                    let #arg_names = __args
                        .get(#indices)
                        .and_then(|__v| __v.downcast_ref::<#arg_types>())
                        .cloned()
                        .ok_or_else(|| ::aspect::UserError::msg(#arg_errors))?;
                )*
                let __ret = __target.#name(#(#arg_names),*);
                ::std::result::Result::Ok(#wrap)
            })
        }
    };

    Ok(quote! {
        #[doc(hidden)]
        pub fn #executor #impl_generics () -> ::aspect::Executor #where_clause {
            #body
        }
    })
}

fn trampoline(target: &Ident, method: &MethodModel) -> syn::Result<proc_macro2::TokenStream> {
    let name = method.name();
    let vis = &method.item.vis;
    let descriptor = method.descriptor_fn();
    let executor = method.executor_fn();
    let generics = augment_generics(&method.item.sig.generics);
    let (impl_generics, _, where_clause) = generics.split_for_impl();
    let output = &method.item.sig.output;
    let arg_names: Vec<_> = method.args.iter().map(|(name, _)| name.clone()).collect();
    let arg_types: Vec<_> = method.args.iter().map(|(_, ty)| ty.clone()).collect();
    let display = format!("{target}::{name}");

    let type_params = method.type_params();
    let specialize = if type_params.is_empty() {
        quote! {}
    } else {
        quote! {
            .specialize(::std::vec![
                #(::aspect::TypeDescriptor::of::<#type_params>()),*
            ])
        }
    };
    let executor_call = if type_params.is_empty() {
        quote! { Self::#executor() }
    } else {
        quote! { Self::#executor::<#(#type_params),*>() }
    };

    let build = quote! {
        let __target: ::aspect::SharedValue = self.target.clone();
        let mut __inv = ::aspect::Invocation::new(
            __target,
            Self::#descriptor() #specialize,
            ::std::vec![#(::std::boxed::Box::new(#arg_names) as ::aspect::ArgValue),*],
            #executor_call,
        );
    };

    let body = if method.is_async {
        let join = match output {
            ReturnType::Default => quote! {
                match __task.join_unit().await {
                    ::std::result::Result::Ok(()) => {}
                    ::std::result::Result::Err(__err) => ::std::panic!(
                        "interception of {} produced an invalid return value: {}",
                        #display,
                        __err
                    ),
                }
            },
            ReturnType::Type(_, ty) => quote! {
                match __task.join_typed::<#ty>().await {
                    ::std::result::Result::Ok(__ret) => __ret,
                    ::std::result::Result::Err(__err) => ::std::panic!(
                        "interception of {} produced an invalid return value: {}",
                        #display,
                        __err
                    ),
                }
            },
        };
        quote! {
            #build
            if let ::std::result::Result::Err(__err) = self
                .dispatcher
                .dispatch_async_with_proxy(&mut __inv, self.__aspect_backref())
                .await
            {
                ::std::panic!("interception of {} failed: {}", #display, __err);
            }
            let __task = match __inv.task() {
                ::std::result::Result::Ok(__task) => __task,
                ::std::result::Result::Err(__err) => ::std::panic!(
                    "interception of {} did not produce a task: {}",
                    #display,
                    __err
                ),
            };
            #join
        }
    } else {
        let unbox = match output {
            ReturnType::Default => quote! {},
            ReturnType::Type(_, ty) => quote! {
                match __inv.take_return::<#ty>() {
                    ::std::result::Result::Ok(__ret) => __ret,
                    ::std::result::Result::Err(__err) => ::std::panic!(
                        "interception of {} produced an invalid return value: {}",
                        #display,
                        __err
                    ),
                }
            },
        };
        quote! {
            #build
            if let ::std::result::Result::Err(__err) = self
                .dispatcher
                .dispatch_with_proxy(&mut __inv, self.__aspect_backref())
            {
                ::std::panic!("interception of {} failed: {}", #display, __err);
            }
            #unbox
        }
    };

    let asyncness = &method.item.sig.asyncness;
    Ok(quote! {
        #vis #asyncness fn #name #impl_generics (&self, #(#arg_names: #arg_types),*) #output
        #where_clause
        {
            #body
        }
    })
}

/// Non-pointcut methods reach the target unchanged.
fn forwarding_method(method: &MethodModel) -> proc_macro2::TokenStream {
    let name = method.name();
    let vis = &method.item.vis;
    let generics = &method.item.sig.generics;
    let (impl_generics, _, where_clause) = generics.split_for_impl();
    let output = &method.item.sig.output;
    let arg_names: Vec<_> = method.args.iter().map(|(name, _)| name.clone()).collect();
    let arg_types: Vec<_> = method.args.iter().map(|(_, ty)| ty.clone()).collect();
    let asyncness = &method.item.sig.asyncness;
    let await_suffix = if method.is_async {
        quote! { .await }
    } else {
        quote! {}
    };
    quote! {
        #vis #asyncness fn #name #impl_generics (&self, #(#arg_names: #arg_types),*) #output
        #where_clause
        {
            self.target.#name(#(#arg_names),*) #await_suffix
        }
    }
}

#[proc_macro_derive(ProxyAware, attributes(proxy_slot))]
pub fn derive_proxy_aware(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_proxy_aware(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_proxy_aware(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "ProxyAware can only be derived for structs",
        ));
    };
    let field = data
        .fields
        .iter()
        .find(|f| f.attrs.iter().any(|a| a.path().is_ident("proxy_slot")))
        .ok_or_else(|| {
            Error::new_spanned(
                &input.ident,
                "mark the back-reference field with #[proxy_slot]",
            )
        })?;
    let field_ident = field.ident.clone().ok_or_else(|| {
        Error::new_spanned(field, "#[proxy_slot] requires a named field")
    })?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::aspect::ProxyAware for #name #ty_generics #where_clause {
            fn proxy_slot(&self) -> &::aspect::ProxySlot {
                &self.#field_ident
            }
        }
    })
}
