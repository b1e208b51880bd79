//! Capability registry
//!
//! The main entry point is [ModelBuilder]. It collects interfaces, augmentations and types, then
//! [ModelBuilder::build] checks the declarations and resolves every slot into a
//! [DispatchTable].
//!
//! For a type `C` implementing `I` and a method `M` declared by `I`, the answering implementation
//! is, highest precedence first:
//!
//! 1. the normal implementation of `M` on `C`, through any view;
//! 2. through the `I` view, the implementation of `M` explicit to `I`;
//! 3. through the concrete view, the augmentation attached to `(I, M)`;
//! 4. nothing: through the `I` view this fails the build, through the concrete view the slot
//!    does not exist and binding it fails.
//!
//! An augmentation for a method `I` does not declare is a side method: it always answers through
//! the `I` view, and through the concrete view unless `C` has a normal method with that name.

use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet, HashSet},
    ops::Not,
};

use tracing::debug;

use crate::table::{
    Augmentation, Body, DispatchTable, ExplicitImpl, FactoryDecl, InterfaceDecl, Model,
    Resolution, Source, TypeDecl, TypeEntry, View,
};

/// Registry errors
///
/// They are all detected while building the table or while binding a method, never while
/// invoking a bound method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// No implementation answers the slot
    #[error("No implementation of \"{method}\" answers for \"{ty}\" through the {view}")]
    UnresolvedCapability {
        ty: String,
        view: View,
        method: String,
    },

    /// Two augmentations compete for the same concrete slot
    ///
    /// A normal implementation of the method resolves the conflict.
    #[error("\"{ty}\" gets \"{method}\" from both \"{first}\" and \"{second}\" augmentations")]
    AmbiguousDefault {
        ty: String,
        method: String,
        first: String,
        second: String,
    },

    /// A factory needs a default-constructible type
    #[error("\"{ty}\" cannot be default-constructed")]
    ConstructionFailure { ty: String },

    #[error("Two interfaces use the name \"{0}\"")]
    DuplicateInterface(String),

    #[error("Two types use the name \"{0}\"")]
    DuplicateType(String),

    #[error("Interface \"{interface}\" declares \"{method}\" twice")]
    DuplicateMember { interface: String, method: String },

    #[error("Interface \"{0}\" is not declared")]
    UnknownInterface(String),

    #[error("Type \"{0}\" is not declared")]
    UnknownType(String),

    #[error("\"{ty}\" does not implement \"{interface}\"")]
    NotImplemented { ty: String, interface: String },

    /// Explicit implementations must match a member of their interface
    #[error("Interface \"{interface}\" does not declare \"{method}\"")]
    UndeclaredMember { interface: String, method: String },

    #[error("\"{ty}\" implements \"{interface}.{method}\" twice")]
    DuplicateImplementation {
        ty: String,
        interface: String,
        method: String,
    },

    #[error("Interface \"{interface}\" is augmented with \"{method}\" twice")]
    DuplicateAugmentation { interface: String, method: String },
}

/// A builder for a [DispatchTable]
#[must_use]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModelBuilder {
    model: Model,
}

/// A builder for a single [TypeDecl]
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBuilder {
    decl: TypeDecl,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            decl: TypeDecl::new(name),
        }
    }

    /// Declare an implemented interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.decl.implements.push(interface.into());
        self
    }

    /// Add a normal implementation
    ///
    /// A second normal implementation of the same method replaces the first one.
    pub fn normal(mut self, method: impl Into<String>, body: impl Into<Body>) -> Self {
        self.decl.normal.insert(method.into(), body.into());
        self
    }

    /// Add an implementation reachable only through `interface`
    pub fn explicit(
        mut self,
        interface: impl Into<String>,
        method: impl Into<String>,
        body: impl Into<Body>,
    ) -> Self {
        self.decl.explicit.push(ExplicitImpl {
            interface: interface.into(),
            method: method.into(),
            body: body.into(),
        });
        self
    }

    /// Mark the type as lacking a default constructor
    pub fn without_default_constructor(mut self) -> Self {
        self.decl.default_constructible = false;
        self
    }

    pub fn into_decl(self) -> TypeDecl {
        self.decl
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an interface with its members
    pub fn interface<I, M>(mut self, name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.model.interfaces.push(InterfaceDecl {
            name: name.into(),
            methods: methods.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Attach a body to `interface` from outside
    pub fn augment(
        mut self,
        interface: impl Into<String>,
        method: impl Into<String>,
        body: impl Into<Body>,
    ) -> Self {
        self.model.augmentations.push(Augmentation {
            interface: interface.into(),
            method: method.into(),
            body: body.into(),
        });
        self
    }

    /// Declare a concrete type
    pub fn ty<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(TypeBuilder) -> TypeBuilder,
    {
        self.model.types.push(f(TypeBuilder::new(name)).into_decl());
        self
    }

    /// Declare a factory building `ty` instances seen through `produces`
    pub fn factory(mut self, ty: impl Into<String>, produces: impl Into<String>) -> Self {
        self.model.factories.push(FactoryDecl {
            ty: ty.into(),
            produces: produces.into(),
        });
        self
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Check the declarations and resolve every slot
    pub fn build(self) -> Result<DispatchTable, Error> {
        let Model {
            interfaces,
            augmentations,
            types,
            factories,
        } = self.model;

        let mut declared: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for InterfaceDecl { name, methods } in interfaces {
            if let Some(method) = first_duplicate(&methods) {
                return Err(Error::DuplicateMember {
                    interface: name,
                    method: method.to_owned(),
                });
            }

            match declared.entry(name) {
                Entry::Vacant(entry) => {
                    entry.insert(methods);
                }
                Entry::Occupied(entry) => {
                    return Err(Error::DuplicateInterface(entry.remove_entry().0))
                }
            }
        }

        let mut augmented: BTreeMap<(String, String), Body> = BTreeMap::new();
        for Augmentation {
            interface,
            method,
            body,
        } in augmentations
        {
            if declared.contains_key(&interface).not() {
                return Err(Error::UnknownInterface(interface));
            }

            match augmented.entry((interface, method)) {
                Entry::Vacant(entry) => {
                    entry.insert(body);
                }
                Entry::Occupied(entry) => {
                    let (interface, method) = entry.remove_entry().0;
                    return Err(Error::DuplicateAugmentation { interface, method });
                }
            }
        }

        let mut table = DispatchTable::default();
        for decl in types {
            let (name, entry) = resolve_type(decl, &declared, &augmented)?;

            match table.types.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(slot) => return Err(Error::DuplicateType(slot.remove_entry().0)),
            }
        }

        for FactoryDecl { ty, produces } in factories {
            if declared.contains_key(&produces).not() {
                return Err(Error::UnknownInterface(produces));
            }

            table.factory(&ty, &produces)?;
            table.factories.insert((ty, produces));
        }

        debug!(
            interfaces = declared.len(),
            types = table.types.len(),
            slots = table.len(),
            "dispatch table built"
        );
        Ok(table)
    }
}

impl From<Model> for ModelBuilder {
    fn from(model: Model) -> Self {
        Self { model }
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .iter()
        .map(String::as_str)
        .find(|name| seen.insert(*name).not())
}

fn resolve_type(
    decl: TypeDecl,
    declared: &BTreeMap<String, Vec<String>>,
    augmented: &BTreeMap<(String, String), Body>,
) -> Result<(String, TypeEntry), Error> {
    let TypeDecl {
        name,
        implements,
        normal,
        explicit,
        default_constructible,
    } = decl;

    let mut implemented = BTreeSet::new();
    for interface in implements {
        if declared.contains_key(&interface).not() {
            return Err(Error::UnknownInterface(interface));
        }
        implemented.insert(interface);
    }

    let mut explicit_bodies: BTreeMap<(String, String), Body> = BTreeMap::new();
    for ExplicitImpl {
        interface,
        method,
        body,
    } in explicit
    {
        let members = declared
            .get(&interface)
            .ok_or_else(|| Error::UnknownInterface(interface.clone()))?;

        if implemented.contains(&interface).not() {
            return Err(Error::NotImplemented {
                ty: name,
                interface,
            });
        }

        if members.contains(&method).not() {
            return Err(Error::UndeclaredMember { interface, method });
        }

        match explicit_bodies.entry((interface, method)) {
            Entry::Vacant(entry) => {
                entry.insert(body);
            }
            Entry::Occupied(entry) => {
                let (interface, method) = entry.remove_entry().0;
                return Err(Error::DuplicateImplementation {
                    ty: name,
                    interface,
                    method,
                });
            }
        }
    }

    let mut views = BTreeMap::new();

    for interface in &implemented {
        let members = &declared[interface];
        let mut slots = BTreeMap::new();

        for method in members {
            let resolution = if let Some(body) = normal.get(method) {
                Resolution::new(Source::Normal, body.clone())
            } else if let Some(body) = explicit_bodies.get(&(interface.clone(), method.clone())) {
                Resolution::new(
                    Source::Explicit {
                        interface: interface.clone(),
                    },
                    body.clone(),
                )
            } else {
                return Err(Error::UnresolvedCapability {
                    ty: name,
                    view: View::Interface(interface.clone()),
                    method: method.clone(),
                });
            };

            slots.insert(method.clone(), resolution);
        }

        let side_methods = augmented
            .iter()
            .filter(|((owner, method), _)| owner == interface && members.contains(method).not());
        for ((_, method), body) in side_methods {
            slots.insert(
                method.clone(),
                Resolution::new(
                    Source::SideMethod {
                        interface: interface.clone(),
                    },
                    body.clone(),
                ),
            );
        }

        views.insert(View::Interface(interface.clone()), slots);
    }

    let mut concrete: BTreeMap<String, Resolution> = normal
        .iter()
        .map(|(method, body)| {
            (
                method.clone(),
                Resolution::new(Source::Normal, body.clone()),
            )
        })
        .collect();

    let mut fallbacks: BTreeMap<&str, Vec<(&str, &Body)>> = BTreeMap::new();
    for ((interface, method), body) in augmented {
        if implemented.contains(interface) && normal.contains_key(method).not() {
            fallbacks
                .entry(method.as_str())
                .or_default()
                .push((interface.as_str(), body));
        }
    }

    for (method, candidates) in fallbacks {
        let (interface, body) = match candidates.as_slice() {
            [single] => *single,
            [(first, _), (second, _), ..] => {
                return Err(Error::AmbiguousDefault {
                    ty: name,
                    method: method.to_owned(),
                    first: (*first).to_owned(),
                    second: (*second).to_owned(),
                })
            }
            [] => continue,
        };

        let interface = interface.to_owned();
        let source = if declared[&interface].iter().any(|member| member == method) {
            Source::ExternalDefault { interface }
        } else {
            Source::SideMethod { interface }
        };
        concrete.insert(method.to_owned(), Resolution::new(source, body.clone()));
    }

    views.insert(View::Concrete, concrete);

    Ok((
        name,
        TypeEntry {
            implements: implemented,
            views,
            default_constructible,
        },
    ))
}
