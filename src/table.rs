//! Capability model and dispatch table
//!
//! A [Model] declares capability interfaces, the external augmentations attached to them and the
//! concrete types implementing them. It is plain data: use [serde_json] to store or load it and
//! [ModelBuilder](crate::registry::ModelBuilder) to turn it into a [DispatchTable].
//!
//! The table answers, for every `(type, view, method)` triple, which implementation is invoked.
//! Its content is fixed once built.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Not,
};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, OneOrMany};
use tracing::{debug, trace, warn};

use crate::{output::Output, registry::Error, variance::InstanceId};

/// The behaviour of an implementation: a line handed to the output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(String);

impl Body {
    pub fn new(line: impl Into<String>) -> Self {
        Self(line.into())
    }

    #[inline]
    pub fn line(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn run(&self, out: &mut dyn Output) {
        out.emit(&self.0)
    }
}

impl From<&str> for Body {
    fn from(line: &str) -> Self {
        Self::new(line)
    }
}

impl From<String> for Body {
    fn from(line: String) -> Self {
        Self(line)
    }
}

/// Declarations of interfaces, augmentations, types and factories
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,

    #[serde(default)]
    pub augmentations: Vec<Augmentation>,

    #[serde(default)]
    pub types: Vec<TypeDecl>,

    #[serde(default)]
    pub factories: Vec<FactoryDecl>,
}

/// A capability interface: a named set of method names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,

    #[serde(default)]
    pub methods: Vec<String>,
}

/// A method body attached to an interface from outside
///
/// If the interface declares `method`, the body is the default answering through the concrete
/// view of a type that has no normal implementation. Otherwise it is a side method available on
/// every implementor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Augmentation {
    pub interface: String,
    pub method: String,
    pub body: Body,
}

/// A concrete type
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    pub name: String,

    /// Implemented interfaces
    #[serde(default)]
    #[serde_as(as = "OneOrMany<_>")]
    pub implements: Vec<String>,

    /// Normal implementations, visible through every view
    #[serde(default)]
    pub normal: BTreeMap<String, Body>,

    /// Implementations visible only through the declaring interface
    #[serde(default)]
    pub explicit: Vec<ExplicitImpl>,

    #[serde(default = "default_constructible")]
    pub default_constructible: bool,
}

const fn default_constructible() -> bool {
    true
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            implements: Vec::new(),
            normal: BTreeMap::new(),
            explicit: Vec::new(),
            default_constructible: true,
        }
    }
}

/// An explicit interface implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitImpl {
    pub interface: String,
    pub method: String,
    pub body: Body,
}

/// A factory producing instances of `ty` seen as `produces`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryDecl {
    #[serde(rename = "type")]
    pub ty: String,
    pub produces: String,
}

/// The reference type used at the call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    /// The object's own type
    Concrete,

    /// One of the interfaces the object implements
    Interface(String),
}

impl View {
    pub fn interface(name: impl Into<String>) -> Self {
        Self::Interface(name.into())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete => f.write_str("concrete reference"),
            Self::Interface(name) => write!(f, "{name} reference"),
        }
    }
}

/// Where the answering implementation comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Source {
    Normal,
    Explicit { interface: String },
    ExternalDefault { interface: String },
    SideMethod { interface: String },
}

/// The implementation answering a slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub source: Source,
    pub body: Body,
}

impl Resolution {
    pub fn new(source: Source, body: Body) -> Self {
        Self { source, body }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TypeEntry {
    pub(crate) implements: BTreeSet<String>,
    pub(crate) views: BTreeMap<View, BTreeMap<String, Resolution>>,
    pub(crate) default_constructible: bool,
}

/// Resolved dispatch rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchTable {
    pub(crate) types: BTreeMap<String, TypeEntry>,
    pub(crate) factories: BTreeSet<(String, String)>,
}

/// A single row of [DispatchTable::describe]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotEntry<'a> {
    #[serde(rename = "type")]
    pub ty: &'a str,
    pub view: &'a View,
    pub method: &'a str,
    #[serde(flatten)]
    pub resolution: &'a Resolution,
}

impl DispatchTable {
    /// The implementation answering `method` on `ty` through `view`, if any
    pub fn resolve(&self, ty: &str, view: &View, method: &str) -> Option<&Resolution> {
        self.types
            .get(ty)?
            .views
            .get(view)?
            .get(method)
    }

    /// Bind `method` on `ty` through `view`
    ///
    /// This is where a missing implementation is reported. Invoking the returned [Binding]
    /// cannot fail.
    pub fn bind(&self, ty: &str, view: &View, method: &str) -> Result<Binding<'_>, Error> {
        let entry = self
            .types
            .get(ty)
            .ok_or_else(|| Error::UnknownType(ty.to_owned()))?;

        if let View::Interface(interface) = view {
            if entry.implements.contains(interface).not() {
                return Err(Error::NotImplemented {
                    ty: ty.to_owned(),
                    interface: interface.clone(),
                });
            }
        }

        let resolution = entry
            .views
            .get(view)
            .and_then(|slots| slots.get(method))
            .ok_or_else(|| Error::UnresolvedCapability {
                ty: ty.to_owned(),
                view: view.clone(),
                method: method.to_owned(),
            })?;

        trace!(ty, %view, method, source = ?resolution.source, "bound");
        Ok(Binding { resolution })
    }

    /// Declared types, in name order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn implements(&self, ty: &str, interface: &str) -> bool {
        self.types
            .get(ty)
            .map_or(false, |entry| entry.implements.contains(interface))
    }

    /// Every method reachable on `ty` through `view`
    pub fn slots<'a>(
        &'a self,
        ty: &str,
        view: &View,
    ) -> impl Iterator<Item = (&'a str, &'a Resolution)> + 'a {
        self.types
            .get(ty)
            .and_then(|entry| entry.views.get(view))
            .into_iter()
            .flatten()
            .map(|(method, resolution)| (method.as_str(), resolution))
    }

    /// The number of resolved slots
    pub fn len(&self) -> usize {
        self.types
            .values()
            .flat_map(|entry| entry.views.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten the table, ordered by type, view and method
    pub fn describe(&self) -> Vec<SlotEntry<'_>> {
        self.types
            .iter()
            .flat_map(|(ty, entry)| {
                entry.views.iter().flat_map(move |(view, slots)| {
                    slots.iter().map(move |(method, resolution)| SlotEntry {
                        ty,
                        view,
                        method,
                        resolution,
                    })
                })
            })
            .collect()
    }

    /// Factories declared by the model, as `(type, produced interface)` pairs
    pub fn factories(&self) -> impl Iterator<Item = (&str, &str)> {
        self.factories
            .iter()
            .map(|(ty, produces)| (ty.as_str(), produces.as_str()))
    }

    /// A factory building `ty` instances seen through `produces`
    pub fn factory<'a>(&'a self, ty: &str, produces: &str) -> Result<DynFactory<'a>, Error> {
        let (ty, entry) = self
            .types
            .get_key_value(ty)
            .ok_or_else(|| Error::UnknownType(ty.to_owned()))?;

        let produces = entry.implements.get(produces).ok_or_else(|| Error::NotImplemented {
            ty: ty.clone(),
            interface: produces.to_owned(),
        })?;

        if entry.default_constructible.not() {
            return Err(Error::ConstructionFailure { ty: ty.clone() });
        }

        Ok(DynFactory {
            table: self,
            ty,
            produces,
        })
    }

    /// Create one instance per declared factory and invoke every method reachable through the
    /// produced interface, then the same methods through the concrete reference
    ///
    /// A method the concrete reference cannot bind is logged and returned, the others still run.
    pub fn run_factories(&self, out: &mut dyn Output) -> Result<Vec<Error>, Error> {
        let mut unresolved = Vec::new();

        for (ty, produces) in self.factories() {
            let factory = self.factory(ty, produces)?;
            let instance = factory.create_instance();

            let methods: Vec<&str> = self
                .slots(instance.ty(), instance.view())
                .map(|(method, _)| method)
                .collect();
            for method in &methods {
                instance.bind(method)?.invoke(out);
            }

            let concrete = instance.with_view(View::Concrete)?;
            for method in methods {
                match concrete.bind(method) {
                    Ok(binding) => binding.invoke(out),
                    Err(error) => {
                        warn!(
                            ty = factory.ty(),
                            produces = factory.produces(),
                            %error,
                            "not reachable through the concrete reference"
                        );
                        unresolved.push(error);
                    }
                }
            }
        }

        Ok(unresolved)
    }
}

/// A resolved method, ready to be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    resolution: &'a Resolution,
}

impl<'a> Binding<'a> {
    #[inline]
    pub fn source(&self) -> &'a Source {
        &self.resolution.source
    }

    #[inline]
    pub fn resolution(&self) -> &'a Resolution {
        self.resolution
    }

    #[inline]
    pub fn invoke(&self, out: &mut dyn Output) {
        self.resolution.body.run(out)
    }
}

/// Builds instances of a table type, upcast to one of its interfaces
#[derive(Debug, Clone, Copy)]
pub struct DynFactory<'a> {
    table: &'a DispatchTable,
    ty: &'a str,
    produces: &'a str,
}

impl<'a> DynFactory<'a> {
    pub fn ty(&self) -> &'a str {
        self.ty
    }

    pub fn produces(&self) -> &'a str {
        self.produces
    }

    pub fn create_instance(&self) -> Instance<'a> {
        let id = InstanceId::next();
        debug!(ty = self.ty, produces = self.produces, %id, "creating instance");

        Instance {
            table: self.table,
            ty: self.ty,
            view: View::interface(self.produces),
            id,
        }
    }
}

/// An object of a table type, held through a specific view
#[derive(Debug, Clone)]
pub struct Instance<'a> {
    table: &'a DispatchTable,
    ty: &'a str,
    view: View,
    id: InstanceId,
}

impl<'a> Instance<'a> {
    pub fn ty(&self) -> &'a str {
        self.ty
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The same object, held through another view
    pub fn with_view(&self, view: View) -> Result<Self, Error> {
        if let View::Interface(interface) = &view {
            if self.table.implements(self.ty, interface).not() {
                return Err(Error::NotImplemented {
                    ty: self.ty.to_owned(),
                    interface: interface.clone(),
                });
            }
        }

        Ok(Self {
            view,
            ..self.clone()
        })
    }

    pub fn bind(&self, method: &str) -> Result<Binding<'a>, Error> {
        self.table.bind(self.ty, &self.view, method)
    }
}
