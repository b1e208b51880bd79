//! Consumer-only and producer-only roles
//!
//! A [Processor] only ever receives values of its parameter type, a [Factory] only ever returns
//! them. The substitution directions follow from which impls exist:
//!
//! - [QuackProcessor] implements `Processor<T>` for *every* quack-capable `T`, so the processor
//!   built for the general capability stands in for a processor of any narrower type;
//! - [DefaultFactory] implements `Factory<T>` for every `T` its concrete type upcasts to, so a
//!   factory of a narrower type stands in for a factory of the wider capability.
//!
//! The opposite directions are rejected by the compiler. A processor for ducks only is not a
//! processor of every quack-capable value:
//!
//! ```compile_fail
//! use capability_dispatch::{
//!     capability::Quack, duck::Duck, output::Output, variance::Processor,
//! };
//!
//! struct DuckOnly;
//!
//! impl Processor<Duck> for DuckOnly {
//!     fn process<'a>(&self, items: &mut dyn Iterator<Item = &'a Duck>, out: &mut dyn Output)
//!     where
//!         Duck: 'a,
//!     {
//!         for duck in items {
//!             Quack::quack(duck, out);
//!         }
//!     }
//! }
//!
//! let general: &dyn Processor<dyn Quack> = &DuckOnly;
//! ```
//!
//! A toy duck cannot be produced as something that flies:
//!
//! ```compile_fail
//! use capability_dispatch::{capability::Fly, duck::ToyDuck, variance::{DefaultFactory, Factory}};
//!
//! let factory: &dyn Factory<dyn Fly> = &DefaultFactory::<ToyDuck>::new();
//! ```
//!
//! And a factory needs a default-constructible type:
//!
//! ```compile_fail
//! use capability_dispatch::{
//!     capability::Quack, output::Output, upcast, variance::{DefaultFactory, Factory},
//! };
//!
//! struct Wooden(u8);
//!
//! impl Quack for Wooden {
//!     fn quack(&self, out: &mut dyn Output) {
//!         out.emit("creak");
//!     }
//!
//!     fn ready(&self, out: &mut dyn Output) {
//!         out.emit("never ready");
//!     }
//! }
//!
//! upcast!(Wooden => dyn Quack);
//!
//! let factory: &dyn Factory<dyn Quack> = &DefaultFactory::<Wooden>::new();
//! ```

use std::{
    any::type_name,
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{capability::Quack, output::Output};

/// Identity of a constructed instance
///
/// Every call to [InstanceId::next] returns a fresh value, default construction included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    pub fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::next()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Consumer-only role
///
/// `T` appears only in input position.
pub trait Processor<T: ?Sized> {
    /// Visit every item once, in order
    fn process<'a>(&self, items: &mut dyn Iterator<Item = &'a T>, out: &mut dyn Output)
    where
        T: 'a;
}

pub trait ProcessExt<T: ?Sized>: Processor<T> {
    /// Process anything that can be iterated by reference
    fn process_all<'a, I>(&self, items: I, out: &mut dyn Output)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.process(&mut items.into_iter(), out)
    }
}

impl<T, P> ProcessExt<T> for P
where
    T: ?Sized,
    P: Processor<T> + ?Sized,
{
}

/// Make every item quack
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QuackProcessor;

impl<T> Processor<T> for QuackProcessor
where
    T: Quack + ?Sized,
{
    fn process<'a>(&self, items: &mut dyn Iterator<Item = &'a T>, out: &mut dyn Output)
    where
        T: 'a,
    {
        let mut processed = 0usize;
        for item in items {
            item.quack(out);
            processed += 1;
        }

        trace!(processed, item = type_name::<T>(), "processed sequence");
    }
}

/// Producer-only role
///
/// `T` appears only in output position.
pub trait Factory<T: ?Sized> {
    /// Build a new instance
    fn create_instance(&self) -> Box<T>;
}

/// Conversion of a concrete value into one of the capabilities it implements
///
/// Use [upcast!](crate::upcast) to declare the targets of a type.
pub trait Upcast<T: ?Sized> {
    fn upcast(self) -> Box<T>;
}

/// Declare the capabilities a concrete type can be upcast to
///
/// The type itself is always a valid target.
#[macro_export]
macro_rules! upcast {
    ($ty:ty => $($target:ty),+ $(,)?) => {
        impl $crate::variance::Upcast<$ty> for $ty {
            #[inline]
            fn upcast(self) -> ::std::boxed::Box<$ty> {
                ::std::boxed::Box::new(self)
            }
        }

        $(
            impl $crate::variance::Upcast<$target> for $ty {
                #[inline]
                fn upcast(self) -> ::std::boxed::Box<$target> {
                    ::std::boxed::Box::new(self)
                }
            }
        )+
    };
}

/// Build default-constructed instances of `C`
pub struct DefaultFactory<C>(PhantomData<fn() -> C>);

impl<C> DefaultFactory<C> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C> Default for DefaultFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for DefaultFactory<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for DefaultFactory<C> {}

impl<C> fmt::Debug for DefaultFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DefaultFactory")
            .field(&type_name::<C>())
            .finish()
    }
}

impl<C, T> Factory<T> for DefaultFactory<C>
where
    C: Default + Upcast<T>,
    T: ?Sized,
{
    fn create_instance(&self) -> Box<T> {
        debug!(
            concrete = type_name::<C>(),
            target = type_name::<T>(),
            "creating instance"
        );
        <C as Upcast<T>>::upcast(C::default())
    }
}
