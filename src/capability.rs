//! Typed capabilities
//!
//! The capability interfaces are plain traits: [Quack] and [Fly]. Both declare a `ready` method,
//! Rust keeps them apart because trait methods are namespaced by the trait that declares them.
//!
//! What a type answers through its *own* reference is described separately, by [OwnQuack] and
//! [OwnFly], and reached with the [Concrete] view:
//!
//! - a method overridden in `OwnQuack` is the type's normal implementation. The `Quack`
//!   implementation of the type must forward to it, so that both views agree. The compiler
//!   cannot tell a forwarding body from a diverging one: the
//!   [DispatchTable](crate::table::DispatchTable) is where a single normal body is guaranteed;
//! - a method left to its default in `OwnQuack` falls through to the external [defaults], while
//!   the `Quack` implementation stays reachable only through a `Quack` reference.
//!
//! [QuackExt] is the external augmentation: a method `Quack` does not declare, available on
//! every quack-capable value.

use std::{rc::Rc, sync::Arc};

use crate::output::Output;

/// Quack-capable objects
pub trait Quack {
    fn quack(&self, out: &mut dyn Output);

    /// Signal readiness to quack
    fn ready(&self, out: &mut dyn Output);
}

/// Fly-capable objects
pub trait Fly {
    fn fly(&self, out: &mut dyn Output);

    /// Signal readiness to fly
    fn ready(&self, out: &mut dyn Output);
}

/// The `Quack` methods a type answers through its own reference
///
/// Each method defaults to the external default of the same name.
pub trait OwnQuack {
    fn quack(&self, out: &mut dyn Output) {
        defaults::quack(out)
    }

    fn ready(&self, out: &mut dyn Output) {
        defaults::ready(out)
    }

    /// A normal `done` shadows the augmentation through the concrete view only.
    fn done(&self, out: &mut dyn Output) {
        defaults::done(out)
    }
}

/// The `Fly` methods a type answers through its own reference
///
/// There are no external defaults for `Fly`, a fly-capable type must provide its own `fly`.
pub trait OwnFly {
    fn fly(&self, out: &mut dyn Output);
}

/// External augmentation of [Quack]
pub trait QuackExt: Quack {
    /// Signal that quacking is over
    fn done(&self, out: &mut dyn Output) {
        defaults::done(out)
    }
}

impl<T> QuackExt for T where T: Quack + ?Sized {}

/// External defaults for the `Quack` slots
pub mod defaults {
    use crate::output::Output;

    pub const QUACK: &str = "Quack";
    pub const READY: &str = "Ready to quack...";
    pub const DONE: &str = "Done quack";

    #[inline]
    pub fn quack(out: &mut dyn Output) {
        out.emit(QUACK)
    }

    #[inline]
    pub fn ready(out: &mut dyn Output) {
        out.emit(READY)
    }

    #[inline]
    pub fn done(out: &mut dyn Output) {
        out.emit(DONE)
    }
}

/// The view of an object through its concrete type
///
/// Only normal implementations and external defaults are visible from here, explicit interface
/// implementations are not.
#[derive(Debug, Clone, Copy)]
pub struct Concrete<'a, T: ?Sized>(pub &'a T);

impl<'a, T> Concrete<'a, T>
where
    T: OwnQuack + ?Sized,
{
    #[inline]
    pub fn quack(&self, out: &mut dyn Output) {
        OwnQuack::quack(self.0, out)
    }

    #[inline]
    pub fn ready(&self, out: &mut dyn Output) {
        OwnQuack::ready(self.0, out)
    }

    #[inline]
    pub fn done(&self, out: &mut dyn Output) {
        OwnQuack::done(self.0, out)
    }
}

impl<'a, T> Concrete<'a, T>
where
    T: OwnFly + ?Sized,
{
    #[inline]
    pub fn fly(&self, out: &mut dyn Output) {
        OwnFly::fly(self.0, out)
    }
}

macro_rules! forward_capability {
    ($($wrapper:ident),+ $(,)?) => {
        $(
            impl<Q> Quack for $wrapper<Q>
            where
                Q: Quack + ?Sized,
            {
                #[inline]
                fn quack(&self, out: &mut dyn Output) {
                    Quack::quack(&**self, out)
                }

                #[inline]
                fn ready(&self, out: &mut dyn Output) {
                    Quack::ready(&**self, out)
                }
            }

            impl<F> Fly for $wrapper<F>
            where
                F: Fly + ?Sized,
            {
                #[inline]
                fn fly(&self, out: &mut dyn Output) {
                    Fly::fly(&**self, out)
                }

                #[inline]
                fn ready(&self, out: &mut dyn Output) {
                    Fly::ready(&**self, out)
                }
            }
        )+
    };
}

forward_capability!(Box, Rc, Arc);

impl<Q> Quack for &Q
where
    Q: Quack + ?Sized,
{
    #[inline]
    fn quack(&self, out: &mut dyn Output) {
        Quack::quack(*self, out)
    }

    #[inline]
    fn ready(&self, out: &mut dyn Output) {
        Quack::ready(*self, out)
    }
}

impl<F> Fly for &F
where
    F: Fly + ?Sized,
{
    #[inline]
    fn fly(&self, out: &mut dyn Output) {
        Fly::fly(*self, out)
    }

    #[inline]
    fn ready(&self, out: &mut dyn Output) {
        Fly::ready(*self, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Recorder;

    struct Plain;

    impl OwnQuack for Plain {}

    impl Quack for Plain {
        fn quack(&self, out: &mut dyn Output) {
            out.emit("explicit quack");
        }

        fn ready(&self, out: &mut dyn Output) {
            out.emit("explicit ready");
        }
    }

    struct Loud;

    impl OwnQuack for Loud {
        fn quack(&self, out: &mut dyn Output) {
            out.emit("LOUD");
        }

        fn done(&self, out: &mut dyn Output) {
            out.emit("loud done");
        }
    }

    impl Quack for Loud {
        fn quack(&self, out: &mut dyn Output) {
            OwnQuack::quack(self, out)
        }

        fn ready(&self, out: &mut dyn Output) {
            out.emit("loud ready");
        }
    }

    #[test]
    fn concrete_view_falls_through_to_defaults() {
        let mut out = Recorder::new();
        let view = Concrete(&Plain);
        view.quack(&mut out);
        view.ready(&mut out);
        view.done(&mut out);

        assert_eq!(
            out.into_lines(),
            vec![defaults::QUACK, defaults::READY, defaults::DONE]
        );
    }

    #[test]
    fn interface_view_uses_explicit_implementations() {
        let mut out = Recorder::new();
        let plain: &dyn Quack = &Plain;
        plain.quack(&mut out);
        plain.ready(&mut out);
        plain.done(&mut out);

        assert_eq!(
            out.into_lines(),
            vec!["explicit quack", "explicit ready", defaults::DONE]
        );
    }

    #[test]
    fn normal_done_only_shadows_concrete_view() {
        let mut out = Recorder::new();
        Concrete(&Loud).done(&mut out);
        QuackExt::done(&Loud, &mut out);
        (&Loud as &dyn Quack).done(&mut out);

        assert_eq!(
            out.into_lines(),
            vec!["loud done", defaults::DONE, defaults::DONE]
        );
    }

    #[test]
    fn wrappers_forward() {
        let mut out = Recorder::new();
        let boxed: Box<dyn Quack> = Box::new(Loud);
        let shared: Rc<dyn Quack> = Rc::new(Plain);
        Quack::quack(&boxed, &mut out);
        Quack::ready(&shared, &mut out);
        Quack::quack(&&Plain, &mut out);

        assert_eq!(
            out.into_lines(),
            vec!["LOUD", "explicit ready", "explicit quack"]
        );
    }
}
