//! Ducks
//!
//! [Duck] quacks and flies. Its `quack` and `fly` are normal implementations, its `ready` is only
//! implemented explicitly, once for [Quack] and once for [Fly]:
//!
//! ```
//! use capability_dispatch::{
//!     capability::{Concrete, Fly, Quack, QuackExt},
//!     duck::Duck,
//!     output::Recorder,
//! };
//!
//! let duck = Duck::default();
//! let mut out = Recorder::new();
//!
//! Concrete(&duck).ready(&mut out);
//! Quack::ready(&duck, &mut out);
//! Fly::ready(&duck, &mut out);
//! (&duck as &dyn Quack).done(&mut out);
//!
//! assert_eq!(
//!     out.into_lines(),
//!     vec!["Ready to quack...", "Ready to quack!", "Ready to fly", "Done quack"],
//! );
//! ```
//!
//! [ToyDuck] only quacks, and only through a [Quack] reference: its own reference falls back to
//! the external defaults.
//!
//! [model] declares the same two types for the [DispatchTable](crate::table::DispatchTable).

use crate::{
    capability::{Fly, OwnFly, OwnQuack, Quack},
    output::Output,
    registry::ModelBuilder,
    upcast,
    variance::InstanceId,
};

pub const DUCK_QUACK: &str = "Duck quack!";
pub const DUCK_FLIES: &str = "Duck flies!";
pub const DUCK_READY_TO_QUACK: &str = "Ready to quack!";
pub const DUCK_READY_TO_FLY: &str = "Ready to fly";
pub const TOY_QUACK: &str = "Toy quack!";
pub const TOY_READY: &str = "Ready to toy quack!";

/// A duck, able to quack and to fly
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Duck {
    id: InstanceId,
}

impl Duck {
    pub fn id(&self) -> InstanceId {
        self.id
    }
}

impl OwnQuack for Duck {
    fn quack(&self, out: &mut dyn Output) {
        out.emit(DUCK_QUACK);
    }
}

impl OwnFly for Duck {
    fn fly(&self, out: &mut dyn Output) {
        out.emit(DUCK_FLIES);
    }
}

impl Quack for Duck {
    fn quack(&self, out: &mut dyn Output) {
        OwnQuack::quack(self, out)
    }

    fn ready(&self, out: &mut dyn Output) {
        out.emit(DUCK_READY_TO_QUACK);
    }
}

impl Fly for Duck {
    fn fly(&self, out: &mut dyn Output) {
        OwnFly::fly(self, out)
    }

    fn ready(&self, out: &mut dyn Output) {
        out.emit(DUCK_READY_TO_FLY);
    }
}

upcast!(Duck => dyn Quack, dyn Fly);

/// A toy duck, quacking only through a [Quack] reference
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ToyDuck {
    id: InstanceId,
}

impl ToyDuck {
    pub fn id(&self) -> InstanceId {
        self.id
    }
}

impl OwnQuack for ToyDuck {}

impl Quack for ToyDuck {
    fn quack(&self, out: &mut dyn Output) {
        out.emit(TOY_QUACK);
    }

    fn ready(&self, out: &mut dyn Output) {
        out.emit(TOY_READY);
    }
}

upcast!(ToyDuck => dyn Quack);

/// The duck types declared for the dispatch table
pub fn model() -> ModelBuilder {
    use crate::capability::defaults;

    ModelBuilder::new()
        .interface("Quack", ["quack", "ready"])
        .interface("Fly", ["fly", "ready"])
        .augment("Quack", "quack", defaults::QUACK)
        .augment("Quack", "ready", defaults::READY)
        .augment("Quack", "done", defaults::DONE)
        .ty("Duck", |t| {
            t.implements("Quack")
                .implements("Fly")
                .normal("quack", DUCK_QUACK)
                .normal("fly", DUCK_FLIES)
                .explicit("Quack", "ready", DUCK_READY_TO_QUACK)
                .explicit("Fly", "ready", DUCK_READY_TO_FLY)
        })
        .ty("ToyDuck", |t| {
            t.implements("Quack")
                .explicit("Quack", "quack", TOY_QUACK)
                .explicit("Quack", "ready", TOY_READY)
        })
        .factory("Duck", "Quack")
        .factory("ToyDuck", "Quack")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capability::{defaults, Concrete, QuackExt},
        output::Recorder,
        table::{DispatchTable, View},
    };

    fn lines(f: impl FnOnce(&mut dyn Output)) -> Vec<String> {
        let mut out = Recorder::new();
        f(&mut out);
        out.into_lines()
    }

    fn table_call(table: &DispatchTable, ty: &str, view: View, method: &str) -> Vec<String> {
        let binding = table.bind(ty, &view, method).unwrap();
        lines(|out| binding.invoke(out))
    }

    #[test]
    fn normal_implementation_agrees_across_views() {
        let duck = Duck::default();

        assert_eq!(
            lines(|out| Concrete(&duck).quack(out)),
            lines(|out| Quack::quack(&duck, out)),
        );
        assert_eq!(
            lines(|out| Concrete(&duck).fly(out)),
            lines(|out| Fly::fly(&duck, out)),
        );
        assert_eq!(lines(|out| Concrete(&duck).quack(out)), vec![DUCK_QUACK]);
    }

    #[test]
    fn explicit_only_differs_between_views() {
        let toy = ToyDuck::default();
        let concrete = lines(|out| Concrete(&toy).quack(out));
        let through_interface = lines(|out| (&toy as &dyn Quack).quack(out));

        assert_eq!(concrete, vec![defaults::QUACK]);
        assert_eq!(through_interface, vec![TOY_QUACK]);
        assert_ne!(concrete, through_interface);

        assert_eq!(lines(|out| Concrete(&toy).ready(out)), vec![defaults::READY]);
        assert_eq!(lines(|out| Quack::ready(&toy, out)), vec![TOY_READY]);
    }

    #[test]
    fn same_named_methods_stay_per_interface() {
        let duck = Duck::default();
        let quacker: &dyn Quack = &duck;
        let flyer: &dyn Fly = &duck;

        assert_eq!(lines(|out| quacker.ready(out)), vec![DUCK_READY_TO_QUACK]);
        assert_eq!(lines(|out| flyer.ready(out)), vec![DUCK_READY_TO_FLY]);
        assert_eq!(lines(|out| Concrete(&duck).ready(out)), vec![defaults::READY]);
    }

    #[test]
    fn side_method_through_every_view() {
        let toy = ToyDuck::default();

        assert_eq!(lines(|out| QuackExt::done(&toy, out)), vec![defaults::DONE]);
        assert_eq!(lines(|out| Concrete(&toy).done(out)), vec![defaults::DONE]);
    }

    #[test]
    fn model_matches_typed_ducks() {
        let table = model().build().unwrap();
        let duck = Duck::default();
        let toy = ToyDuck::default();

        let quack = || View::interface("Quack");
        let fly = || View::interface("Fly");

        let cases: Vec<(Vec<String>, Vec<String>)> = vec![
            (
                table_call(&table, "Duck", View::Concrete, "quack"),
                lines(|out| Concrete(&duck).quack(out)),
            ),
            (
                table_call(&table, "Duck", View::Concrete, "ready"),
                lines(|out| Concrete(&duck).ready(out)),
            ),
            (
                table_call(&table, "Duck", View::Concrete, "fly"),
                lines(|out| Concrete(&duck).fly(out)),
            ),
            (
                table_call(&table, "Duck", View::Concrete, "done"),
                lines(|out| Concrete(&duck).done(out)),
            ),
            (
                table_call(&table, "Duck", quack(), "quack"),
                lines(|out| Quack::quack(&duck, out)),
            ),
            (
                table_call(&table, "Duck", quack(), "ready"),
                lines(|out| Quack::ready(&duck, out)),
            ),
            (
                table_call(&table, "Duck", quack(), "done"),
                lines(|out| QuackExt::done(&duck, out)),
            ),
            (
                table_call(&table, "Duck", fly(), "fly"),
                lines(|out| Fly::fly(&duck, out)),
            ),
            (
                table_call(&table, "Duck", fly(), "ready"),
                lines(|out| Fly::ready(&duck, out)),
            ),
            (
                table_call(&table, "ToyDuck", View::Concrete, "quack"),
                lines(|out| Concrete(&toy).quack(out)),
            ),
            (
                table_call(&table, "ToyDuck", View::Concrete, "ready"),
                lines(|out| Concrete(&toy).ready(out)),
            ),
            (
                table_call(&table, "ToyDuck", quack(), "quack"),
                lines(|out| Quack::quack(&toy, out)),
            ),
            (
                table_call(&table, "ToyDuck", quack(), "ready"),
                lines(|out| Quack::ready(&toy, out)),
            ),
        ];

        for (from_table, from_types) in cases {
            assert_eq!(from_table, from_types);
        }

        assert!(table.bind("ToyDuck", &fly(), "fly").is_err());
        assert!(table.bind("Duck", &View::Concrete, "swim").is_err());
    }

    #[test]
    fn model_round_trips_through_json() {
        let model = model().into_model();
        let json = serde_json::to_string(&model).unwrap();
        let parsed: crate::table::Model = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, model);
    }
}
