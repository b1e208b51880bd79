//! Capability dispatch
//!
//! Which implementation answers a method call depends on the reference used to make it: the
//! object's own type, or one of the capability interfaces it implements. This crate expresses
//! those rules twice:
//!
//! - with Rust traits, in [capability] and [duck]. The compiler checks that every interface slot
//!   is filled and that substitutions are sound, but a normal implementation agreeing across
//!   views is a convention the types must follow;
//! - as data, in a [DispatchTable] built by the [registry]. Every rule, including that one, is
//!   checked when the table is built.
//!
//! The [variance] module adds a consumer-only [Processor](variance::Processor) and a
//! producer-only [Factory](variance::Factory), substitutable in opposite directions.
//!
//! Nothing here writes to the console or to a file directly: every observable effect goes through
//! an injected [Output](output::Output) or [Dependency](inject::Dependency).
//!
//! # Basic usage
//!
//! ```
//! use capability_dispatch::{
//!     capability::Quack,
//!     duck::{self, Duck, ToyDuck},
//!     output::Recorder,
//!     table::View,
//!     variance::{DefaultFactory, Factory, ProcessExt, Processor, QuackProcessor},
//! };
//!
//! let mut out = Recorder::new();
//!
//! let factories: Vec<Box<dyn Factory<dyn Quack>>> = vec![
//!     Box::new(DefaultFactory::<Duck>::new()),
//!     Box::new(DefaultFactory::<ToyDuck>::new()),
//! ];
//! let flock: Vec<Box<dyn Quack>> = factories.iter().map(|f| f.create_instance()).collect();
//!
//! let processor: &dyn Processor<Box<dyn Quack>> = &QuackProcessor;
//! processor.process_all(&flock, &mut out);
//!
//! let table = duck::model().build()?;
//! table
//!     .bind("ToyDuck", &View::Concrete, "quack")?
//!     .invoke(&mut out);
//!
//! assert_eq!(out.into_lines(), vec!["Duck quack!", "Toy quack!", "Quack"]);
//! # Ok::<(), capability_dispatch::Error>(())
//! ```

pub mod capability;
pub mod config;
pub mod duck;
pub mod inject;
pub mod output;
pub mod registry;
pub mod table;
pub mod variance;

pub use registry::{Error, ModelBuilder};
pub use table::DispatchTable;
