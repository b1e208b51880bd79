use std::ops::Not;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use capability_dispatch::{
    capability::{Concrete, Quack, QuackExt},
    config::DemoConfig,
    duck::{self, Duck, ToyDuck},
    inject::Dependent,
    output::{Console, Output},
    variance::{DefaultFactory, Factory, ProcessExt, Processor, QuackProcessor},
    ModelBuilder,
};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("capability_dispatch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => DemoConfig::from_path(&path)
            .with_context(|| format!("Cannot load the configuration from {path}"))?,
        None => DemoConfig::default(),
    };

    let mut out = Console;

    Dependent::new(config.dependency())
        .run(&mut out)
        .context("The injected dependency failed")?;

    processors(&mut out);
    factories(&mut out);
    views(&mut out);

    let model = match config.load_model()? {
        Some(model) => {
            info!("using the configured model");
            ModelBuilder::from(model)
        }
        None => duck::model(),
    };
    let table = model.build().context("Invalid capability model")?;

    if config.dump_table {
        println!("{}", serde_json::to_string_pretty(&table.describe())?);
    }

    let unresolved = table.run_factories(&mut out)?;
    if unresolved.is_empty().not() {
        warn!(
            count = unresolved.len(),
            "some factory methods are not reachable through the concrete reference"
        );
    }

    Ok(())
}

fn processors(out: &mut dyn Output) {
    let ducks = vec![Duck::default()];
    let toys = vec![ToyDuck::default()];

    let general: &dyn Processor<dyn Quack> = &QuackProcessor;
    general.process_all(ducks.iter().map(|duck| duck as &dyn Quack), out);

    let for_ducks: &dyn Processor<Duck> = &QuackProcessor;
    let for_toys: &dyn Processor<ToyDuck> = &QuackProcessor;
    for_ducks.process_all(&ducks, out);
    for_toys.process_all(&toys, out);
}

fn factories(out: &mut dyn Output) {
    let factories: Vec<Box<dyn Factory<dyn Quack>>> = vec![
        Box::new(DefaultFactory::<Duck>::new()),
        Box::new(DefaultFactory::<ToyDuck>::new()),
    ];

    for factory in &factories {
        factory.create_instance().ready(out);
    }
}

fn views(out: &mut dyn Output) {
    let duck = Duck::default();
    Concrete(&duck).ready(out);

    let quacker: &dyn Quack = &duck;
    quacker.ready(out);
    quacker.done(out);
}
