//! View provider demo
//!
//! Bootstraps the view services into a container and renders the test
//! fixtures. Configuration comes from `STENCIL_TEMPLATE_DIR` and friends when
//! set, otherwise the bundled fixtures are used.
//!
//! ```text
//! RUST_LOG=stencil_views=debug cargo run -p stencil-views --example render_demo
//! ```

use std::path::Path;

use stencil_core::{AppConfigTrait, Container};
use stencil_views::keys;
use stencil_views::tera::Context;
use stencil_views::{TemplateServiceProvider, ViewConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ViewConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::info!("Using bundled fixtures ({})", e);
            ViewConfig::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
        }
    };

    let provider = TemplateServiceProvider::from_config(&config);
    println!("Templates: {}", provider.template_directory().display());
    println!("Cache:     {}", provider.cache_directory().display());

    let mut container = Container::new();
    provider.bootstrap(&mut container);

    let engine = container.get(keys::ENGINE)?;

    let mut context = Context::new();
    context.insert("name", "David");

    for name in ["test", "page.html"] {
        if !engine.has_template(name) {
            println!("{}: not found", name);
            continue;
        }
        println!("{}: {}", name, engine.render(name, &context)?);
    }

    Ok(())
}
