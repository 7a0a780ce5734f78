//! Build command: run the orchestrator against the context's registry.

use crate::build::{BuildOptions, BuildOrchestrator, BuildReport};
use crate::context::AppContext;
use crate::error::Result;
use crate::registry::AssetRef;

pub fn build(ctx: &AppContext, targets: &[AssetRef], options: &BuildOptions) -> Result<BuildReport> {
    let mut registry = ctx.open_registry()?;
    let runner = ctx.step_runner();
    BuildOrchestrator::new(ctx.catalog(), &runner).build(&mut registry, targets, options)
}
