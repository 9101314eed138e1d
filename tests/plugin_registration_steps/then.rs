//! Then steps for plugin registration BDD scenarios.

use super::world::{PluginWorld, parse_identities};
use rstest_bdd_macros::then;
use waterworks::collector::{
    domain::{AdapterName, ContributionError, ModelIdentity},
    services::CollectorServiceError,
};

#[then(r#"the plugin "{plugin}" sees models "{models}""#)]
fn plugin_sees_models(
    world: &PluginWorld,
    plugin: String,
    models: String,
) -> Result<(), eyre::Report> {
    let scope = world.scope(&plugin)?;
    let view = world
        .collector
        .resolve_view(scope, false)
        .map_err(|err| eyre::eyre!("resolve_view failed: {err}"))?;
    let visible: Vec<ModelIdentity> = view.into_keys().collect();
    let expected = parse_identities(&models)?;
    if visible != expected {
        return Err(eyre::eyre!(
            "expected plugin '{plugin}' to see {expected:?}, found {visible:?}"
        ));
    }
    Ok(())
}

#[then("every plugin sees {count:usize} models when unrestricted")]
fn every_plugin_sees_all(world: &PluginWorld, count: usize) -> Result<(), eyre::Report> {
    for (plugin, scope) in &world.scopes {
        let view = world
            .collector
            .resolve_view(*scope, true)
            .map_err(|err| eyre::eyre!("resolve_view failed: {err}"))?;
        if view.len() != count {
            return Err(eyre::eyre!(
                "expected plugin '{plugin}' to see {count} models, found {}",
                view.len()
            ));
        }
    }
    Ok(())
}

#[then("the contribution fails with a duplicate model error")]
fn contribution_fails_with_duplicate(world: &PluginWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_contribution
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing contribution result in scenario world"))?;
    if !matches!(
        result,
        Err(CollectorServiceError::Contribution(
            ContributionError::DuplicateModel(_)
        ))
    ) {
        return Err(eyre::eyre!("expected duplicate model error, got {result:?}"));
    }
    Ok(())
}

#[then("the registry holds {count:usize} models")]
fn registry_holds(world: &PluginWorld, count: usize) -> Result<(), eyre::Report> {
    let held = world.collector.finalize().models().len();
    if held != count {
        return Err(eyre::eyre!("expected {count} models, found {held}"));
    }
    Ok(())
}

#[then(r#"adapter "{adapter}" was torn down {count:usize} times"#)]
fn adapter_torn_down(
    world: &PluginWorld,
    adapter: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let name = AdapterName::new(adapter).map_err(|err| eyre::eyre!("{err}"))?;
    let stopped = world
        .last_stop
        .as_ref()
        .ok_or_else(|| eyre::eyre!("host has not stopped in scenario world"))?;
    let reported = stopped
        .as_ref()
        .is_some_and(|report| report.released.contains(&name));
    if reported != (count > 0) {
        return Err(eyre::eyre!(
            "stop report disagrees with expected teardowns: {stopped:?}"
        ));
    }
    let actual = world.materializer.teardown_count(&name);
    if actual != count {
        return Err(eyre::eyre!(
            "expected adapter '{name}' torn down {count} times, found {actual}"
        ));
    }
    Ok(())
}
