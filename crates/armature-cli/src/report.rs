//! Plain-text rendering of a loaded container.

use std::fmt::{self, Write};

use armature::{
    ContainerBuilder,
    blueprint::{Blueprint, ServiceEntry},
};

/// Render parameters, services and aliases in registry order.
pub fn render(container: &ContainerBuilder) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_container(&mut out, container);
    out
}

fn write_container(out: &mut String, container: &ContainerBuilder) -> fmt::Result {
    writeln!(out, "parameters:")?;
    for (name, value) in container.parameters().iter() {
        writeln!(out, "  {name}: {value}")?;
    }

    writeln!(out, "services:")?;
    for (id, entry) in container.registry().definitions() {
        match entry {
            ServiceEntry::Blueprint(blueprint) => {
                writeln!(out, "  {id}:")?;
                write_blueprint(out, blueprint)?;
            }
            ServiceEntry::Child(child) => {
                writeln!(out, "  {id} (child of {}):", child.parent())?;
                write_blueprint(out, child.blueprint())?;
            }
            ServiceEntry::Alias(_) => {}
        }
    }

    writeln!(out, "aliases:")?;
    for (id, alias) in container.registry().aliases() {
        let visibility = if alias.is_public() { "public" } else { "private" };
        writeln!(out, "  {id} -> {} ({visibility})", alias.target())?;
    }

    let extensions = container.extension_configs();
    if !extensions.is_empty() {
        writeln!(out, "extensions:")?;
        for (alias, configs) in extensions {
            writeln!(out, "  {alias}: {} block(s)", configs.len())?;
        }
    }

    Ok(())
}

fn write_blueprint(out: &mut String, blueprint: &Blueprint) -> fmt::Result {
    if let Some(class) = blueprint.class() {
        writeln!(out, "    class: {class}")?;
    }

    let mut flags = vec![if blueprint.is_public() { "public" } else { "private" }];
    for (set, flag) in [
        (!blueprint.is_shared(), "not-shared"),
        (blueprint.is_synthetic(), "synthetic"),
        (blueprint.is_lazy(), "lazy"),
        (blueprint.is_abstract(), "abstract"),
        (blueprint.is_deprecated(), "deprecated"),
    ] {
        if set {
            flags.push(flag);
        }
    }
    writeln!(out, "    flags: {}", flags.join(", "))?;

    if !blueprint.autowired_methods().is_empty() {
        writeln!(out, "    autowire: {}", blueprint.autowired_methods().join(", "))?;
    }
    if let Some(file) = blueprint.file() {
        writeln!(out, "    file: {file}")?;
    }
    if !blueprint.arguments().is_empty() {
        writeln!(out, "    arguments: {}", blueprint.arguments())?;
    }
    if !blueprint.properties().is_empty() {
        writeln!(out, "    properties: {}", blueprint.properties())?;
    }
    if let Some(factory) = blueprint.factory() {
        writeln!(out, "    factory: {factory}")?;
    }
    if let Some(configurator) = blueprint.configurator() {
        writeln!(out, "    configurator: {configurator}")?;
    }
    for call in blueprint.method_calls() {
        writeln!(out, "    call: {}{}", call.method(), call.arguments())?;
    }
    for tag in blueprint.tags() {
        write!(out, "    tag: {}", tag.name())?;
        for (key, value) in tag.parameters() {
            write!(out, " {key}={value}")?;
        }
        writeln!(out)?;
    }
    if let Some(decoration) = blueprint.decoration() {
        writeln!(
            out,
            "    decorates: {} (inner: {}, priority: {})",
            decoration.decorated_id(),
            decoration.inner_name().unwrap_or("-"),
            decoration.priority()
        )?;
    }

    Ok(())
}
