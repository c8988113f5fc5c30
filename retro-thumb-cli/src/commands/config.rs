use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_thumb_lib::settings::ImageTypePriority;
use retro_thumb_lib::{ConfigStore, RomDataFactory};

use crate::error::CliError;

fn priority_summary(priority: &ImageTypePriority) -> String {
    let join = |types: &[retro_thumb_lib::retro_thumb_core::ImageType]| {
        types
            .iter()
            .map(|t| t.config_name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    match priority {
        ImageTypePriority::Custom(types) => join(types),
        ImageTypePriority::Default(types) => format!("{} (default)", join(types)),
        ImageTypePriority::Disabled => "disabled".to_string(),
    }
}

/// Show the effective configuration.
pub(crate) fn run_config_show(store: &ConfigStore, factory: &RomDataFactory) -> Result<(), CliError> {
    let path = store.path();
    let status = if path.exists() {
        "(exists)".if_supports_color(Stdout, |t| t.green()).to_string()
    } else {
        "(not found, using defaults)"
            .if_supports_color(Stdout, |t| t.dimmed())
            .to_string()
    };
    println!(
        "Config file: {} {}",
        path.display().if_supports_color(Stdout, |t| t.cyan()),
        status,
    );
    println!();

    let config = store.snapshot();
    print!("{}", config.to_toml_string()?);
    println!();

    println!(
        "{}",
        "Image type priority:".if_supports_color(Stdout, |t| t.bold()),
    );
    for class_name in factory.class_names() {
        println!(
            "  {:<12} {}",
            class_name,
            priority_summary(&config.image_type_priority(class_name)),
        );
    }
    Ok(())
}

/// Print the config file location.
pub(crate) fn run_config_path(store: &ConfigStore) {
    println!("{}", store.path().display());
}
