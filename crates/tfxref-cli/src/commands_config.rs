//! `tfxref config get/set`: read and modify configuration.

use tfxref_core::TfxrefConfig;

pub(crate) fn cmd_config_get(key: &str) -> anyhow::Result<()> {
    let config = TfxrefConfig::load_or_default();
    let json = serde_json::to_value(&config)?;

    match navigate_json(&json, key) {
        Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
        None => anyhow::bail!("Unknown config key: {key}"),
    }
    Ok(())
}

pub(crate) fn cmd_config_set(key: &str, value: &str) -> anyhow::Result<()> {
    let config = TfxrefConfig::load_or_default();
    let updated = apply_setting(&config, key, value)?;

    let config_path = TfxrefConfig::default_path();
    updated.save(&config_path)?;
    eprintln!("Updated {key} and saved to {}", config_path.display());
    Ok(())
}

/// `config` with `key` set to `value`, validated by a round trip through serde.
fn apply_setting(config: &TfxrefConfig, key: &str, value: &str) -> anyhow::Result<TfxrefConfig> {
    let mut json = serde_json::to_value(config)?;

    // JSON first, bare string otherwise
    let new_value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    set_json_path(&mut json, key, new_value)?;

    Ok(serde_json::from_value(json)?)
}

/// Navigate a JSON value by a dot-separated path.
fn navigate_json<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Set a value at a dot-separated JSON path. Only existing keys can be set.
fn set_json_path(
    root: &mut serde_json::Value,
    path: &str,
    value: serde_json::Value,
) -> anyhow::Result<()> {
    let parts: Vec<&str> = path.split('.').collect();
    let Some((last, sections)) = parts.split_last() else {
        anyhow::bail!("Empty key path");
    };

    let mut current = root;
    for part in sections {
        current = current
            .get_mut(*part)
            .ok_or_else(|| anyhow::anyhow!("Unknown config section: {part}"))?;
    }

    let Some(obj) = current.as_object_mut() else {
        anyhow::bail!("Config path does not lead to an object");
    };
    if !obj.contains_key(*last) {
        anyhow::bail!("Unknown config key: {last}");
    }
    obj.insert((*last).to_string(), value);
    Ok(())
}
