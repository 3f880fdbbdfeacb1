use anyhow::{anyhow, Result};

use crate::languages::Registry;

pub fn list() {
    let registry = Registry::builtin();
    for lang in registry.list_all() {
        println!("{:<12} {:>3}  {}", lang.key, lang.execution_id, lang.display_name);
    }
}

pub fn template(key: &str) -> Result<()> {
    let registry = Registry::builtin();
    let lang = registry
        .find(key)
        .ok_or_else(|| anyhow!("unsupported language '{}'. Supported: {}", key, registry.keys().join(", ")))?;
    println!("{}", lang.starter_template);
    Ok(())
}
