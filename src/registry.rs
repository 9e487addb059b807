//! Credential/store registry contract.
//!
//! The sync core consumes a list of per-store API credentials; how they are
//! provisioned or secured is not its concern. The environment-variable
//! loader here is the reference supplier.

use serde::Deserialize;

/// Per-store credentials and display metadata supplied by the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreCredentials {
    pub merchant_id: String,
    pub access_token: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl StoreCredentials {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.merchant_id)
    }
}

/// Load store credentials from the `CLOVER_STORES` environment variable,
/// a JSON array of `{merchant_id, access_token, display_name}` objects.
///
/// Returns `Ok(None)` if the variable is unset (registry not configured);
/// returns `Err` if it is set but malformed, so misconfiguration fails fast
/// instead of silently syncing nothing.
pub fn load_from_env() -> anyhow::Result<Option<Vec<StoreCredentials>>> {
    let raw = match std::env::var("CLOVER_STORES") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let stores: Vec<StoreCredentials> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("CLOVER_STORES is set but not valid JSON: {e}"))?;

    if stores.is_empty() {
        anyhow::bail!("CLOVER_STORES is set but contains no stores");
    }

    Ok(Some(stores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn loads_stores_from_json_array() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var(
            "CLOVER_STORES",
            r#"[{"merchant_id": "M1", "access_token": "tok-1", "display_name": "Downtown"},
                {"merchant_id": "M2", "access_token": "tok-2"}]"#,
        );
        let stores = load_from_env().unwrap().unwrap();
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].name(), "Downtown");
        assert_eq!(stores[1].name(), "M2");
        std::env::remove_var("CLOVER_STORES");
    }

    #[test]
    fn unset_variable_is_none() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("CLOVER_STORES");
        assert!(load_from_env().unwrap().is_none());
    }

    #[test]
    fn malformed_json_fails() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("CLOVER_STORES", "not-json");
        assert!(load_from_env().is_err());
        std::env::remove_var("CLOVER_STORES");
    }

    #[test]
    fn empty_list_fails() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("CLOVER_STORES", "[]");
        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("no stores"), "got: {err}");
        std::env::remove_var("CLOVER_STORES");
    }
}
