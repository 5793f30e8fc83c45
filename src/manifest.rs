//! Optional list of which built-in modules to load.
//!
//! ```toml
//! commands = ["ping", "help"]
//! events = ["ready", "message"]
//! ```
//!
//! A missing list means "everything in the table".

use crate::registry::{LoadError, ModuleEntry};
use anyhow::{anyhow, Result};
use std::path::Path;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Manifest {
    pub commands: Option<Vec<String>>,
    pub events: Option<Vec<String>>,
}

impl Manifest {
    /// Read a manifest.  Failing to read or parse it is fatal, the bot should not come up with a
    /// different set of modules than the one asked for.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow!(
                "Could not read module manifest at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse module manifest at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }
}

/// Keep the table entries named in `ids`, in table order.  Names with no table entry are returned
/// as errors.
pub fn select<T: ?Sized>(
    ids: Option<&[String]>,
    table: Vec<ModuleEntry<T>>,
) -> (Vec<ModuleEntry<T>>, Vec<LoadError>) {
    let Some(ids) = ids else {
        return (table, Vec::new());
    };

    let unknown = ids
        .iter()
        .filter(|id| !table.iter().any(|module| module.id == id.as_str()))
        .map(|id| LoadError::UnknownModule(id.clone()))
        .collect();

    let selected = table
        .into_iter()
        .filter(|module| ids.iter().any(|id| id == module.id))
        .collect();

    (selected, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn unit() -> Result<Arc<()>> {
        Ok(Arc::new(()))
    }

    fn table() -> Vec<ModuleEntry<()>> {
        vec![
            ModuleEntry { id: "ping", factory: unit },
            ModuleEntry { id: "help", factory: unit },
        ]
    }

    #[test]
    fn no_list_selects_everything() {
        let (selected, unknown) = select(None, table());
        assert_eq!(selected.len(), 2);
        assert!(unknown.is_empty());
    }

    #[test]
    fn list_narrows_and_reports_unknown_ids() {
        let ids = vec!["help".to_owned(), "kick".to_owned()];
        let (selected, unknown) = select(Some(ids.as_slice()), table());

        assert_eq!(selected.iter().map(|m| m.id).collect::<Vec<_>>(), ["help"]);
        assert!(matches!(
            unknown.as_slice(),
            [LoadError::UnknownModule(id)] if id == "kick"
        ));
    }

    #[tokio::test]
    async fn manifest_file_parses() {
        let path = std::env::temp_dir().join(format!("cmdbot-manifest-{}.toml", std::process::id()));
        std::fs::write(&path, "commands = [\"ping\"]\n").unwrap();

        let manifest = Manifest::load(&path).await.unwrap();
        assert_eq!(manifest.commands, Some(vec!["ping".to_owned()]));
        assert!(manifest.events.is_none());
    }

    #[tokio::test]
    async fn unreadable_manifest_is_an_error() {
        let path = std::env::temp_dir().join("cmdbot-no-such-manifest.toml");
        assert!(Manifest::load(&path).await.is_err());
    }
}
