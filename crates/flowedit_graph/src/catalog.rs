// SPDX-License-Identifier: MIT OR Apache-2.0
//! Module catalog.
//!
//! Modules are the entries a user drags into the editor. Each names a node
//! variant and, for branching modules, the output count bounds and the
//! child deletion policy. Catalogs are loaded from RON files.

use crate::node::{BranchingConfig, ChildDeletionPolicy, Node, OutputCountConfig};
use crate::registry::{NodeVariant, RegistryError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A creatable module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Unique module identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Node variant created for this module
    pub variant: NodeVariant,
    /// Output count bounds, branching modules only
    #[serde(default)]
    pub output_count: Option<OutputCountConfig>,
    /// Individual child deletion policy, branching modules only
    #[serde(default)]
    pub child_deletion: ChildDeletionPolicy,
    /// Whether the node shows its settings menu
    #[serde(default)]
    pub show_menu: bool,
}

impl ModuleDefinition {
    /// Plain module
    pub fn single(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            variant: NodeVariant::Single,
            output_count: None,
            child_deletion: ChildDeletionPolicy::default(),
            show_menu: false,
        }
    }

    /// Branching module with the given bounds
    pub fn branching(
        id: impl Into<String>,
        name: impl Into<String>,
        output_count: OutputCountConfig,
        child_deletion: ChildDeletionPolicy,
    ) -> Self {
        Self {
            variant: NodeVariant::Branching,
            output_count: Some(output_count),
            child_deletion,
            show_menu: true,
            ..Self::single(id, name)
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn validate(&self) -> Result<(), CatalogError> {
        match (self.variant, self.output_count) {
            (NodeVariant::BranchingOutput, _) => Err(CatalogError::NotCreatable(self.id.clone())),
            (NodeVariant::Branching, None) => Err(CatalogError::MissingOutputCount(self.id.clone())),
            (NodeVariant::Branching, Some(bounds)) if !bounds.is_well_formed() => {
                Err(CatalogError::InvalidOutputCount(self.id.clone()))
            }
            (NodeVariant::Single, Some(_)) => {
                Err(CatalogError::UnexpectedOutputCount(self.id.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Module as written in a catalog file; the variant tag is checked on load
#[derive(Debug, Serialize, Deserialize)]
struct ModuleEntry {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    variant: String,
    #[serde(default)]
    output_count: Option<OutputCountConfig>,
    #[serde(default)]
    child_deletion: ChildDeletionPolicy,
    #[serde(default)]
    show_menu: bool,
}

impl From<&ModuleDefinition> for ModuleEntry {
    fn from(module: &ModuleDefinition) -> Self {
        Self {
            id: module.id.clone(),
            name: module.name.clone(),
            description: module.description.clone(),
            variant: module.variant.tag().to_string(),
            output_count: module.output_count,
            child_deletion: module.child_deletion,
            show_menu: module.show_menu,
        }
    }
}

impl TryFrom<ModuleEntry> for ModuleDefinition {
    type Error = RegistryError;

    fn try_from(entry: ModuleEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            variant: entry.variant.parse()?,
            id: entry.id,
            name: entry.name,
            description: entry.description,
            output_count: entry.output_count,
            child_deletion: entry.child_deletion,
            show_menu: entry.show_menu,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    modules: Vec<ModuleEntry>,
}

/// Catalog of available modules
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    /// Registered modules by ID
    modules: IndexMap<String, ModuleDefinition>,
}

impl ModuleCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module
    pub fn register(&mut self, module: ModuleDefinition) -> Result<(), CatalogError> {
        module.validate()?;
        if self.modules.contains_key(&module.id) {
            return Err(CatalogError::DuplicateModule(module.id));
        }
        self.modules.insert(module.id.clone(), module);
        Ok(())
    }

    /// Get a module by ID
    pub fn get(&self, id: &str) -> Option<&ModuleDefinition> {
        self.modules.get(id)
    }

    /// Get all modules
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.values()
    }

    /// Get modules creating a given variant
    pub fn modules_of(&self, variant: NodeVariant) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.values().filter(move |m| m.variant == variant)
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Create a node for a module at a position
    pub fn create_node(&self, id: &str, position: [f32; 2]) -> Result<Node, CatalogError> {
        let module = self
            .get(id)
            .ok_or_else(|| CatalogError::UnknownModule(id.to_string()))?;

        let node = match module.output_count {
            Some(output_count) => Node::branching(&module.name, BranchingConfig {
                output_count,
                child_deletion: module.child_deletion,
            }),
            None => Node::single(&module.name),
        };
        Ok(node
            .with_position(position[0], position[1])
            .with_module(&module.id))
    }

    /// Parse a catalog from RON
    ///
    /// Modules naming an unknown node type are skipped with a warning.
    pub fn from_ron(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = ron::from_str(source)?;
        let mut catalog = Self::new();
        for entry in file.modules {
            let id = entry.id.clone();
            match ModuleDefinition::try_from(entry) {
                Ok(module) => catalog.register(module)?,
                Err(err) => tracing::warn!("Skipping module {id}: {err}"),
            }
        }
        Ok(catalog)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_ron(&content)?;
        tracing::info!("Loaded {} module(s) from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Write the catalog as RON
    pub fn to_ron(&self) -> Result<String, CatalogError> {
        let file = CatalogFile {
            modules: self.modules.values().map(ModuleEntry::from).collect(),
        };
        let config = ron::ser::PrettyConfig::default().struct_names(false);
        Ok(ron::ser::to_string_pretty(&file, config)?)
    }
}

/// Built-in catalog used when no catalog file is given
pub fn default_catalog() -> ModuleCatalog {
    let modules = [
        ModuleDefinition::single("source", "Source")
            .with_description("Entry point of a flow"),
        ModuleDefinition::single("transform", "Transform")
            .with_description("Reshape each item"),
        ModuleDefinition::single("filter", "Filter")
            .with_description("Drop items that do not match"),
        ModuleDefinition::branching(
            "router",
            "Router",
            OutputCountConfig::new(2, 8),
            ChildDeletionPolicy::Blocked,
        )
        .with_description("Route items to one of several outputs"),
        ModuleDefinition::branching(
            "fan_out",
            "Fan Out",
            OutputCountConfig::at_least(1),
            ChildDeletionPolicy::DecrementParent,
        )
        .with_description("Copy every item to all outputs"),
        ModuleDefinition::single("sink", "Sink")
            .with_description("End of a flow"),
    ];

    let mut catalog = ModuleCatalog::new();
    for module in modules {
        if let Err(err) = catalog.register(module) {
            tracing::warn!("Built-in module rejected: {err}");
        }
    }
    catalog
}

/// Error when building or reading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Module ID not registered
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    /// Module ID registered twice
    #[error("Duplicate module: {0}")]
    DuplicateModule(String),

    /// Branching module without output count bounds
    #[error("Branching module {0} has no output count bounds")]
    MissingOutputCount(String),

    /// Output count bounds with `min > max`
    #[error("Module {0} has invalid output count bounds")]
    InvalidOutputCount(String),

    /// Non-branching module with output count bounds
    #[error("Module {0} is not branching but declares output count bounds")]
    UnexpectedOutputCount(String),

    /// Module would create generated children directly
    #[error("Module {0} cannot create branching output nodes")]
    NotCreatable(String),

    /// Catalog file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Catalog could not be written
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
(
    modules: [
        (id: "read", name: "Read", variant: "single"),
        (
            id: "switch",
            name: "Switch",
            variant: "branching",
            output_count: Some((min: 2, max: Some(4))),
            child_deletion: decrement_parent,
            show_menu: true,
        ),
        (id: "teleport", name: "Teleport", variant: "wormhole"),
    ],
)
"#;

    #[test]
    fn test_from_ron_skips_unknown_variants() {
        let catalog = ModuleCatalog::from_ron(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("teleport").is_none());

        let switch = catalog.get("switch").unwrap();
        assert_eq!(switch.variant, NodeVariant::Branching);
        assert_eq!(switch.output_count, Some(OutputCountConfig::new(2, 4)));
        assert_eq!(switch.child_deletion, ChildDeletionPolicy::DecrementParent);
        assert!(switch.show_menu);
    }

    #[test]
    fn test_from_ron_rejects_bad_bounds() {
        let source = r#"(modules: [(id: "x", name: "X", variant: "branching", output_count: Some((min: 5, max: Some(1))))])"#;
        assert!(matches!(
            ModuleCatalog::from_ron(source),
            Err(CatalogError::InvalidOutputCount(id)) if id == "x"
        ));
    }

    #[test]
    fn test_register_validation() {
        let mut catalog = ModuleCatalog::new();
        let mut bad = ModuleDefinition::single("x", "X");
        bad.variant = NodeVariant::Branching;
        assert!(matches!(
            catalog.register(bad),
            Err(CatalogError::MissingOutputCount(_))
        ));

        let mut bad = ModuleDefinition::single("y", "Y");
        bad.output_count = Some(OutputCountConfig::new(1, 2));
        assert!(matches!(
            catalog.register(bad),
            Err(CatalogError::UnexpectedOutputCount(_))
        ));

        catalog.register(ModuleDefinition::single("z", "Z")).unwrap();
        assert!(matches!(
            catalog.register(ModuleDefinition::single("z", "Z")),
            Err(CatalogError::DuplicateModule(_))
        ));
    }

    #[test]
    fn test_create_node() {
        let catalog = default_catalog();
        let node = catalog.create_node("router", [10.0, 20.0]).unwrap();
        assert_eq!(node.variant(), NodeVariant::Branching);
        assert_eq!(node.output_count(), Some(2));
        assert_eq!(node.position, [10.0, 20.0]);
        assert_eq!(node.module.as_deref(), Some("router"));

        assert!(matches!(
            catalog.create_node("missing", [0.0, 0.0]),
            Err(CatalogError::UnknownModule(_))
        ));
    }

    #[test]
    fn test_ron_round_trip() {
        let catalog = default_catalog();
        let text = catalog.to_ron().unwrap();
        let loaded = ModuleCatalog::from_ron(&text).unwrap();
        assert_eq!(
            loaded.modules().collect::<Vec<_>>(),
            catalog.modules().collect::<Vec<_>>()
        );
        assert_eq!(loaded.modules_of(NodeVariant::Branching).count(), 2);
    }
}
