//! Registry of declared document types.
//!
//! Built once at start-up and read afterwards: `register` takes `&mut self`,
//! so registration is serialized by construction and a finished registry can
//! be shared behind an `Arc`. Registrations are never removed; tests that need
//! isolation build a fresh `Registry`.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::RegistrationError;
use crate::mapping::IndexableRef;
use crate::source::EntityType;

/// An installed application module that declares document types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Full module name, used for the installed check.
    pub name: String,
    /// Short label, used to group mappings.
    pub label: String,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

fn same_mapping(a: &IndexableRef, b: &IndexableRef) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Process-wide table of document mappings.
#[derive(Default)]
pub struct Registry {
    installed: Vec<AppConfig>,
    mappings: Vec<IndexableRef>,
    entity_mappings: HashMap<String, Vec<IndexableRef>>,
    doc_type_entities: HashMap<String, Arc<EntityType>>,
    app_mappings: HashMap<String, Vec<IndexableRef>>,
    current_app: Option<String>,
}

impl Registry {
    /// Empty registry that accepts mappings owned by `installed` apps.
    pub fn new(installed: Vec<AppConfig>) -> Self {
        Self {
            installed,
            ..Self::default()
        }
    }

    fn check_installed(&self, app: &AppConfig) -> Result<(), RegistrationError> {
        if self.installed.iter().any(|installed| installed.name == app.name) {
            Ok(())
        } else {
            Err(RegistrationError::AppNotInstalled(app.name.clone()))
        }
    }

    /// Register a document mapping.
    ///
    /// Registering the same mapping object twice is a no-op. The mapping is
    /// grouped under `app` when given, otherwise under the application
    /// entered with `enter_app`, otherwise under no application at all.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The mapping is registered
    /// * `Err(RegistrationError::AppNotInstalled)` - If `app` is not an installed application
    /// * `Err(RegistrationError::InvalidMapping)` - If the mapping has no document type or index name
    pub fn register(
        &mut self,
        mapping: IndexableRef,
        app: Option<&AppConfig>,
    ) -> Result<(), RegistrationError> {
        let declaration = mapping.mapping();
        if declaration.doc_type().is_empty() {
            return Err(RegistrationError::invalid_mapping(
                "document type name is empty",
            ));
        }
        if declaration.index().is_empty() {
            return Err(RegistrationError::invalid_mapping(format!(
                "{} has an empty index name",
                declaration.doc_type()
            )));
        }
        if let Some(app) = app {
            self.check_installed(app)?;
        }

        if self.is_registered(&mapping) {
            debug!(doc_type = %declaration.doc_type(), "Mapping already registered");
            return Ok(());
        }

        self.mappings.push(Arc::clone(&mapping));

        if let Some(entity) = declaration.entity_type() {
            self.entity_mappings
                .entry(entity.name().to_string())
                .or_default()
                .push(Arc::clone(&mapping));
            self.doc_type_entities
                .insert(declaration.doc_type().to_string(), Arc::clone(entity));
        }

        let owner = app
            .map(|app| app.label.clone())
            .or_else(|| self.current_app.clone());
        match owner {
            Some(label) => self
                .app_mappings
                .entry(label)
                .or_default()
                .push(Arc::clone(&mapping)),
            None => debug!(doc_type = %declaration.doc_type(), "No owning application"),
        }

        info!(
            doc_type = %declaration.doc_type(),
            index = %declaration.index(),
            entity = ?declaration.entity_type().map(|entity| entity.name()),
            "Registered document mapping"
        );
        Ok(())
    }

    /// Make `app` the owner of mappings registered without an explicit
    /// application until the returned scope is dropped.
    pub fn enter_app(&mut self, app: &AppConfig) -> Result<AppScope<'_>, RegistrationError> {
        self.check_installed(app)?;
        let previous = self.current_app.replace(app.label.clone());
        Ok(AppScope {
            registry: self,
            previous,
        })
    }

    pub fn is_registered(&self, mapping: &IndexableRef) -> bool {
        self.mappings
            .iter()
            .any(|registered| same_mapping(registered, mapping))
    }

    /// Every registered mapping, in registration order.
    pub fn mappings(&self) -> &[IndexableRef] {
        &self.mappings
    }

    /// Mappings backed by the named entity type, in registration order.
    pub fn mappings_for_entity(&self, entity: &str) -> &[IndexableRef] {
        self.entity_mappings
            .get(entity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entity type backing a document type, if any.
    pub fn entity_for_doc_type(&self, doc_type: &str) -> Option<&Arc<EntityType>> {
        self.doc_type_entities.get(doc_type)
    }

    /// Mappings owned by the application with this label.
    pub fn mappings_for_app(&self, label: &str) -> &[IndexableRef] {
        self.app_mappings
            .get(label)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "doc_types",
                &self
                    .mappings
                    .iter()
                    .map(|mapping| mapping.mapping().doc_type())
                    .collect::<Vec<_>>(),
            )
            .field("apps", &self.app_mappings.keys().collect::<Vec<_>>())
            .field("current_app", &self.current_app)
            .finish()
    }
}

/// Registration scope for one application. Restores the previous owner on drop.
pub struct AppScope<'a> {
    registry: &'a mut Registry,
    previous: Option<String>,
}

impl Deref for AppScope<'_> {
    type Target = Registry;

    fn deref(&self) -> &Registry {
        self.registry
    }
}

impl DerefMut for AppScope<'_> {
    fn deref_mut(&mut self) -> &mut Registry {
        self.registry
    }
}

impl Drop for AppScope<'_> {
    fn drop(&mut self) {
        self.registry.current_app = self.previous.take();
    }
}
