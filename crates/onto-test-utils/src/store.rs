//! In-memory entity store fake

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use onto_backend::{EntityStore, Error, Result};
use onto_model::{ClassDefinition, PropertyDefinition, normalize_name};

/// Entity store backed by two in-memory maps
///
/// Names are canonicalized on write, mirroring the real store. Operations
/// whose entity name is listed in `fail_on` fail deterministically, and
/// every call is appended to a log for ordering assertions.
#[derive(Default)]
pub struct FakeEntityStore {
    properties: Mutex<BTreeMap<String, PropertyDefinition>>,
    classes: Mutex<BTreeMap<String, ClassDefinition>>,
    fail_on: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing definitions
    pub fn with_contents(
        properties: Vec<PropertyDefinition>,
        classes: Vec<ClassDefinition>,
    ) -> Self {
        let store = Self::new();
        {
            let mut props = store.properties.lock().unwrap();
            for p in properties {
                props.insert(normalize_name(&p.name), p);
            }
            let mut cls = store.classes.lock().unwrap();
            for c in classes {
                cls.insert(normalize_name(&c.name), c);
            }
        }
        store
    }

    /// Make every operation touching `name` fail
    pub fn fail_on(&self, name: &str) {
        self.fail_on.lock().unwrap().push(normalize_name(name));
    }

    /// Calls made so far, as `"verb:name"` strings in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn property(&self, name: &str) -> Option<PropertyDefinition> {
        self.properties
            .lock()
            .unwrap()
            .get(&normalize_name(name))
            .cloned()
    }

    pub fn class(&self, name: &str) -> Option<ClassDefinition> {
        self.classes
            .lock()
            .unwrap()
            .get(&normalize_name(name))
            .cloned()
    }

    fn record(&self, verb: &str, name: &str) -> Result<()> {
        let canonical = normalize_name(name);
        self.calls.lock().unwrap().push(format!("{verb}:{canonical}"));
        if self.fail_on.lock().unwrap().contains(&canonical) {
            return Err(Error::store(format!("injected failure for {canonical}")));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for FakeEntityStore {
    async fn create_property(&self, def: &PropertyDefinition) -> Result<()> {
        self.record("create-property", &def.name)?;
        self.properties
            .lock()
            .unwrap()
            .insert(normalize_name(&def.name), def.clone());
        Ok(())
    }

    async fn update_property(&self, def: &PropertyDefinition) -> Result<()> {
        self.record("update-property", &def.name)?;
        self.properties
            .lock()
            .unwrap()
            .insert(normalize_name(&def.name), def.clone());
        Ok(())
    }

    async fn delete_property(&self, name: &str) -> Result<()> {
        self.record("delete-property", name)?;
        self.properties.lock().unwrap().remove(&normalize_name(name));
        Ok(())
    }

    async fn create_class(&self, def: &ClassDefinition) -> Result<()> {
        self.record("create-class", &def.name)?;
        self.classes
            .lock()
            .unwrap()
            .insert(normalize_name(&def.name), def.clone());
        Ok(())
    }

    async fn update_class(&self, def: &ClassDefinition) -> Result<()> {
        self.record("update-class", &def.name)?;
        self.classes
            .lock()
            .unwrap()
            .insert(normalize_name(&def.name), def.clone());
        Ok(())
    }

    async fn delete_class(&self, name: &str) -> Result<()> {
        self.record("delete-class", name)?;
        self.classes.lock().unwrap().remove(&normalize_name(name));
        Ok(())
    }

    async fn list_properties(&self) -> Result<BTreeMap<String, PropertyDefinition>> {
        Ok(self.properties.lock().unwrap().clone())
    }

    async fn list_classes(&self) -> Result<BTreeMap<String, ClassDefinition>> {
        Ok(self.classes.lock().unwrap().clone())
    }
}
