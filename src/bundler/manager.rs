use std::rc::Rc;

use indexmap::IndexMap;

use super::{Bundler, VenvBundler};
use crate::env::Backend;
use crate::prelude::*;

type BundlerFactory = Box<dyn Fn() -> Box<dyn Bundler>>;

/// The available bundlers, by name.
#[derive(Default)]
pub struct BundlerManager {
    factories: IndexMap<String, BundlerFactory>,
}

impl BundlerManager {
    pub fn new() -> BundlerManager {
        Default::default()
    }

    pub fn with_defaults(backend: Rc<dyn Backend>) -> Result<BundlerManager> {
        let mut manager = BundlerManager::new();
        manager.register(VenvBundler::NAME, move || -> Box<dyn Bundler> {
            Box::new(VenvBundler::new(backend.clone()))
        })?;
        Ok(manager)
    }

    pub fn bundler(&self, name: &str) -> Result<Box<dyn Bundler>> {
        match self.factories.get(&name.to_lowercase()) {
            Some(factory) => Ok(factory()),
            None => Err(BundleError::UnknownBundler {
                name: name.to_owned(),
            })?,
        }
    }

    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<&mut Self>
    where
        F: Fn() -> Box<dyn Bundler> + 'static,
    {
        if name.is_empty() {
            Err(BundleError::UnnamedBundler)?;
        }
        let name = name.to_lowercase();
        if self.factories.contains_key(&name) {
            return Err(BundleError::DuplicateBundler { name }.into());
        }
        trace!("registered bundler {name}");
        self.factories.insert(name, Box::new(factory));
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bundler::{BundleOptions, Reporter};
    use crate::project::Project;
    use crate::test_util::MockBackend;

    struct MockBundler;

    impl Bundler for MockBundler {
        fn name(&self) -> &str {
            "mock"
        }

        fn configure(&mut self, _: &BundleOptions) -> Result<()> {
            Ok(())
        }

        fn bundle(&self, _: &Project, _: &dyn Reporter) -> Result<bool> {
            Ok(true)
        }
    }

    fn manager() -> BundlerManager {
        BundlerManager::with_defaults(Rc::new(MockBackend::default())).unwrap()
    }

    #[test]
    fn test_manager_has_venv_bundler() {
        let manager = manager();
        assert_eq!(manager.bundler("venv").unwrap().name(), "venv");
        assert_eq!(manager.bundler("VENV").unwrap().name(), "venv");
        assert_eq!(manager.factories.len(), 1);
    }

    #[test]
    fn test_unknown_bundler() {
        let err = manager().bundler("foo").err().unwrap();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::UnknownBundler { .. })
        ));
        assert_eq!(err.to_string(), r#"The bundler class "foo" does not exist."#);
    }

    #[test]
    fn test_register() {
        let mut manager = manager();
        manager
            .register("mock", || Box::new(MockBundler))
            .unwrap();
        assert_eq!(manager.bundler("mock").unwrap().name(), "mock");
        assert_eq!(manager.bundler("Mock").unwrap().name(), "mock");
        let names: Vec<&str> = manager.factories.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, ["venv", "mock"]);
    }

    #[test]
    fn test_register_invalid_names() {
        let mut manager = manager();
        let err = manager
            .register("", || Box::new(MockBundler))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "A bundler class must have a name");

        let err = manager
            .register("Venv", || Box::new(MockBundler))
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            r#"A bundler class with the name "venv" already exists."#
        );
    }
}
