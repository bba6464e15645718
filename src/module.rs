use std::any::type_name;
use tracing::{debug, error, info_span, warn};

use crate::{errors::ModuleErrorKind, Container};

/// Unit of application wiring.
///
/// A module is initialized first, then it registers its services. Modules whose
/// initialization fails don't register anything.
pub trait Module: Send + Sync {
    /// Registers the services and components of the module.
    fn register(&self, container: &Container);

    /// # Errors
    /// Any error makes [`Container::init_modules`] skip the module.
    fn on_init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// # Errors
    /// Errors are logged by [`Container::shutdown_modules`] and don't stop the shutdown.
    fn on_destroy(&self) -> anyhow::Result<()> {
        Ok(())
    }

    #[must_use]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl Container {
    /// Initializes and registers `modules` in order, then wires every pending component.
    ///
    /// # Errors
    /// - [`ModuleErrorKind::Init`] if any module failed to initialize. Pending components aren't wired then.
    /// - [`ModuleErrorKind::Autowire`] if a pending component can't be wired.
    pub fn init_modules(&self, modules: &[&dyn Module]) -> Result<(), ModuleErrorKind> {
        let span = info_span!("init_modules", count = modules.len());
        let _guard = span.enter();

        let mut failed = 0;
        for module in modules {
            if let Err(err) = module.on_init() {
                error!(module = module.name(), "Failed to initialize module: {:#}", err);
                failed += 1;
                continue;
            }
            module.register(self);
            debug!(module = module.name(), "Module registered");
        }

        if failed > 0 {
            let err = ModuleErrorKind::Init { failed };
            error!("{}", err);
            return Err(err);
        }

        self.autowire_all()?;
        Ok(())
    }

    /// Calls the destroy hook of every module in declaration order.
    pub fn shutdown_modules(&self, modules: &[&dyn Module]) {
        let span = info_span!("shutdown_modules", count = modules.len());
        let _guard = span.enter();

        for module in modules {
            match module.on_destroy() {
                Ok(()) => debug!(module = module.name(), "Module destroyed"),
                Err(err) => warn!(module = module.name(), "Failed to destroy module: {:#}", err),
            }
        }
    }
}
