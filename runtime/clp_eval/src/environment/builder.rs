//! `EnvironmentBuilder` for creating environments with various configurations.

use clp_diagnostic::{console_router, SharedRouter};

use super::Environment;
use crate::config::{EnvConfig, FatalPolicy};

/// Builder for [`Environment`].
///
/// Defaults: [`EnvConfig::default`], a console router, and the panic fatal
/// policy.
pub struct EnvironmentBuilder {
    config: EnvConfig,
    router: Option<SharedRouter>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            config: EnvConfig::default(),
            router: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: EnvConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the router all output and diagnostics go to.
    #[must_use]
    pub fn router(mut self, router: SharedRouter) -> Self {
        self.router = Some(router);
        self
    }

    #[must_use]
    pub fn fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.config.fatal_policy = policy;
        self
    }

    /// Limit call nesting; exceeding it is an evaluation error.
    #[must_use]
    pub fn max_eval_depth(mut self, depth: usize) -> Self {
        self.config.max_eval_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn object_system(mut self, enabled: bool) -> Self {
        self.config.object_system = enabled;
        self
    }

    /// Build the environment.
    pub fn build(self) -> Environment {
        let router = self.router.unwrap_or_else(console_router);
        Environment::from_parts(self.config, router)
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
