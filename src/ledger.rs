use crate::registry::Registry;
use crate::settings::LedgerConfig;

/// Entry point for every period operation. Holds no state of its own; the
/// config and registry are owned by the caller.
///
/// Access to a single period is not synchronized. Callers must not run a
/// write and a verify (or two writes) against the same date at the same time.
#[derive(Clone, Copy)]
pub struct Ledger<'a> {
    config: &'a LedgerConfig,
    registry: &'a Registry,
}

impl<'a> Ledger<'a> {
    pub fn new(config: &'a LedgerConfig, registry: &'a Registry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &'a LedgerConfig {
        self.config
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }
}
