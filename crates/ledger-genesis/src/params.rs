use serde::{Deserialize, Serialize};

/// Genesis-time overrides. Currently empty — the only genesis action is
/// provisioning the treasury account, which takes no parameters — but
/// kept as a distinct type (rather than removed) so a future deployment
/// can hand genesis a seed admin user or initial limit config without
/// changing the `apply_genesis` signature.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenesisParams {}
