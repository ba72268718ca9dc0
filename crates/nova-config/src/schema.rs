use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::NovaConfig;

/// JSON schema for `nova-cdi.toml`, intended for editor tooling and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(NovaConfig)
}
