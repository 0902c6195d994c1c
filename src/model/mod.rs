/// Property column identity and its `group>>>property` text codec.
pub mod column;
/// Identifiers, classification trees, element joins and submission results.
pub mod common;
/// JSON property value objects as the connector sends and accepts them.
pub mod wire;
