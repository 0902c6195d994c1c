//! # ArchiCAD IPC RS
//!
//! **Async-first Rust client for the ArchiCAD JSON API, with an editable
//! element property table that writes back with the right value types.**
//!
//! Reading properties through the connector yields deeply nested, typed value
//! objects (single enums wrap an enum id, multi enums wrap a list of wrapped
//! ids). This crate flattens them into plain cells for editing and keeps one
//! captured value tree per column, so edited cells are rebuilt into objects the
//! connector accepts.
//!
//! ## Quickstart (async)
//!
//! ```no_run
//! use archicad_ipc::ArchicadClient;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), archicad_ipc::ArchicadError> {
//!     let client = ArchicadClient::connect().await?;
//!     let info = client.get_product_info().await?;
//!     println!("{info}");
//!
//!     let walls = client.get_elements_by_type("Wall").await?;
//!     let columns = client.find_properties_by_group(&["WORKFLOW"], true).await?;
//!     let mut table = client.get_element_property_table(&walls, columns).await?;
//!     table.fill_column("WORKFLOW>>>Status", "Proposed")?;
//!
//!     let summary = client.set_property_table(&table).await?;
//!     println!("{} of {} values written", summary.succeeded(), summary.total());
//!     Ok(())
//! }
//! ```
//!
//! ## Quickstart (blocking)
//!
//! ```no_run
//! # #[cfg(feature = "blocking")]
//! # fn run() -> Result<(), archicad_ipc::ArchicadError> {
//! use archicad_ipc::ArchicadClientBlocking;
//! let client = ArchicadClientBlocking::connect()?;
//! println!("{}", client.get_product_info()?);
//! # Ok(())
//! # }
//! ```
//!
//! Architecture layers:
//! - transport
//! - envelope
//! - wire model and value trees
//! - property table
//! - high-level client

#![warn(missing_docs)]

#[cfg(feature = "async")]
/// High-level async client and request/response convenience methods.
pub mod client;
#[cfg(feature = "async")]
/// Envelope helpers for command/response framing.
///
/// This is primarily an internal surface.
pub(crate) mod envelope;
/// Error types returned by this crate.
pub mod error;
/// Starting the desktop application from the command line.
pub mod launcher;
/// Stable data models used by typed client APIs.
pub mod model;
/// Element-by-property table with per-column type templates.
pub mod table;
#[cfg(feature = "async")]
/// HTTP transport implementation details.
pub(crate) mod transport;
/// Flattening and rebuilding of property value trees.
pub mod value;

#[cfg(feature = "blocking")]
/// Blocking wrapper over the async client.
pub mod blocking;

#[cfg(feature = "blocking")]
pub use crate::blocking::{ArchicadClientBlocking, ArchicadClientBlockingBuilder};
#[cfg(feature = "async")]
pub use crate::client::{ArchicadClient, ClientBuilder};
pub use crate::error::ArchicadError;
pub use crate::launcher::{
    find_pid_command, kill_archicad, kill_command, launch_command, start_archicad, LaunchCommand,
    LaunchedApplication,
};
pub use crate::model::column::{
    PropertyColumn, BUILTIN_GROUP_NAME, GROUP_PROPERTY_SEPARATOR, PROPERTY_BRANCH_DELIMITER,
};
pub use crate::model::common::{
    join_elements, parse_classification_date, ClassificationItem, ClassificationItemId,
    ClassificationSystem, ClassificationSystemId, ElementFilter, ElementId, ElementPropertyValue,
    ExecutionResult, JoinMode, ProductInfo, PropertyId, PropertyUserId, PropertyValueOrError,
    TransactionSummary,
};
pub use crate::model::wire::{WireKind, WireValue};
pub use crate::table::{summarize_execution_results, ElementRow, PropertyTable, RowView};
pub use crate::value::{decode, Decoded, FlatValue, PropertyValue, Scalar, Slot, WireArgs};
