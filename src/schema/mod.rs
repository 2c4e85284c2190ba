//! Schema introspection: catalog reads and the text block the model sees.

pub mod catalog;
pub mod description;
pub mod introspector;

pub use description::{
    ColumnDescription, ForeignKeyDescription, IndexDescription, Probe, SchemaDescription,
    TableDescription,
};
pub use introspector::{introspect, SchemaIntrospector};
