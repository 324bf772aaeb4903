pub mod description;

pub use description::{
    ColumnDescription, ForeignKey, SchemaDescription, SchemaIdentifiers, TableDescription,
};
