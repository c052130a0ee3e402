//! Feature reconstruction: input record → fixed-width vector in training
//! column order.

pub mod encoder;
pub mod schema;

pub use encoder::{encode, EncodedFeatures, InputRecord, UnknownCategory};
pub use schema::{CategoricalField, CategoryTable, FeatureSchema, NUMERIC_FIELDS};
