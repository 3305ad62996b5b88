//! Error types for canonical model construction and validation.

use crate::part_class::PartCategory;

/// A structural invariant of the canonical model does not hold.
///
/// Fatal to the single construction or mapping call that raised it. Every
/// variant names the offending record or field so the caller can locate it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    /// A required field is absent or empty.
    #[error("{record}: missing required field `{field}`")]
    MissingField { record: String, field: String },

    /// Two part-class instances share an identifier within one passport.
    #[error("duplicate part identifier: {identifier}")]
    DuplicateIdentifier { identifier: String },

    /// The structure hierarchy contains a cycle through `node`.
    #[error("hierarchy cycle detected at node {node}")]
    HierarchyCycle { node: String },

    /// A non-root hierarchy node is listed under more than one parent.
    #[error("hierarchy node {node} has multiple parents: {}", parents.join(", "))]
    MultipleParents { node: String, parents: Vec<String> },

    /// An attempt to change the category of an existing part-class instance.
    #[error("part {identifier}: category is fixed at {from}, cannot become {to}")]
    CategoryChange {
        identifier: String,
        from: PartCategory,
        to: PartCategory,
    },

    /// Attribute values do not fit the category's declared attribute record.
    #[error("invalid {category} attributes: {detail}")]
    InvalidAttributes {
        category: PartCategory,
        detail: String,
    },
}

/// A category label that names none of the part classes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown part category: {0}")]
pub struct UnknownCategory(pub String);
