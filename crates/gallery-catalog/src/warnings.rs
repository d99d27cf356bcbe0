//! Scan diagnostics
//!
//! A warning means one type, member or declaration was left out of the
//! snapshot. Warnings never abort a scan.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    #[error("'{subject}' carries {count} {attribute} attributes; ignoring it")]
    DuplicateAttribute {
        subject: String,
        attribute: &'static str,
        count: usize,
    },

    #[error("'{subject}' has a malformed attribute: {reason}")]
    MalformedAttribute { subject: String, reason: String },

    #[error("Component '{0}' is declared more than once; keeping the first declaration")]
    DuplicateComponent(String),

    #[error("Cannot resolve the component for preview '{preview}': {reason}")]
    UnresolvedPreviewOwner { preview: String, reason: String },

    #[error(
        "Preview '{preview}' declares {count} parameter(s); \
         parameterized previews are not supported"
    )]
    ParameterizedPreview { preview: String, count: usize },

    #[error("Preview '{0}' has no parameterless factory")]
    MissingFactory(String),

    #[error("Preview '{preview}' is already registered on component '{component}'")]
    DuplicatePreview { component: String, preview: String },

    #[error("Base type chain of '{0}' is cyclic")]
    BaseTypeCycle(String),

    #[error(
        "Component '{component}' already belongs to category '{existing}'; \
         ignoring '{category}'"
    )]
    DuplicateCategoryMember {
        component: String,
        category: String,
        existing: String,
    },

    #[error("Category '{category}' names unknown component '{component}'")]
    UnknownCategoryMember { category: String, component: String },
}

impl ScanWarning {
    /// The type, member or component the warning is about
    pub fn subject(&self) -> &str {
        match self {
            Self::DuplicateAttribute { subject, .. } | Self::MalformedAttribute { subject, .. } => {
                subject
            }
            Self::DuplicateComponent(name)
            | Self::BaseTypeCycle(name)
            | Self::MissingFactory(name) => name,
            Self::UnresolvedPreviewOwner { preview, .. }
            | Self::ParameterizedPreview { preview, .. }
            | Self::DuplicatePreview { preview, .. } => preview,
            Self::DuplicateCategoryMember { component, .. }
            | Self::UnknownCategoryMember { component, .. } => component,
        }
    }
}
