//! Annotation import/export.
//!
//! Annotations are exchanged one image at a time as a JSON document (see
//! [`AnnotationDocument`]). Conversion is split in two steps: `export_image`
//! and `import_image` translate between the store and the document, and
//! [`VesselJsonFormat`] reads and writes documents.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vat::format::{VesselJsonFormat, export_image};
//!
//! let doc = export_image(image, &info);
//! VesselJsonFormat.export(&doc, Path::new("angio.png.json"))?;
//! ```

mod document;
mod error;
mod vessel_json;

#[cfg(test)]
mod tests;

pub use document::{AnnotationDocument, ParentRef, VesselEntry};
pub use error::FormatError;
pub use vessel_json::{ImportedImage, VesselJsonFormat, export_image, import_image, parse_document};
