//! # Armature Loader
//!
//! Loads XML service container documents into a [`ContainerBuilder`]. A
//! document declares parameters, imports of other documents, extension
//! configuration and services; loading resolves every declaration into a
//! flat, uniquely keyed registry of blueprints.
//!
//! ## Usage
//!
//! ```
//! # use armature_loader::{ContainerBuilder, FileLocator, XmlFileLoader, error::LoadError};
//!
//! fn main() -> Result<(), LoadError> {
//!     let source = r#"
//!         <container xmlns="http://armature.dev/schema/dic/services">
//!             <services>
//!                 <service id="mailer" class="App\Mailer">
//!                     <argument type="service" id="transport"/>
//!                 </service>
//!                 <service id="transport" class="App\SmtpTransport"/>
//!             </services>
//!         </container>
//!     "#;
//!
//!     let loader = XmlFileLoader::new(FileLocator::default());
//!     let mut container = ContainerBuilder::new();
//!     loader.load_source(source, "config/services.xml", &mut container)?;
//!
//!     assert_eq!(container.registry().len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! A load runs these phases per document:
//!
//! 1. **Validate** - Check the document against the assembled schemas
//! 2. **Defaults** - Read the container-wide `<defaults>`
//! 3. **Anonymous** - Name and register inline services, deepest first
//! 4. **Imports** - Load imported documents recursively
//! 5. **Parameters** - Merge `<parameters>` into the parameter bag
//! 6. **Extensions** - Hand foreign-namespace elements to their extension
//! 7. **Services** - Resolve every named service

pub mod error;

mod anonymous;
mod arguments;
mod container;
mod defaults;
mod definition;
mod document;
mod extension;
mod loader;
mod locator;
mod schema;
mod span;

pub use container::ContainerBuilder;
pub use document::{
    Attribute, Document, Element, Node, NodeId, SERVICES_NAMESPACE, XSI_NAMESPACE,
};
pub use extension::{DeclaredExtension, Extension, SchemaSource, convert_element};
pub use loader::{DEFAULT_MAX_NESTING_DEPTH, LoadReport, Loader, LoaderOptions, XmlFileLoader};
pub use locator::{FileLocator, ResourceLocator};
pub use schema::{SchemaLocation, SchemaValidator, StructuralValidator};
pub use span::Span;
