//! Annotation keys and typed accessors for Ingress metadata

pub mod keys;
mod parser;

pub use parser::AnnotationParser;
