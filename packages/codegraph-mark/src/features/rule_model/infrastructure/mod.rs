/*
 * Rule Model Infrastructure
 *
 * Loading of pre-parsed models from YAML/JSON.
 */

mod loader;

pub use loader::MarkModelLoader;
