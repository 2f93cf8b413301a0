// Sheet API: the delimited box format and the layout/render endpoints built on it.

pub mod handlers;
pub mod parser;
