mod schema;
mod server;

pub use schema::*;
pub use server::*;
