pub mod caller;

pub use caller::bearer_token;
