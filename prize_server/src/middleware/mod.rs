mod bearer;

pub use bearer::BearerTokenFactory;
