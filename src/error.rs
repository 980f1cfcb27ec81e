use hostbind_core::HostBindError;

pub type Result<T> = std::result::Result<T, HostBindError>;
