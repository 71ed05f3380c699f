pub mod classifier;
pub mod connectivity;
pub mod credentials;
pub mod geofence;
pub mod machine;
pub mod presence;
pub mod queue;
pub mod sync;
