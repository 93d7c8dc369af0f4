#[cfg(feature = "backend-mock")]
pub mod mock;

#[cfg(all(feature = "backend-v4l", target_os = "linux"))]
pub mod v4l;
