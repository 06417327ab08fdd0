use thiserror::Error;

/// Failures callers may want to tell apart. They travel inside `anyhow::Error`;
/// use `err.downcast_ref::<ContainerError>()` to recover them.
#[derive(Debug, Error)]
pub enum ContainerError {
	#[error("tile container is read-only")]
	ReadOnly,

	#[error("unsupported SRID {0}")]
	UnsupportedSrid(i32),

	#[error("tile matrix is not compatible with the container layout")]
	IncompatibleSpec,

	#[error("failed to encode tile image: {0}")]
	TileEncode(String),

	#[error("initialization metadata is only accepted before the first tile is written to a new container")]
	InitializationClosed,
}
