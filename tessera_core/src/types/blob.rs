//! This module provides the [`Blob`] struct, an owned byte buffer holding one tile payload.
//!
//! ```rust
//! use tessera_core::Blob;
//!
//! let blob = Blob::from(vec![0x01; 100]);
//! assert_eq!(blob.len(), 100);
//! assert_eq!(blob.as_slice()[0], 0x01);
//! ```

use std::fmt::Debug;

/// A thin wrapper around [`Vec<u8>`] for tile payloads.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Blob(Vec<u8>);

impl Blob {
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(value: Vec<u8>) -> Self {
		Blob(value)
	}
}

impl From<&[u8]> for Blob {
	fn from(value: &[u8]) -> Self {
		Blob(value.to_vec())
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(value: &[u8; N]) -> Self {
		Blob(value.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(value: &str) -> Self {
		Blob(value.as_bytes().to_vec())
	}
}

impl AsRef<[u8]> for Blob {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		const PREVIEW: usize = 16;
		let head = &self.0[..self.0.len().min(PREVIEW)];
		let hex: Vec<String> = head.iter().map(|b| format!("{b:02x}")).collect();
		let ellipsis = if self.0.len() > PREVIEW { " …" } else { "" };
		write!(f, "Blob({} bytes: {}{})", self.0.len(), hex.join(" "), ellipsis)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conversions() {
		let blob = Blob::from(&[1u8, 2, 3]);
		assert_eq!(blob.len(), 3);
		assert!(!blob.is_empty());
		assert_eq!(blob.as_slice(), &[1, 2, 3]);
		assert_eq!(blob.clone().into_vec(), vec![1, 2, 3]);
		assert_eq!(Blob::from("AB").as_slice(), b"AB");
		assert!(Blob::new_empty().is_empty());
	}

	#[test]
	fn debug_preview() {
		assert_eq!(format!("{:?}", Blob::from(&[0xab, 0x01])), "Blob(2 bytes: ab 01)");
		let long = Blob::from(vec![0u8; 20]);
		assert!(format!("{long:?}").ends_with(" …)"));
	}
}
