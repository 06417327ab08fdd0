//! `ContainerRegistry` picks a [`TileContainerProvider`] for a path.
//!
//! Providers are kept in registration order. Opening tries the provider whose extension
//! matches the file first and then falls back to every other provider, so files with an
//! unexpected extension can still be opened. The default registry knows MBTiles.

use crate::{MBTilesProvider, TileContainer, TileContainerProvider};
use anyhow::{Result, anyhow};
use std::{path::Path, sync::Arc};
use tessera_core::TileMatrix;
use tessera_derive::context;

#[derive(Clone)]
pub struct ContainerRegistry {
	providers: Vec<Arc<dyn TileContainerProvider>>,
}

impl ContainerRegistry {
	pub fn new_empty() -> Self {
		Self { providers: Vec::new() }
	}

	/// Append a provider. Earlier providers win when several claim the same extension.
	pub fn register(&mut self, provider: impl TileContainerProvider + 'static) {
		self.providers.push(Arc::new(provider));
	}

	pub fn providers(&self) -> impl Iterator<Item = &dyn TileContainerProvider> {
		self.providers.iter().map(|p| p.as_ref())
	}

	/// The first provider registered for the extension of `path`.
	pub fn provider_for(&self, path: &Path) -> Option<&dyn TileContainerProvider> {
		let extension = sanitize_extension(path.extension()?.to_str()?);
		self
			.providers()
			.find(|p| sanitize_extension(p.default_extension()) == extension)
	}

	/// Open `path` with the provider matching its extension, then with every other provider.
	pub fn open(&self, path: &Path, spec: Option<&dyn TileMatrix>, read_only: bool) -> Option<Box<dyn TileContainer>> {
		let preferred = self.provider_for(path);
		let others = self
			.providers()
			.filter(|p| !preferred.is_some_and(|q| std::ptr::addr_eq(*p, q)));
		preferred.into_iter().chain(others).find_map(|provider| {
			log::debug!("trying {} for {path:?}", provider.name());
			provider.open(path, spec, read_only)
		})
	}

	/// Create a container with the provider matching the extension of `path`, or else with
	/// the first provider that accepts `spec`.
	#[context("creating tile container at '{}'", path.display())]
	pub fn create(&self, name: Option<&str>, path: &Path, spec: Option<&dyn TileMatrix>) -> Result<Box<dyn TileContainer>> {
		let provider = self
			.provider_for(path)
			.or_else(|| self.providers().find(|p| p.is_compatible(spec)))
			.ok_or_else(|| anyhow!("no provider can create '{}'", path.display()))?;
		provider.create(name, path, spec)
	}
}

impl Default for ContainerRegistry {
	fn default() -> Self {
		let mut registry = Self::new_empty();
		registry.register(MBTilesProvider::default());
		registry
	}
}

fn sanitize_extension(ext: &str) -> String {
	ext.to_ascii_lowercase().trim_matches('.').to_string()
}
